//! Session state: the authenticated principal and its permission set.

pub mod permissions;
pub mod session;
