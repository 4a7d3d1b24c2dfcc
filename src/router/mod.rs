//! Route table and the navigation guard that enforces it.

pub mod guard;
pub mod routes;
