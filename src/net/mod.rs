//! Backend networking: wire types, the HTTP client, and error normalization.

pub mod api;
pub mod error;
pub mod health;
pub mod types;
