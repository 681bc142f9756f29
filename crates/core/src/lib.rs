//! Domain types and rules shared by the store and the HTTP layer.

pub mod error;
pub mod roles;
pub mod statistics;
pub mod types;
pub mod users;
