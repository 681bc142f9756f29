//! Entity models and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - A `New*` struct carrying the values of an insert
//! - A `Serialize` response struct for API output

pub mod role;
pub mod user;
