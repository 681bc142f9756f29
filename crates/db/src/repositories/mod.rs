//! SQL repositories, one per table.
//!
//! Read operations take the pool; writes take a connection so the store can
//! run them inside a transaction.

pub mod role_repo;
pub mod user_repo;

pub use role_repo::RoleRepo;
pub use user_repo::UserRepo;
