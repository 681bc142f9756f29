//! Business logic between the HTTP handlers and the persistence gateway.
//!
//! Services own no state besides the injected [`Store`](taskapi_db::store::Store);
//! they are cheap to clone and shared through [`AppState`](crate::state::AppState).

pub mod error;
pub mod role_service;
pub mod user_service;

pub use error::{ServiceError, ServiceResult};
pub use role_service::RoleService;
pub use user_service::{CreateUserInput, UserService};
