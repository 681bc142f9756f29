pub mod health;
pub mod roles;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /roles/getAll                  list roles
/// /roles/getById/{id}            get role
/// /roles/getStatistics           role statistics
/// /roles/create                  create role (POST)
/// /roles/update/{id}             not implemented (PUT)
/// /roles/delete/{id}             not implemented (DELETE)
///
/// /users/getAll                  list active users
/// /users/getById/{id}            get active user
/// /users/getByEmail?email=       exact email lookup
/// /users/create                  register user (POST)
/// /users/logout/{id}             stamp token issuance (POST)
/// /users/update/{id}             not implemented (PUT)
/// /users/delete/{id}             not implemented (DELETE)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/roles", roles::router())
        .nest("/users", users::router())
}
