//! Route definitions for the `/roles` resource.

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::roles;
use crate::state::AppState;

/// Routes mounted at `/roles`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/getAll", get(roles::get_all_roles))
        .route("/getById/{id}", get(roles::get_role_by_id))
        .route("/getStatistics", get(roles::get_role_statistics))
        .route("/create", post(roles::create_role))
        .route("/update/{id}", put(roles::update_role))
        .route("/delete/{id}", delete(roles::delete_role))
}
