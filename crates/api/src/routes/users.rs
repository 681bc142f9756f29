//! Route definitions for the `/users` resource.

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// Routes mounted at `/users`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/getAll", get(users::get_all_users))
        .route("/getById/{id}", get(users::get_user_by_id))
        .route("/getByEmail", get(users::get_user_by_email))
        .route("/create", post(users::create_user))
        .route("/logout/{id}", post(users::logout))
        .route("/update/{id}", put(users::update_user))
        .route("/delete/{id}", delete(users::delete_user))
}
