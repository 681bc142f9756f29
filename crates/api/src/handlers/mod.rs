//! HTTP request handlers.
//!
//! Each submodule corresponds to a resource and contains async handler
//! functions that extract request data, call into the service layer, and
//! return the [`ApiResponse`](crate::response::ApiResponse) envelope or an
//! [`AppError`](crate::error::AppError).

pub mod roles;
pub mod users;

use axum::http::header::LOCATION;
use axum::http::{HeaderName, StatusCode};
use axum::Json;
use serde::Serialize;

use crate::response::ApiResponse;

/// `201 Created` with a `Location` header and the envelope.
pub type Created<T> = (StatusCode, [(HeaderName, String); 1], Json<ApiResponse<T>>);

pub(crate) fn created<T: Serialize>(location: String, data: T, message: &str) -> Created<T> {
    (
        StatusCode::CREATED,
        [(LOCATION, location)],
        Json(ApiResponse::ok(data, message)),
    )
}
