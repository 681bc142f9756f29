//! Handlers for the `/users` resource.
//!
//! Responses carry [`UserResponse`], never the password hash.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use taskapi_core::error::CoreError;
use taskapi_core::types::DbId;
use taskapi_core::users::normalize_email;
use taskapi_db::models::user::{User, UserResponse};
use validator::{Validate, ValidateEmail, ValidationError};

use super::{created, Created};
use crate::auth::password::validate_password_strength;
use crate::error::{AppError, AppResult};
use crate::extract::{ApiPath, ApiQuery, EntityId, ValidatedJson};
use crate::response::ApiResponse;
use crate::services::{CreateUserInput, ServiceError};
use crate::state::AppState;

/// Request body for `POST /users/create`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(default)]
    #[validate(custom(function = "email_format"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    #[validate(range(min = 1, message = "Role id must be greater than 0"))]
    pub role_id: Option<DbId>,
}

/// Surrounding whitespace is dropped during normalization, so it is allowed here.
fn email_format(email: &str) -> Result<(), ValidationError> {
    let trimmed = email.trim();
    let message = if trimmed.is_empty() {
        "Email is required"
    } else if !trimmed.validate_email() {
        "Email must be a valid address"
    } else {
        return Ok(());
    };
    let mut error = ValidationError::new("email");
    error.message = Some(message.into());
    Err(error)
}

/// Query for `GET /users/getByEmail`.
#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

/// GET /api/users/getAll
///
/// Active users only.
pub async fn get_all_users(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<UserResponse>>>> {
    let users = state.users.list_users().await?;
    let data: Vec<UserResponse> = users.iter().map(UserResponse::from).collect();
    let message = format!("Retrieved {} users", data.len());
    Ok(Json(ApiResponse::ok(data, message)))
}

/// GET /api/users/getById/{id}
pub async fn get_user_by_id(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let user = find_active_user(&state, id).await?;
    Ok(Json(ApiResponse::ok(UserResponse::from(&user), "User retrieved")))
}

/// GET /api/users/getByEmail?email=
pub async fn get_user_by_email(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<EmailQuery>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let email = query
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| CoreError::validation("Email is required"))?;

    let user = state
        .users
        .get_user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound {
            entity: "User",
            detail: format!("No user exists with email {email}"),
        })?;
    Ok(Json(ApiResponse::ok(UserResponse::from(&user), "User retrieved")))
}

/// POST /api/users/create
///
/// Checks the password length and email availability, then registers the
/// user. Returns 201 with a `Location` header.
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateUserRequest>,
) -> AppResult<Created<UserResponse>> {
    validate_password_strength(&input.password, state.config.min_password_length)
        .map_err(CoreError::validation)?;

    if state.users.email_exists(&input.email, None).await? {
        return Err(ServiceError::DuplicateEmail(normalize_email(&input.email)).into());
    }

    let user = state
        .users
        .create_user(CreateUserInput {
            email: input.email,
            password: input.password,
            role_id: input.role_id,
        })
        .await?;

    Ok(created(
        format!("/api/users/getById/{}", user.id),
        UserResponse::from(&user),
        "User created",
    ))
}

/// POST /api/users/logout/{id}
///
/// Stamps the user's token-issuance time with now, which invalidates
/// tokens issued earlier.
pub async fn logout(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> AppResult<Json<ApiResponse<bool>>> {
    let user = find_active_user(&state, id).await?;
    let stamped = User {
        last_token_issue_at: Some(Utc::now()),
        ..user
    };

    let updated = state.users.update_token_timestamp(&stamped).await?;
    tracing::info!(user_id = id, updated, "User logged out");
    Ok(Json(ApiResponse::ok(updated, "User logged out")))
}

/// PUT /api/users/update/{id}
///
/// Answers 501 for any integer id.
pub async fn update_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<DbId>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let user = state.users.update_user(id).await?;
    Ok(Json(ApiResponse::ok(UserResponse::from(&user), "User updated")))
}

/// DELETE /api/users/delete/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<DbId>,
) -> AppResult<Json<ApiResponse<bool>>> {
    state.users.delete_user(id).await?;
    Ok(Json(ApiResponse::ok(true, "User deleted")))
}

async fn find_active_user(state: &AppState, id: DbId) -> AppResult<User> {
    state
        .users
        .get_user(id)
        .await?
        .ok_or_else(|| CoreError::NotFound { entity: "User", id }.into())
}
