//! Handlers for the `/roles` resource.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use taskapi_core::error::CoreError;
use taskapi_core::roles::{normalize_role_name, validate_role_name};
use taskapi_core::statistics::RoleStatistics;
use taskapi_core::types::DbId;
use taskapi_db::models::role::RoleResponse;
use validator::{Validate, ValidationError, ValidationErrors};

use super::{created, Created};
use crate::error::AppResult;
use crate::extract::{ApiPath, EntityId, ValidatedJson};
use crate::response::ApiResponse;
use crate::state::AppState;

/// Request body for `POST /roles/create`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoleRequest {
    #[serde(default)]
    pub role_name: String,
}

/// Reports every rule the name breaks, not just the first.
impl Validate for CreateRoleRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for message in validate_role_name(&normalize_role_name(&self.role_name)) {
            errors.add(
                "role_name",
                ValidationError::new("role_name").with_message(message.into()),
            );
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// GET /api/roles/getAll
pub async fn get_all_roles(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<RoleResponse>>>> {
    let roles = state.roles.list_roles().await?;
    let data: Vec<RoleResponse> = roles.iter().map(RoleResponse::from).collect();
    let message = format!("Retrieved {} roles", data.len());
    Ok(Json(ApiResponse::ok(data, message)))
}

/// GET /api/roles/getById/{id}
pub async fn get_role_by_id(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> AppResult<Json<ApiResponse<RoleResponse>>> {
    let role = state
        .roles
        .get_role(id)
        .await?
        .ok_or(CoreError::NotFound { entity: "Role", id })?;

    let message = format!("Role '{}' retrieved", role.name);
    Ok(Json(ApiResponse::ok(RoleResponse::from(&role), message)))
}

/// GET /api/roles/getStatistics
pub async fn get_role_statistics(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<RoleStatistics>>> {
    let stats = state.roles.statistics().await?;
    Ok(Json(ApiResponse::ok(stats, "Role statistics retrieved")))
}

/// POST /api/roles/create
///
/// Returns 201 with a `Location` header pointing at the new role.
pub async fn create_role(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateRoleRequest>,
) -> AppResult<Created<RoleResponse>> {
    let role = state.roles.create_role(&input.role_name).await?;
    Ok(created(
        format!("/api/roles/getById/{}", role.id),
        RoleResponse::from(&role),
        "Role created",
    ))
}

/// PUT /api/roles/update/{id}
///
/// Answers 501 for any integer id.
pub async fn update_role(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<DbId>,
) -> AppResult<Json<ApiResponse<RoleResponse>>> {
    let role = state.roles.update_role(id).await?;
    Ok(Json(ApiResponse::ok(RoleResponse::from(&role), "Role updated")))
}

/// DELETE /api/roles/delete/{id}
pub async fn delete_role(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<DbId>,
) -> AppResult<Json<ApiResponse<bool>>> {
    state.roles.delete_role(id).await?;
    Ok(Json(ApiResponse::ok(true, "Role deleted")))
}
