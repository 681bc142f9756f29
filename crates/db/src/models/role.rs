//! Role entity model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use taskapi_core::statistics::RoleTally;
use taskapi_core::types::{DbId, Timestamp};

/// A role row from the `roles` table, with its derived user count.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Role {
    pub id: DbId,
    pub name: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// Number of active users assigned to this role.
    pub user_count: i64,
}

/// Values for inserting a role. The name must already be normalized.
#[derive(Debug, Clone)]
pub struct NewRole {
    pub name: String,
}

/// Role representation for API responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
    pub role_id: DbId,
    pub role_name: String,
    pub is_active: bool,
    pub user_count: i64,
    pub created_at: Timestamp,
}

impl From<&Role> for RoleResponse {
    fn from(role: &Role) -> Self {
        Self {
            role_id: role.id,
            role_name: role.name.clone(),
            is_active: role.is_active,
            user_count: role.user_count,
            created_at: role.created_at,
        }
    }
}

impl From<&Role> for RoleTally {
    fn from(role: &Role) -> Self {
        Self {
            name: role.name.clone(),
            user_count: role.user_count,
            is_active: role.is_active,
        }
    }
}
