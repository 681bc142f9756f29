//! Repository for the `roles` table.

use sqlx::{PgConnection, PgPool};
use taskapi_core::types::DbId;

use crate::models::role::{NewRole, Role};

/// Role columns joined with the count of active users holding the role.
const SELECT_WITH_COUNT: &str = "SELECT r.id, r.name, r.is_active, r.created_at, r.updated_at, \
                                        COUNT(u.id) AS user_count
                                 FROM roles r
                                 LEFT JOIN users u ON u.role_id = r.id AND u.is_active";

/// Provides read and insert operations for roles.
pub struct RoleRepo;

impl RoleRepo {
    /// List all roles ordered by ID ascending.
    pub async fn list(pool: &PgPool) -> Result<Vec<Role>, sqlx::Error> {
        let query = format!("{SELECT_WITH_COUNT} GROUP BY r.id ORDER BY r.id ASC");
        sqlx::query_as::<_, Role>(&query).fetch_all(pool).await
    }

    /// Find a role by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Role>, sqlx::Error> {
        let query = format!("{SELECT_WITH_COUNT} WHERE r.id = $1 GROUP BY r.id");
        sqlx::query_as::<_, Role>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a role by name (case-sensitive).
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Role>, sqlx::Error> {
        let query = format!("{SELECT_WITH_COUNT} WHERE r.name = $1 GROUP BY r.id");
        sqlx::query_as::<_, Role>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Whether a role with this exact name exists.
    pub async fn exists_by_name(pool: &PgPool, name: &str) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM roles WHERE name = $1)")
            .bind(name)
            .fetch_one(pool)
            .await?;
        Ok(exists)
    }

    /// Insert a new role, returning the created row. A new role has no users.
    pub async fn insert(conn: &mut PgConnection, input: &NewRole) -> Result<Role, sqlx::Error> {
        sqlx::query_as::<_, Role>(
            "INSERT INTO roles (name)
             VALUES ($1)
             RETURNING id, name, is_active, created_at, updated_at, 0::BIGINT AS user_count",
        )
        .bind(&input.name)
        .fetch_one(conn)
        .await
    }
}
