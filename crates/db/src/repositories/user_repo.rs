//! Repository for the `users` table.

use sqlx::{PgConnection, PgPool};
use taskapi_core::types::{DbId, Timestamp};

use crate::models::user::{NewUser, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, email, password_hash, role_id, is_active, \
                        created_at, updated_at, last_token_issue_at";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// List users ordered by ID, optionally only the active ones.
    pub async fn list(pool: &PgPool, active_only: bool) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users WHERE ($1 = FALSE OR is_active) ORDER BY id ASC"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(active_only)
            .fetch_all(pool)
            .await
    }

    /// Find a user by internal ID, active or not.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by email (case-sensitive).
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1 ORDER BY id LIMIT 1");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by email ignoring case, optionally skipping one user.
    pub async fn find_by_normalized_email(
        pool: &PgPool,
        email: &str,
        exclude_id: Option<DbId>,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users
             WHERE LOWER(email) = LOWER($1) AND ($2::BIGINT IS NULL OR id <> $2)
             ORDER BY id LIMIT 1"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .bind(exclude_id)
            .fetch_optional(pool)
            .await
    }

    /// Whether a user with exactly this email exists.
    pub async fn exists_by_email(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(pool)
                .await?;
        Ok(exists)
    }

    /// Whether a user with this email (ignoring case) exists, optionally
    /// skipping one user.
    pub async fn exists_by_normalized_email(
        pool: &PgPool,
        email: &str,
        exclude_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (
                SELECT 1 FROM users
                WHERE LOWER(email) = LOWER($1) AND ($2::BIGINT IS NULL OR id <> $2)
             )",
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }

    /// Insert a new user, returning the created row.
    pub async fn insert(conn: &mut PgConnection, input: &NewUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, password_hash, role_id, created_at, updated_at, last_token_issue_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(input.role_id)
            .bind(input.created_at)
            .bind(input.updated_at)
            .bind(input.last_token_issue_at)
            .fetch_one(conn)
            .await
    }

    /// Write every mutable column of `user` back to its row.
    ///
    /// Uses `RETURNING` to confirm the write, which a table trigger may
    /// reject. Returns `false` if no row with `user.id` exists.
    pub async fn update(conn: &mut PgConnection, user: &User) -> Result<bool, sqlx::Error> {
        let updated: Option<(DbId,)> = sqlx::query_as(
            "UPDATE users SET
                email = $2,
                password_hash = $3,
                role_id = $4,
                is_active = $5,
                updated_at = $6,
                last_token_issue_at = $7
             WHERE id = $1
             RETURNING id",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role_id)
        .bind(user.is_active)
        .bind(user.updated_at)
        .bind(user.last_token_issue_at)
        .fetch_optional(conn)
        .await?;
        Ok(updated.is_some())
    }

    /// Set only `last_token_issue_at`, without `RETURNING`.
    ///
    /// Returns the number of rows affected.
    pub async fn set_token_issued_at(
        pool: &PgPool,
        sql: &str,
        id: DbId,
        issued_at: Option<Timestamp>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(sql)
            .bind(issued_at)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
