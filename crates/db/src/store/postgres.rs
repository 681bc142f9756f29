//! [`Store`] backed by PostgreSQL through the sqlx repositories.

use async_trait::async_trait;
use taskapi_core::types::DbId;

use super::{
    Changeset, CommitOutcome, PendingWrite, RawStatement, RoleFilter, Store, StoreResult,
    UserFilter,
};
use crate::models::role::Role;
use crate::models::user::User;
use crate::repositories::{RoleRepo, UserRepo};
use crate::DbPool;

/// PostgreSQL store. Cheap to clone; the pool is reference-counted.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn list_roles(&self) -> StoreResult<Vec<Role>> {
        Ok(RoleRepo::list(&self.pool).await?)
    }

    async fn role_by_id(&self, id: DbId) -> StoreResult<Option<Role>> {
        Ok(RoleRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_role(&self, filter: RoleFilter<'_>) -> StoreResult<Option<Role>> {
        match filter {
            RoleFilter::Name(name) => Ok(RoleRepo::find_by_name(&self.pool, name).await?),
        }
    }

    async fn role_exists(&self, filter: RoleFilter<'_>) -> StoreResult<bool> {
        match filter {
            RoleFilter::Name(name) => Ok(RoleRepo::exists_by_name(&self.pool, name).await?),
        }
    }

    async fn list_users(&self, active_only: bool) -> StoreResult<Vec<User>> {
        Ok(UserRepo::list(&self.pool, active_only).await?)
    }

    async fn user_by_id(&self, id: DbId) -> StoreResult<Option<User>> {
        Ok(UserRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_user(&self, filter: UserFilter<'_>) -> StoreResult<Option<User>> {
        let user = match filter {
            UserFilter::Email(email) => UserRepo::find_by_email(&self.pool, email).await?,
            UserFilter::NormalizedEmail { email, exclude_id } => {
                UserRepo::find_by_normalized_email(&self.pool, email, exclude_id).await?
            }
        };
        Ok(user)
    }

    async fn user_exists(&self, filter: UserFilter<'_>) -> StoreResult<bool> {
        let exists = match filter {
            UserFilter::Email(email) => UserRepo::exists_by_email(&self.pool, email).await?,
            UserFilter::NormalizedEmail { email, exclude_id } => {
                UserRepo::exists_by_normalized_email(&self.pool, email, exclude_id).await?
            }
        };
        Ok(exists)
    }

    async fn commit(&self, changes: Changeset) -> StoreResult<CommitOutcome> {
        let mut outcome = CommitOutcome::default();
        if changes.is_empty() {
            return Ok(outcome);
        }

        let staged = changes.len();
        // Dropping `tx` on an early return rolls everything back.
        let mut tx = self.pool.begin().await?;

        for write in changes.into_writes() {
            match write {
                PendingWrite::InsertRole(input) => {
                    outcome.roles.push(RoleRepo::insert(&mut *tx, &input).await?);
                    outcome.rows_affected += 1;
                }
                PendingWrite::InsertUser(input) => {
                    outcome.users.push(UserRepo::insert(&mut *tx, &input).await?);
                    outcome.rows_affected += 1;
                }
                PendingWrite::UpdateUser(user) => {
                    if UserRepo::update(&mut *tx, &user).await? {
                        outcome.rows_affected += 1;
                    }
                }
            }
        }

        tx.commit().await?;
        tracing::debug!(staged, rows_affected = outcome.rows_affected, "Changeset committed");
        Ok(outcome)
    }

    async fn execute_raw(&self, statement: RawStatement) -> StoreResult<u64> {
        let sql = statement.sql();
        let rows = match statement {
            RawStatement::SetUserTokenIssuedAt { user_id, issued_at } => {
                UserRepo::set_token_issued_at(&self.pool, sql, user_id, issued_at).await?
            }
        };
        tracing::debug!(sql, rows, "Raw statement executed");
        Ok(rows)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(crate::health_check(&self.pool).await?)
    }
}
