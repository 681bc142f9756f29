//! Persistence gateway.
//!
//! Services talk to a [`Store`] and never to SQL directly. Reads go straight
//! through the trait; writes are staged on a [`Changeset`] and applied by
//! [`Store::commit`] as one atomic unit. [`Store::execute_raw`] runs a fixed
//! parameterized statement outside that path, for writes the tracked path
//! cannot perform.

use async_trait::async_trait;
use taskapi_core::error::ErrorKind;
use taskapi_core::types::{DbId, Timestamp};

use crate::models::role::{NewRole, Role};
use crate::models::user::{NewUser, User};

#[cfg(any(test, feature = "memory"))]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

/// Unique constraint on `roles.name`.
pub const UQ_ROLES_NAME: &str = "uq_roles_name";
/// Unique index on `LOWER(users.email)`.
pub const UQ_USERS_EMAIL: &str = "uq_users_email";
/// Foreign key from `users.role_id` to `roles.id`.
pub const FK_USERS_ROLE_ID: &str = "users_role_id_fkey";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    #[error("foreign key violated: {constraint}")]
    ForeignKeyViolation { constraint: String },

    /// A table trigger rejected a tracked update that reads back the
    /// modified row.
    #[error("update rejected by table trigger: {0}")]
    TriggerConflict(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl StoreError {
    /// Whether this is a unique violation of `constraint`.
    pub fn violates(&self, constraint: &str) -> bool {
        matches!(self, StoreError::UniqueViolation { constraint: c } if c == constraint)
    }

    /// Category used when a caller lets a store error escape unhandled.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::UniqueViolation { .. } => ErrorKind::Conflict,
            StoreError::ForeignKeyViolation { .. } => ErrorKind::Validation,
            StoreError::TriggerConflict(_) | StoreError::Database(_) => ErrorKind::Internal,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            if db_err.is_unique_violation() {
                return StoreError::UniqueViolation { constraint };
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::ForeignKeyViolation { constraint };
            }
            if is_trigger_rejection(db_err.code().as_deref(), db_err.message()) {
                return StoreError::TriggerConflict(db_err.message().to_string());
            }
        }
        StoreError::Database(err)
    }
}

/// SQLSTATE class 09 (triggered action exception) and 27000 (triggered data
/// change violation), or a trigger raising a plain exception that names itself.
fn is_trigger_rejection(code: Option<&str>, message: &str) -> bool {
    match code {
        Some(c) if c.starts_with("09") || c == "27000" => true,
        _ => message.to_ascii_lowercase().contains("trigger"),
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Predicate for role lookups.
#[derive(Debug, Clone, Copy)]
pub enum RoleFilter<'a> {
    /// Exact, case-sensitive name.
    Name(&'a str),
}

/// Predicate for user lookups.
#[derive(Debug, Clone, Copy)]
pub enum UserFilter<'a> {
    /// Exact, case-sensitive email.
    Email(&'a str),
    /// Email compared ignoring case, optionally skipping one user.
    NormalizedEmail {
        email: &'a str,
        exclude_id: Option<DbId>,
    },
}

/// A write waiting for [`Store::commit`].
#[derive(Debug, Clone)]
pub enum PendingWrite {
    InsertRole(NewRole),
    InsertUser(NewUser),
    /// Write back every mutable column of the user row.
    UpdateUser(User),
}

/// Writes staged for a single atomic commit.
#[derive(Debug, Clone, Default)]
pub struct Changeset {
    writes: Vec<PendingWrite>,
}

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_role(&mut self, role: NewRole) -> &mut Self {
        self.writes.push(PendingWrite::InsertRole(role));
        self
    }

    pub fn add_user(&mut self, user: NewUser) -> &mut Self {
        self.writes.push(PendingWrite::InsertUser(user));
        self
    }

    /// Mark `user` dirty; its row is rewritten on commit.
    pub fn update_user(&mut self, user: User) -> &mut Self {
        self.writes.push(PendingWrite::UpdateUser(user));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn writes(&self) -> &[PendingWrite] {
        &self.writes
    }

    pub fn into_writes(self) -> Vec<PendingWrite> {
        self.writes
    }
}

/// Result of a successful commit.
#[derive(Debug, Clone, Default)]
pub struct CommitOutcome {
    /// Rows inserted or updated.
    pub rows_affected: u64,
    /// Inserted roles with generated ids, in staging order.
    pub roles: Vec<Role>,
    /// Inserted users with generated ids, in staging order.
    pub users: Vec<User>,
}

/// Parameterized statements run outside the tracked write path.
#[derive(Debug, Clone)]
pub enum RawStatement {
    /// Set `users.last_token_issue_at` without reading the row back.
    SetUserTokenIssuedAt {
        user_id: DbId,
        issued_at: Option<Timestamp>,
    },
}

impl RawStatement {
    /// SQL text of the statement. Parameters bind in the order listed.
    pub fn sql(&self) -> &'static str {
        match self {
            RawStatement::SetUserTokenIssuedAt { .. } => {
                "UPDATE users SET last_token_issue_at = $1 WHERE id = $2"
            }
        }
    }
}

/// Row access for the `roles` and `users` tables.
#[async_trait]
pub trait Store: Send + Sync {
    /// All roles with their active-user counts, ordered by id.
    async fn list_roles(&self) -> StoreResult<Vec<Role>>;

    async fn role_by_id(&self, id: DbId) -> StoreResult<Option<Role>>;

    /// First role matching `filter`.
    async fn find_role(&self, filter: RoleFilter<'_>) -> StoreResult<Option<Role>>;

    async fn role_exists(&self, filter: RoleFilter<'_>) -> StoreResult<bool>;

    /// Users ordered by id.
    async fn list_users(&self, active_only: bool) -> StoreResult<Vec<User>>;

    /// User by id regardless of `is_active`.
    async fn user_by_id(&self, id: DbId) -> StoreResult<Option<User>>;

    /// First user (lowest id) matching `filter`.
    async fn find_user(&self, filter: UserFilter<'_>) -> StoreResult<Option<User>>;

    async fn user_exists(&self, filter: UserFilter<'_>) -> StoreResult<bool>;

    /// Apply every staged write atomically. Nothing is written on error.
    async fn commit(&self, changes: Changeset) -> StoreResult<CommitOutcome>;

    /// Run a raw statement, returning the number of affected rows.
    async fn execute_raw(&self, statement: RawStatement) -> StoreResult<u64>;

    /// Check that the backing store is reachable.
    async fn ping(&self) -> StoreResult<()>;
}
