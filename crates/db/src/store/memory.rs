//! In-process [`Store`] used by tests and local demos.
//!
//! Mirrors the constraints of the Postgres schema: unique role names, unique
//! emails ignoring case, and the `users.role_id` foreign key. Commits apply
//! to a copy of the tables that replaces the original only on success.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use taskapi_core::roles::SEED_ROLES;
use taskapi_core::types::{DbId, Timestamp};
use tokio::sync::Mutex;

use super::{
    Changeset, CommitOutcome, PendingWrite, RawStatement, RoleFilter, Store, StoreError,
    StoreResult, UserFilter, FK_USERS_ROLE_ID, UQ_ROLES_NAME, UQ_USERS_EMAIL,
};
use crate::models::role::{NewRole, Role};
use crate::models::user::{NewUser, User};

#[derive(Debug, Clone)]
struct RoleRow {
    id: DbId,
    name: String,
    is_active: bool,
    created_at: Timestamp,
    updated_at: Timestamp,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    roles: BTreeMap<DbId, RoleRow>,
    users: BTreeMap<DbId, User>,
    last_role_id: DbId,
    last_user_id: DbId,
}

impl Tables {
    fn role(&self, row: &RoleRow) -> Role {
        let user_count = self
            .users
            .values()
            .filter(|u| u.is_active && u.role_id == row.id)
            .count() as i64;
        Role {
            id: row.id,
            name: row.name.clone(),
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
            user_count,
        }
    }

    fn role_matches(row: &RoleRow, filter: RoleFilter<'_>) -> bool {
        match filter {
            RoleFilter::Name(name) => row.name == name,
        }
    }

    fn user_matches(user: &User, filter: UserFilter<'_>) -> bool {
        match filter {
            UserFilter::Email(email) => user.email == email,
            UserFilter::NormalizedEmail { email, exclude_id } => {
                user.email.to_lowercase() == email.to_lowercase()
                    && exclude_id.map_or(true, |id| user.id != id)
            }
        }
    }

    fn email_taken(&self, email: &str, exclude_id: Option<DbId>) -> bool {
        let filter = UserFilter::NormalizedEmail { email, exclude_id };
        self.users.values().any(|u| Self::user_matches(u, filter))
    }

    fn insert_role(&mut self, input: NewRole) -> StoreResult<Role> {
        if self.roles.values().any(|r| r.name == input.name) {
            return Err(StoreError::UniqueViolation {
                constraint: UQ_ROLES_NAME.to_string(),
            });
        }
        self.last_role_id += 1;
        let now = Utc::now();
        let row = RoleRow {
            id: self.last_role_id,
            name: input.name,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let role = self.role(&row);
        self.roles.insert(row.id, row);
        Ok(role)
    }

    fn insert_user(&mut self, input: NewUser) -> StoreResult<User> {
        self.check_user_row(&input.email, input.role_id, None)?;
        self.last_user_id += 1;
        let user = User {
            id: self.last_user_id,
            email: input.email,
            password_hash: input.password_hash,
            role_id: input.role_id,
            is_active: true,
            created_at: input.created_at,
            updated_at: input.updated_at,
            last_token_issue_at: input.last_token_issue_at,
        };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn update_user(&mut self, user: User) -> StoreResult<bool> {
        if !self.users.contains_key(&user.id) {
            return Ok(false);
        }
        self.check_user_row(&user.email, user.role_id, Some(user.id))?;
        self.users.insert(user.id, user);
        Ok(true)
    }

    fn check_user_row(&self, email: &str, role_id: DbId, id: Option<DbId>) -> StoreResult<()> {
        if self.email_taken(email, id) {
            return Err(StoreError::UniqueViolation {
                constraint: UQ_USERS_EMAIL.to_string(),
            });
        }
        if !self.roles.contains_key(&role_id) {
            return Err(StoreError::ForeignKeyViolation {
                constraint: FK_USERS_ROLE_ID.to_string(),
            });
        }
        Ok(())
    }
}

/// Store holding both tables in memory behind an async mutex.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    update_trigger: bool,
    stale_exists: bool,
}

impl MemoryStore {
    /// Empty store with no roles.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store containing the same seed roles as the migrations.
    pub fn seeded() -> Self {
        let now = Utc::now();
        let mut tables = Tables::default();
        for (id, name) in SEED_ROLES {
            tables.roles.insert(
                id,
                RoleRow {
                    id,
                    name: name.to_string(),
                    is_active: true,
                    created_at: now,
                    updated_at: now,
                },
            );
            tables.last_role_id = tables.last_role_id.max(id);
        }
        Self {
            tables: Mutex::new(tables),
            update_trigger: false,
            stale_exists: false,
        }
    }

    /// Behave like a `users` table guarded by a trigger: tracked user
    /// updates fail with [`StoreError::TriggerConflict`], raw statements
    /// still go through.
    pub fn with_update_trigger(mut self) -> Self {
        self.update_trigger = true;
        self
    }

    /// Make `role_exists` and `user_exists` always answer `false`, as if a
    /// concurrent writer inserted the row between the check and the commit.
    /// Constraints are still enforced on commit.
    pub fn with_stale_exists_checks(mut self) -> Self {
        self.stale_exists = true;
        self
    }

    /// Flip a role's active flag. Returns `false` if the role is missing.
    pub async fn set_role_active(&self, id: DbId, is_active: bool) -> bool {
        let mut tables = self.tables.lock().await;
        match tables.roles.get_mut(&id) {
            Some(row) => {
                row.is_active = is_active;
                row.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_roles(&self) -> StoreResult<Vec<Role>> {
        let tables = self.tables.lock().await;
        Ok(tables.roles.values().map(|r| tables.role(r)).collect())
    }

    async fn role_by_id(&self, id: DbId) -> StoreResult<Option<Role>> {
        let tables = self.tables.lock().await;
        Ok(tables.roles.get(&id).map(|r| tables.role(r)))
    }

    async fn find_role(&self, filter: RoleFilter<'_>) -> StoreResult<Option<Role>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .roles
            .values()
            .find(|r| Tables::role_matches(r, filter))
            .map(|r| tables.role(r)))
    }

    async fn role_exists(&self, filter: RoleFilter<'_>) -> StoreResult<bool> {
        if self.stale_exists {
            return Ok(false);
        }
        let tables = self.tables.lock().await;
        Ok(tables.roles.values().any(|r| Tables::role_matches(r, filter)))
    }

    async fn list_users(&self, active_only: bool) -> StoreResult<Vec<User>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .values()
            .filter(|u| !active_only || u.is_active)
            .cloned()
            .collect())
    }

    async fn user_by_id(&self, id: DbId) -> StoreResult<Option<User>> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn find_user(&self, filter: UserFilter<'_>) -> StoreResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .values()
            .find(|u| Tables::user_matches(u, filter))
            .cloned())
    }

    async fn user_exists(&self, filter: UserFilter<'_>) -> StoreResult<bool> {
        if self.stale_exists {
            return Ok(false);
        }
        let tables = self.tables.lock().await;
        Ok(tables.users.values().any(|u| Tables::user_matches(u, filter)))
    }

    async fn commit(&self, changes: Changeset) -> StoreResult<CommitOutcome> {
        let mut tables = self.tables.lock().await;
        let mut draft = tables.clone();
        let mut outcome = CommitOutcome::default();

        for write in changes.into_writes() {
            match write {
                PendingWrite::InsertRole(input) => {
                    outcome.roles.push(draft.insert_role(input)?);
                    outcome.rows_affected += 1;
                }
                PendingWrite::InsertUser(input) => {
                    outcome.users.push(draft.insert_user(input)?);
                    outcome.rows_affected += 1;
                }
                PendingWrite::UpdateUser(user) => {
                    if self.update_trigger {
                        return Err(StoreError::TriggerConflict(
                            "users has an enabled trigger; the update cannot return modified rows"
                                .to_string(),
                        ));
                    }
                    if draft.update_user(user)? {
                        outcome.rows_affected += 1;
                    }
                }
            }
        }

        *tables = draft;
        Ok(outcome)
    }

    async fn execute_raw(&self, statement: RawStatement) -> StoreResult<u64> {
        let mut tables = self.tables.lock().await;
        match statement {
            RawStatement::SetUserTokenIssuedAt { user_id, issued_at } => {
                match tables.users.get_mut(&user_id) {
                    Some(user) => {
                        user.last_token_issue_at = issued_at;
                        Ok(1)
                    }
                    None => Ok(0),
                }
            }
        }
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
