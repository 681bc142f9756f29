use std::sync::Arc;

use chrono::Utc;
use taskapi_core::roles::ROLE_WITHOUT_TEAM_ID;
use taskapi_core::types::DbId;
use taskapi_core::users::normalize_email;
use taskapi_db::models::user::{NewUser, User};
use taskapi_db::store::{
    Changeset, RawStatement, Store, StoreError, UserFilter, FK_USERS_ROLE_ID, UQ_USERS_EMAIL,
};

use super::{ServiceError, ServiceResult};
use crate::auth::password::hash_password;

/// Registration input. The password is plaintext here and nowhere after.
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    pub email: String,
    pub password: String,
    /// Defaults to the "User without Team" role.
    pub role_id: Option<DbId>,
}

/// User lookup, registration and token bookkeeping.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Active users in id order.
    pub async fn list_users(&self) -> ServiceResult<Vec<User>> {
        Ok(self.store.list_users(true).await?)
    }

    /// Active user by id. Inactive users are reported as absent.
    pub async fn get_user(&self, id: DbId) -> ServiceResult<Option<User>> {
        let user = self.store.user_by_id(id).await?;
        Ok(user.filter(|u| u.is_active))
    }

    /// Exact, case-sensitive email lookup. The input is not normalized.
    pub async fn get_user_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        let user = self.store.find_user(UserFilter::Email(email)).await?;
        match &user {
            Some(u) => tracing::debug!(user_id = u.id, "User found by email"),
            None => tracing::debug!(%email, "No user with this email"),
        }
        Ok(user)
    }

    /// Whether the normalized `email` is taken, ignoring `exclude_id`.
    pub async fn email_exists(&self, email: &str, exclude_id: Option<DbId>) -> ServiceResult<bool> {
        let email = normalize_email(email);
        let exists = self
            .store
            .user_exists(UserFilter::NormalizedEmail {
                email: &email,
                exclude_id,
            })
            .await?;
        tracing::debug!(%email, ?exclude_id, exists, "Checked email availability");
        Ok(exists)
    }

    /// Register a user.
    ///
    /// The email is normalized and checked again here even when the caller
    /// already did. The password is hashed before anything is staged.
    pub async fn create_user(&self, input: CreateUserInput) -> ServiceResult<User> {
        let email = normalize_email(&input.email);
        tracing::info!(%email, "Creating user");

        if self.email_exists(&email, None).await? {
            tracing::warn!(%email, "Email already in use");
            return Err(ServiceError::DuplicateEmail(email));
        }

        let role_id = match input.role_id {
            Some(id) => {
                if self.store.role_by_id(id).await?.is_none() {
                    return Err(unknown_role(id));
                }
                id
            }
            None => ROLE_WITHOUT_TEAM_ID,
        };

        let password_hash = hash_password(&input.password)
            .map_err(|e| ServiceError::Internal(format!("Password hashing error: {e}")))?;

        let now = Utc::now();
        let mut changes = Changeset::new();
        changes.add_user(NewUser {
            email: email.clone(),
            password_hash,
            role_id,
            created_at: now,
            updated_at: now,
            last_token_issue_at: Some(now),
        });

        let outcome = match self.store.commit(changes).await {
            Ok(outcome) => outcome,
            Err(err) if err.violates(UQ_USERS_EMAIL) => {
                tracing::warn!(%email, "User insert lost a race on the unique email");
                return Err(ServiceError::DuplicateEmail(email));
            }
            Err(StoreError::ForeignKeyViolation { constraint }) if constraint == FK_USERS_ROLE_ID => {
                return Err(unknown_role(role_id));
            }
            Err(err) => return Err(err.into()),
        };

        let user = outcome
            .users
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::Internal("user insert returned no row".into()))?;

        tracing::info!(user_id = user.id, role_id = user.role_id, "User created");
        Ok(user)
    }

    /// Persist `user.last_token_issue_at` and nothing else.
    ///
    /// The current row is re-read and only the token timestamp is copied onto
    /// it. If a table trigger rejects the tracked update, the single column is
    /// written with a raw statement instead. Returns `false` when the user does
    /// not exist or no row changed.
    pub async fn update_token_timestamp(&self, user: &User) -> ServiceResult<bool> {
        let Some(mut current) = self.store.user_by_id(user.id).await? else {
            tracing::warn!(user_id = user.id, "User not found for token update");
            return Ok(false);
        };

        let issued_at = user.last_token_issue_at;
        current.last_token_issue_at = issued_at;

        let mut changes = Changeset::new();
        changes.update_user(current);

        match self.store.commit(changes).await {
            Ok(outcome) => {
                tracing::debug!(user_id = user.id, rows = outcome.rows_affected, "Token timestamp updated");
                Ok(outcome.rows_affected > 0)
            }
            Err(StoreError::TriggerConflict(reason)) => {
                tracing::warn!(
                    user_id = user.id,
                    %reason,
                    "Tracked update rejected by trigger, retrying with raw statement"
                );
                let rows = self
                    .store
                    .execute_raw(RawStatement::SetUserTokenIssuedAt {
                        user_id: user.id,
                        issued_at,
                    })
                    .await?;
                if rows == 0 {
                    tracing::warn!(user_id = user.id, "Raw token update touched no rows");
                }
                Ok(rows > 0)
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn update_user(&self, _id: DbId) -> ServiceResult<User> {
        Err(ServiceError::NotImplemented("User update"))
    }

    pub async fn delete_user(&self, _id: DbId) -> ServiceResult<()> {
        Err(ServiceError::NotImplemented("User deletion"))
    }
}

fn unknown_role(role_id: DbId) -> ServiceError {
    ServiceError::Validation(vec![format!("Role with id {role_id} does not exist")])
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Duration;
    use taskapi_db::store::memory::MemoryStore;

    use super::*;
    use crate::auth::password::verify_password;

    fn service_over(store: MemoryStore) -> (UserService, Arc<MemoryStore>) {
        let store = Arc::new(store);
        (UserService::new(store.clone()), store)
    }

    fn input(email: &str) -> CreateUserInput {
        CreateUserInput {
            email: email.to_string(),
            password: "s3cret-password".to_string(),
            role_id: None,
        }
    }

    #[tokio::test]
    async fn create_user_normalizes_email_and_defaults_role() {
        let (svc, _) = service_over(MemoryStore::seeded());
        let user = svc.create_user(input("  Foo@Bar.com ")).await.unwrap();
        assert_eq!(user.email, "foo@bar.com");
        assert_eq!(user.role_id, ROLE_WITHOUT_TEAM_ID);
        assert!(user.is_active);
        assert_eq!(user.created_at, user.updated_at);
        assert_eq!(user.last_token_issue_at, Some(user.created_at));
    }

    #[tokio::test]
    async fn normalized_duplicates_conflict() {
        let (svc, _) = service_over(MemoryStore::seeded());
        svc.create_user(input("Foo@Bar.com ")).await.unwrap();
        assert_matches!(
            svc.create_user(input("foo@bar.com")).await,
            Err(ServiceError::DuplicateEmail(email)) if email == "foo@bar.com"
        );
    }

    #[tokio::test]
    async fn racing_insert_rejected_by_constraint_is_a_duplicate() {
        let (svc, store) = service_over(MemoryStore::seeded().with_stale_exists_checks());
        svc.create_user(input("Foo@Bar.com ")).await.unwrap();
        assert_matches!(
            svc.create_user(input("foo@bar.com")).await,
            Err(ServiceError::DuplicateEmail(email)) if email == "foo@bar.com"
        );
        assert_eq!(store.list_users(false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn stored_hash_verifies_only_the_original_password() {
        let (svc, store) = service_over(MemoryStore::seeded());
        let created = svc.create_user(input("ana@example.com")).await.unwrap();
        let stored = store.user_by_id(created.id).await.unwrap().unwrap();

        assert_ne!(stored.password_hash, "s3cret-password");
        assert!(verify_password("s3cret-password", &stored.password_hash).unwrap());
        assert!(!verify_password("S3cret-password", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn explicit_role_must_exist() {
        let (svc, _) = service_over(MemoryStore::seeded());
        let mut with_role = input("lead@example.com");
        with_role.role_id = Some(2);
        assert_eq!(svc.create_user(with_role).await.unwrap().role_id, 2);

        let mut bad_role = input("ghost@example.com");
        bad_role.role_id = Some(42);
        assert_matches!(svc.create_user(bad_role).await, Err(ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn email_lookup_is_exact() {
        let (svc, _) = service_over(MemoryStore::seeded());
        let user = svc.create_user(input("ana@example.com")).await.unwrap();
        assert_eq!(svc.get_user_by_email("ana@example.com").await.unwrap(), Some(user));
        assert_eq!(svc.get_user_by_email("ANA@example.com").await.unwrap(), None);
    }

    #[tokio::test]
    async fn email_exists_can_exclude_owner() {
        let (svc, _) = service_over(MemoryStore::seeded());
        let user = svc.create_user(input("ana@example.com")).await.unwrap();
        assert!(svc.email_exists(" ANA@example.com", None).await.unwrap());
        assert!(!svc.email_exists("ana@example.com", Some(user.id)).await.unwrap());
        assert!(!svc.email_exists("bob@example.com", None).await.unwrap());
    }

    #[tokio::test]
    async fn inactive_users_are_hidden() {
        let (svc, store) = service_over(MemoryStore::seeded());
        let ana = svc.create_user(input("ana@example.com")).await.unwrap();
        let bob = svc.create_user(input("bob@example.com")).await.unwrap();

        let mut changes = Changeset::new();
        changes.update_user(User {
            is_active: false,
            ..bob.clone()
        });
        store.commit(changes).await.unwrap();

        let listed: Vec<_> = svc.list_users().await.unwrap().into_iter().map(|u| u.id).collect();
        assert_eq!(listed, vec![ana.id]);
        assert_eq!(svc.get_user(bob.id).await.unwrap(), None);
        assert!(svc.get_user(ana.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn token_update_for_missing_user_is_false() {
        let (svc, _) = service_over(MemoryStore::seeded());
        let ana = svc.create_user(input("ana@example.com")).await.unwrap();
        let ghost = User { id: 999, ..ana };
        assert!(!svc.update_token_timestamp(&ghost).await.unwrap());
    }

    #[tokio::test]
    async fn token_update_only_touches_token_field() {
        let (svc, store) = service_over(MemoryStore::seeded());
        let before = svc.create_user(input("ana@example.com")).await.unwrap();

        // Stale fields on the argument must not leak into the row.
        let request = User {
            email: "changed@example.com".into(),
            is_active: false,
            last_token_issue_at: before.last_token_issue_at.map(|t| t + Duration::minutes(5)),
            ..before.clone()
        };
        assert!(svc.update_token_timestamp(&request).await.unwrap());

        let after = store.user_by_id(before.id).await.unwrap().unwrap();
        assert_eq!(after.last_token_issue_at, request.last_token_issue_at);
        assert_eq!(
            User {
                last_token_issue_at: before.last_token_issue_at,
                ..after
            },
            before
        );
    }

    #[tokio::test]
    async fn token_update_falls_back_when_trigger_blocks() {
        let (svc, store) = service_over(MemoryStore::seeded().with_update_trigger());
        let before = svc.create_user(input("ana@example.com")).await.unwrap();

        let request = User {
            last_token_issue_at: None,
            ..before.clone()
        };
        assert!(svc.update_token_timestamp(&request).await.unwrap());

        let after = store.user_by_id(before.id).await.unwrap().unwrap();
        assert_eq!(after.last_token_issue_at, None);
        assert_eq!(after.email, before.email);
        assert_eq!(after.updated_at, before.updated_at);
        assert_eq!(after.password_hash, before.password_hash);
    }

    #[tokio::test]
    async fn update_and_delete_are_not_implemented() {
        let (svc, _) = service_over(MemoryStore::seeded());
        assert_matches!(svc.update_user(1).await, Err(ServiceError::NotImplemented(_)));
        assert_matches!(svc.delete_user(1).await, Err(ServiceError::NotImplemented(_)));
    }
}
