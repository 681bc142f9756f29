use std::sync::Arc;

use taskapi_core::roles::{normalize_role_name, validate_role_name};
use taskapi_core::statistics::{summarize, RoleStatistics, RoleTally};
use taskapi_core::types::DbId;
use taskapi_db::models::role::{NewRole, Role};
use taskapi_db::store::{Changeset, RoleFilter, Store, UQ_ROLES_NAME};

use super::{ServiceError, ServiceResult};

/// Role listing, lookup, creation and statistics.
#[derive(Clone)]
pub struct RoleService {
    store: Arc<dyn Store>,
}

impl RoleService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// All roles in id order. No pagination.
    pub async fn list_roles(&self) -> ServiceResult<Vec<Role>> {
        let roles = self.store.list_roles().await?;
        tracing::debug!(count = roles.len(), "Listed roles");
        Ok(roles)
    }

    /// `None` when no role has this id.
    pub async fn get_role(&self, id: DbId) -> ServiceResult<Option<Role>> {
        Ok(self.store.role_by_id(id).await?)
    }

    /// Create a role after trimming and validating `name`.
    ///
    /// Names are compared case-sensitively. A duplicate found by the
    /// pre-check and one rejected by the unique constraint both surface as
    /// [`ServiceError::DuplicateName`].
    pub async fn create_role(&self, name: &str) -> ServiceResult<Role> {
        let name = normalize_role_name(name);
        let errors = validate_role_name(&name);
        if !errors.is_empty() {
            return Err(ServiceError::Validation(errors));
        }

        if self.store.role_exists(RoleFilter::Name(&name)).await? {
            tracing::warn!(role_name = %name, "Role name already taken");
            return Err(ServiceError::DuplicateName(name));
        }

        let mut changes = Changeset::new();
        changes.add_role(NewRole { name: name.clone() });

        let outcome = match self.store.commit(changes).await {
            Ok(outcome) => outcome,
            Err(err) if err.violates(UQ_ROLES_NAME) => {
                tracing::warn!(role_name = %name, "Role insert lost a race on the unique name");
                return Err(ServiceError::DuplicateName(name));
            }
            Err(err) => return Err(err.into()),
        };

        let role = outcome
            .roles
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::Internal("role insert returned no row".into()))?;

        tracing::info!(role_id = role.id, role_name = %role.name, "Role created");
        Ok(role)
    }

    /// Aggregate counts and user distribution over every role.
    pub async fn statistics(&self) -> ServiceResult<RoleStatistics> {
        let roles = self.store.list_roles().await?;
        let tallies: Vec<RoleTally> = roles.iter().map(RoleTally::from).collect();
        Ok(summarize(&tallies))
    }

    pub async fn update_role(&self, _id: DbId) -> ServiceResult<Role> {
        Err(ServiceError::NotImplemented("Role update"))
    }

    pub async fn delete_role(&self, _id: DbId) -> ServiceResult<()> {
        Err(ServiceError::NotImplemented("Role deletion"))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;
    use taskapi_core::roles::ROLE_TEAM_MEMBER_ID;
    use taskapi_db::models::user::NewUser;
    use taskapi_db::store::memory::MemoryStore;

    use super::*;

    fn service() -> (RoleService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::seeded());
        (RoleService::new(store.clone()), store)
    }

    async fn add_users(store: &MemoryStore, role_id: DbId, count: usize) {
        let now = Utc::now();
        let mut changes = Changeset::new();
        for i in 0..count {
            changes.add_user(NewUser {
                email: format!("member{role_id}-{i}@example.com"),
                password_hash: "hash".into(),
                role_id,
                created_at: now,
                updated_at: now,
                last_token_issue_at: None,
            });
        }
        store.commit(changes).await.unwrap();
    }

    #[tokio::test]
    async fn create_role_trims_and_assigns_id() {
        let (svc, _) = service();
        let role = svc.create_role("  Quality Assurance ").await.unwrap();
        assert_eq!(role.name, "Quality Assurance");
        assert_eq!(role.id, 5);
        assert_eq!(role.user_count, 0);
        assert_eq!(svc.get_role(5).await.unwrap(), Some(role));
    }

    #[tokio::test]
    async fn create_role_twice_conflicts() {
        let (svc, _) = service();
        svc.create_role("Support").await.unwrap();
        assert_matches!(
            svc.create_role("Support").await,
            Err(ServiceError::DuplicateName(name)) if name == "Support"
        );
    }

    #[tokio::test]
    async fn racing_insert_rejected_by_constraint_is_a_duplicate() {
        let svc = RoleService::new(Arc::new(MemoryStore::seeded().with_stale_exists_checks()));
        svc.create_role("Support").await.unwrap();
        assert_matches!(
            svc.create_role(" Support").await,
            Err(ServiceError::DuplicateName(name)) if name == "Support"
        );
        assert_eq!(svc.list_roles().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn duplicate_check_is_case_sensitive() {
        let (svc, _) = service();
        assert!(svc.create_role("team member").await.is_ok());
    }

    #[tokio::test]
    async fn invalid_names_are_rejected_before_storage() {
        let (svc, _) = service();
        assert_matches!(svc.create_role("   ").await, Err(ServiceError::Validation(_)));
        assert_matches!(svc.create_role("R2D2").await, Err(ServiceError::Validation(_)));
        assert_matches!(svc.create_role("A").await, Err(ServiceError::Validation(_)));
        assert_eq!(svc.list_roles().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn missing_role_is_none() {
        let (svc, _) = service();
        assert_eq!(svc.get_role(99).await.unwrap(), None);
    }

    #[tokio::test]
    async fn statistics_follow_user_distribution() {
        let (svc, store) = service();
        add_users(&store, ROLE_TEAM_MEMBER_ID, 3).await;
        add_users(&store, 2, 1).await;
        store.set_role_active(1, false).await;

        let stats = svc.statistics().await.unwrap();
        assert_eq!(stats.total_roles, 4);
        assert_eq!(stats.active_roles, 3);
        assert_eq!(stats.total_users, 4);
        assert_eq!(stats.most_popular_role, "Team Member");
        let shares: Vec<_> = stats
            .role_distribution
            .iter()
            .map(|s| (s.role_name.as_str(), s.percentage))
            .collect();
        assert_eq!(
            shares,
            vec![
                ("Team Member", 75.0),
                ("Team Leader", 25.0),
                ("Administrator", 0.0),
                ("User without Team", 0.0),
            ]
        );
    }

    #[tokio::test]
    async fn statistics_without_roles() {
        let svc = RoleService::new(Arc::new(MemoryStore::new()));
        let stats = svc.statistics().await.unwrap();
        assert_eq!(stats.total_roles, 0);
        assert_eq!(stats.most_popular_role, "N/A");
    }

    #[tokio::test]
    async fn update_and_delete_are_not_implemented() {
        let (svc, _) = service();
        assert_matches!(
            svc.update_role(1).await,
            Err(ServiceError::NotImplemented(_))
        );
        assert_matches!(svc.delete_role(1).await, Err(ServiceError::NotImplemented(_)));
    }
}
