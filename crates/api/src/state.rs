use std::sync::Arc;

use taskapi_db::store::Store;

use crate::config::ServerConfig;
use crate::services::{RoleService, UserService};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Persistence gateway shared by the services; also used for health checks.
    pub store: Arc<dyn Store>,
    pub config: Arc<ServerConfig>,
    pub roles: RoleService,
    pub users: UserService,
}

impl AppState {
    /// Wire the services onto one store.
    pub fn new(store: Arc<dyn Store>, config: ServerConfig) -> Self {
        Self {
            roles: RoleService::new(Arc::clone(&store)),
            users: UserService::new(Arc::clone(&store)),
            store,
            config: Arc::new(config),
        }
    }
}
