//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::pagination::PaginationDefaults;
use crate::store::DocumentDatabase;
use crate::usecase::UsersUsecase;

/// Application state shared across handlers
///
/// Cloning is cheap; every field is reference counted.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    pagination: PaginationDefaults,
    users: Arc<dyn UsersUsecase>,
    store: Arc<dyn DocumentDatabase>,
}

impl AppState {
    /// Create the state from loaded config and initialized components
    pub fn new(
        config: Config,
        users: Arc<dyn UsersUsecase>,
        store: Arc<dyn DocumentDatabase>,
    ) -> Self {
        let pagination = PaginationDefaults::from(&config.pagination);
        Self {
            config: Arc::new(config),
            pagination,
            users,
            store,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Defaults applied to list requests
    pub fn pagination_defaults(&self) -> PaginationDefaults {
        self.pagination
    }

    /// The users component
    pub fn users(&self) -> &dyn UsersUsecase {
        self.users.as_ref()
    }

    /// The document store, for readiness checks
    pub fn store(&self) -> &dyn DocumentDatabase {
        self.store.as_ref()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("service", &self.config.service.name)
            .field("pagination", &self.pagination)
            .finish_non_exhaustive()
    }
}
