//! Runtime dependencies injected into components during initialization

use std::sync::Arc;
use std::time::Duration;

use crate::config::StoreConfig;
use crate::store::{DocumentCollection, DocumentDatabase, TimedCollection};

/// Persistence handles shared by every component
///
/// Collections are wrapped in [`TimedCollection`], so every operation a
/// component issues is bounded by the configured store timeout.
#[derive(Clone)]
pub struct Adapter {
    /// Handle to the users collection
    pub users: Arc<dyn DocumentCollection>,
}

impl Adapter {
    /// Build the adapter bundle from a connected database
    pub fn new(database: Arc<dyn DocumentDatabase>, config: &StoreConfig) -> Self {
        Self::with_timeout(
            database,
            &config.users_collection,
            config.operation_timeout(),
        )
    }

    /// Build the adapter bundle with an explicit collection name and timeout
    pub fn with_timeout(
        database: Arc<dyn DocumentDatabase>,
        users_collection: &str,
        timeout: Duration,
    ) -> Self {
        let users = database.collection(users_collection);
        Self {
            users: Arc::new(TimedCollection::new(users, timeout)),
        }
    }
}

impl std::fmt::Debug for Adapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adapter")
            .field("users", &self.users.name())
            .finish()
    }
}
