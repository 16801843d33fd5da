//! Process bootstrap: config, logging, store, components, server

use std::sync::Arc;

use crate::adapters::Adapter;
use crate::config::Config;
use crate::error::Result;
use crate::observability;
use crate::registry::{self, Registry};
use crate::rest;
use crate::server::Server;
use crate::state::AppState;
use crate::store::{self, DocumentDatabase};
use crate::usecase::{self, UsersUsecase};

/// Register, seal and initialize components, producing the handler state
///
/// Any wiring error is fatal for startup.
pub fn wire(
    registry: &Registry,
    config: Config,
    database: Arc<dyn DocumentDatabase>,
) -> Result<AppState> {
    let adapter = Adapter::new(Arc::clone(&database), &config.store);

    usecase::register_components(registry)?;
    registry.seal();
    tracing::debug!(components = ?registry.names(), "Component registry sealed");

    let users: Box<dyn UsersUsecase> =
        registry.resolve_init::<dyn UsersUsecase>(usecase::USERS, &adapter)?;

    Ok(AppState::new(config, Arc::from(users), database))
}

/// Run the service until a shutdown signal arrives
pub async fn run(config: Config) -> Result<()> {
    observability::init_tracing(&config)?;

    let database = store::connect(&config.store).await?;
    let state = wire(registry::global(), config.clone(), database)?;

    let app = rest::router(state);
    let result = Server::new(config).serve(app).await;

    observability::shutdown_tracing();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryError;
    use crate::store::MemoryDatabase;

    #[test]
    fn test_wire_seals_registry() {
        let registry = Registry::new();
        let state = wire(&registry, Config::default(), Arc::new(MemoryDatabase::new())).unwrap();

        assert!(registry.is_sealed());
        assert!(registry.contains(usecase::USERS));
        assert_eq!(state.config().service.name, "users-service");
    }

    #[test]
    fn test_wire_twice_is_fatal() {
        let registry = Registry::new();
        wire(&registry, Config::default(), Arc::new(MemoryDatabase::new())).unwrap();

        let err = wire(&registry, Config::default(), Arc::new(MemoryDatabase::new())).unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Registry(RegistryError::Sealed(_))
        ));
    }
}
