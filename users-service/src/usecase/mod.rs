//! Business operations hosted by the component registry

pub mod crud;
mod users;

use crate::adapter::ValidationErrors;
use crate::ids::InvalidRecordId;
use crate::registry::{Registry, RegistryError};
use crate::store::StoreError;

pub use crud::DocumentCrud;
pub use users::{UsersComponent, UsersUsecase};

/// Registry name of the users component
pub const USERS: &str = "users";

/// Usecase failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsecaseError {
    /// The identifier cannot be translated into the store-native form
    #[error(transparent)]
    InvalidId(#[from] InvalidRecordId),

    /// No record matches the identifier
    #[error("{0}")]
    NotFound(String),

    /// The record violates a constraint
    #[error("{0}")]
    Validation(ValidationErrors),

    /// The store failed or timed out
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The component was used before its initialization step ran
    #[error("component '{0}' is not initialized")]
    NotInitialized(&'static str),
}

/// Register every usecase component
pub fn register_components(registry: &Registry) -> Result<(), RegistryError> {
    registry.register::<dyn UsersUsecase, _>(USERS, || -> Box<dyn UsersUsecase> {
        Box::new(UsersComponent::default())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_components() {
        let registry = Registry::new();
        register_components(&registry).unwrap();

        assert_eq!(registry.names(), vec![USERS]);
        assert!(registry.resolve::<dyn UsersUsecase>(USERS).is_ok());
        assert!(matches!(
            register_components(&registry),
            Err(RegistryError::Duplicate(_))
        ));
    }
}
