//! Component registry
//!
//! A process-wide table mapping a component name to the interface it
//! implements and a factory producing a fresh, uninitialized instance.
//! Consumers resolve components by name and interface without naming the
//! concrete type:
//!
//! ```rust,ignore
//! let registry = registry::global();
//! registry.register::<dyn UsersUsecase>("users", || -> Box<dyn UsersUsecase> {
//!     Box::new(UsersComponent::default())
//! })?;
//! registry.seal();
//!
//! let users = registry.resolve_init::<dyn UsersUsecase>("users", &adapter)?;
//! ```
//!
//! Registration happens during startup. Once [`Registry::seal`] is called the
//! registry is read-only and further registrations fail.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::adapters::Adapter;

type Factory = Arc<dyn Fn() -> Box<dyn Any + Send> + Send + Sync>;

/// Registry misuse
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A component with this name is already registered
    #[error("component '{0}' is already registered")]
    Duplicate(String),

    /// No component is registered under this name
    #[error("component '{0}' is not registered")]
    NotFound(String),

    /// The component exists but implements a different interface
    #[error("component '{name}' implements {registered}, not {requested}")]
    InterfaceMismatch {
        /// Component name
        name: String,
        /// Interface the component was registered with
        registered: &'static str,
        /// Interface the caller asked for
        requested: &'static str,
    },

    /// The registry no longer accepts registrations
    #[error("registry is sealed; cannot register '{0}'")]
    Sealed(String),

    /// The component's initialization step failed
    #[error("component '{name}' failed to initialize: {reason}")]
    Init {
        /// Component name
        name: String,
        /// Failure reported by the component
        reason: String,
    },
}

/// Initialization step run after a component is instantiated
///
/// Factories produce zero-value instances; `init` wires in the runtime
/// dependencies before the instance is used.
pub trait Component {
    /// Inject dependencies
    fn init(&mut self, adapter: &Adapter) -> Result<(), String>;
}

/// A single registry entry
#[derive(Clone)]
pub struct Registration {
    name: &'static str,
    interface: TypeId,
    interface_name: &'static str,
    factory: Factory,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("interface", &self.interface_name)
            .finish_non_exhaustive()
    }
}

/// Name-keyed component table
#[derive(Debug, Default)]
pub struct Registry {
    entries: DashMap<&'static str, Registration>,
    sealed: AtomicBool,
}

impl Registry {
    /// Create an empty, unsealed registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory producing implementations of interface `I`
    ///
    /// `I` is usually a trait object such as `dyn UsersUsecase`.
    pub fn register<I, F>(&self, name: &'static str, factory: F) -> Result<(), RegistryError>
    where
        I: ?Sized + 'static,
        Box<I>: Send,
        F: Fn() -> Box<I> + Send + Sync + 'static,
    {
        if self.is_sealed() {
            return Err(RegistryError::Sealed(name.to_string()));
        }

        match self.entries.entry(name) {
            Entry::Occupied(_) => Err(RegistryError::Duplicate(name.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(Registration {
                    name,
                    interface: TypeId::of::<I>(),
                    interface_name: type_name::<I>(),
                    factory: Arc::new(move || Box::new(factory()) as Box<dyn Any + Send>),
                });
                tracing::debug!(component = name, interface = type_name::<I>(), "Component registered");
                Ok(())
            }
        }
    }

    /// Instantiate the named component as interface `I`
    ///
    /// Each call produces a fresh instance; the instance is not initialized.
    pub fn resolve<I>(&self, name: &str) -> Result<Box<I>, RegistryError>
    where
        I: ?Sized + 'static,
    {
        let factory = {
            let entry = self
                .entries
                .get(name)
                .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;

            if entry.interface != TypeId::of::<I>() {
                return Err(RegistryError::InterfaceMismatch {
                    name: name.to_string(),
                    registered: entry.interface_name,
                    requested: type_name::<I>(),
                });
            }
            Arc::clone(&entry.factory)
        };

        factory()
            .downcast::<Box<I>>()
            .map(|instance| *instance)
            .map_err(|_| RegistryError::InterfaceMismatch {
                name: name.to_string(),
                registered: type_name::<I>(),
                requested: type_name::<I>(),
            })
    }

    /// Instantiate the named component and run its initialization step
    pub fn resolve_init<I>(&self, name: &str, adapter: &Adapter) -> Result<Box<I>, RegistryError>
    where
        I: ?Sized + Component + 'static,
    {
        let mut instance = self.resolve::<I>(name)?;
        instance.init(adapter).map_err(|reason| RegistryError::Init {
            name: name.to_string(),
            reason,
        })?;
        tracing::info!(component = name, "Component initialized");
        Ok(instance)
    }

    /// Close the registry for writes
    pub fn seal(&self) {
        self.sealed.store(true, Ordering::Release);
    }

    /// Whether the registry is closed for writes
    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    /// Whether a component is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered component names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.iter().map(|entry| *entry.key()).collect();
        names.sort_unstable();
        names
    }
}

static GLOBAL: Lazy<Registry> = Lazy::new(Registry::new);

/// The process-wide registry
pub fn global() -> &'static Registry {
    &GLOBAL
}
