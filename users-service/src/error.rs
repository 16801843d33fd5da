//! Service-level error types
//!
//! These errors surface while the service starts: configuration loading,
//! store connection, and component wiring. Request-time failures are modelled
//! by [`crate::rest::ApiError`] instead.

use thiserror::Error;

use crate::registry::RegistryError;
use crate::store::StoreError;

/// Result type alias using the service error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for service bootstrap
///
/// Large error variants are boxed to reduce stack size
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Component registry misconfiguration
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Document store failure while bootstrapping
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

/// Sanitize a connection URL by removing credentials
pub fn sanitize_url(url: &str) -> String {
    if let (Some(at_pos), Some(scheme_end)) = (url.rfind('@'), url.find("://")) {
        if at_pos > scheme_end {
            let scheme = &url[..scheme_end + 3];
            let after_at = &url[at_pos + 1..];
            return format!("{}<redacted>@{}", scheme, after_at);
        }
    }
    url.to_string()
}
