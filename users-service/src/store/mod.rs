//! Document store port and drivers
//!
//! The usecase layer talks to persistence only through [`DocumentCollection`],
//! a small set of document operations: find with skip/limit, insert, find one,
//! update one and delete one. Two drivers implement it:
//!
//! - [`MongoDatabase`] for `mongodb://` URLs
//! - [`MemoryDatabase`] for `mem://` URLs (tests and local runs)
//!
//! [`TimedCollection`] wraps either driver and bounds every round-trip with the
//! configured operation timeout.

mod memory;
mod mongo;
mod timed;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::{Bson, Document};

use crate::config::StoreConfig;
use crate::error::sanitize_url;

pub use memory::{MemoryCollection, MemoryDatabase};
pub use mongo::{MongoCollection, MongoDatabase};
pub use timed::TimedCollection;

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Store operation being performed when an error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    /// Establishing a connection
    Connect,
    /// Multi-document find
    Find,
    /// Single-document find
    FindOne,
    /// Insert
    Insert,
    /// Update
    Update,
    /// Delete
    Delete,
    /// Liveness ping
    Ping,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => write!(f, "connect"),
            Self::Find => write!(f, "find"),
            Self::FindOne => write!(f, "find_one"),
            Self::Insert => write!(f, "insert"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
            Self::Ping => write!(f, "ping"),
        }
    }
}

/// Document store failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached
    #[error("connection failed: {0}")]
    Connection(String),

    /// The store rejected or failed an operation
    #[error("{operation} failed: {message}")]
    Query {
        /// Operation in flight
        operation: StoreOperation,
        /// Driver message
        message: String,
    },

    /// A document could not be converted to or from its record type
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The operation exceeded its deadline
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// Operation in flight
        operation: StoreOperation,
        /// Deadline that elapsed
        after: Duration,
    },
}

impl StoreError {
    /// Build a query failure
    pub fn query(operation: StoreOperation, message: impl Into<String>) -> Self {
        Self::Query {
            operation,
            message: message.into(),
        }
    }

    /// Whether the failure is transient
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout { .. })
    }
}

/// A collection of documents addressed by `_id`
///
/// Implementations must be safe for concurrent use; the handle is shared
/// read-only across all requests.
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    /// Collection name
    fn name(&self) -> &str;

    /// Documents matching `filter` in natural order, skipping `skip` and
    /// returning at most `limit` (0 means unbounded)
    async fn find(&self, filter: Document, skip: u64, limit: i64) -> StoreResult<Vec<Document>>;

    /// Insert a document and return its `_id`
    async fn insert_one(&self, document: Document) -> StoreResult<Bson>;

    /// First document matching `filter`
    async fn find_one(&self, filter: Document) -> StoreResult<Option<Document>>;

    /// Apply `update` to the first document matching `filter`, returning the
    /// number of matched documents
    async fn update_one(&self, filter: Document, update: Document) -> StoreResult<u64>;

    /// Delete the first document matching `filter`, returning the number deleted
    async fn delete_one(&self, filter: Document) -> StoreResult<u64>;
}

/// A database handing out collection handles
#[async_trait]
pub trait DocumentDatabase: Send + Sync {
    /// Handle to the named collection
    fn collection(&self, name: &str) -> Arc<dyn DocumentCollection>;

    /// Round-trip to verify the store is reachable
    async fn ping(&self) -> StoreResult<()>;
}

/// Connect to the configured store, retrying with exponential backoff
pub async fn connect(config: &StoreConfig) -> StoreResult<Arc<dyn DocumentDatabase>> {
    if config.is_memory() {
        tracing::info!(url = %config.url, "Using in-memory document store");
        return Ok(Arc::new(MemoryDatabase::new()));
    }

    let mut attempt = 0;
    let base_delay = Duration::from_secs(config.retry_delay_secs);
    let url_safe = sanitize_url(&config.url);

    loop {
        match MongoDatabase::connect(config).await {
            Ok(db) => {
                tracing::info!(
                    url = %url_safe,
                    database = %config.database,
                    attempts = attempt + 1,
                    "Document store connected"
                );
                return Ok(Arc::new(db));
            }
            Err(e) => {
                attempt += 1;

                if attempt > config.max_retries || !e.is_retriable() {
                    tracing::error!(
                        url = %url_safe,
                        "Failed to connect to document store after {} attempts: {}",
                        attempt,
                        e
                    );
                    return Err(e);
                }

                let delay = base_delay.saturating_mul(2_u32.saturating_pow(attempt.saturating_sub(1)));
                tracing::warn!(
                    "Document store connection attempt {} failed: {}. Retrying in {:?}...",
                    attempt,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_memory_store() {
        let config = StoreConfig {
            url: "mem://".to_string(),
            ..StoreConfig::default()
        };
        let db = connect(&config).await.unwrap();
        assert!(db.ping().await.is_ok());
        assert_eq!(db.collection("users").name(), "users");
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::query(StoreOperation::Insert, "duplicate key");
        assert_eq!(err.to_string(), "insert failed: duplicate key");

        let err = StoreError::Timeout {
            operation: StoreOperation::Find,
            after: Duration::from_secs(2),
        };
        assert_eq!(err.to_string(), "find timed out after 2s");
        assert!(err.is_retriable());
        assert!(!StoreError::query(StoreOperation::Connect, "bad scheme").is_retriable());
    }

    #[tokio::test]
    async fn test_connect_does_not_retry_malformed_url() {
        let config = StoreConfig {
            url: "definitely not a store url".to_string(),
            max_retries: 3,
            retry_delay_secs: 60,
            ..StoreConfig::default()
        };

        let result = tokio::time::timeout(Duration::from_secs(5), connect(&config))
            .await
            .expect("malformed url must fail without backoff");
        assert!(matches!(
            result,
            Err(StoreError::Query {
                operation: StoreOperation::Connect,
                ..
            })
        ));
    }
}
