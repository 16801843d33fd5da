//! Per-operation deadlines for any collection driver

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::{Bson, Document};

use super::{DocumentCollection, StoreError, StoreOperation, StoreResult};

/// Collection decorator bounding every round-trip with a timeout
///
/// Dropping the returned future cancels the in-flight call, so a client
/// disconnect or the HTTP timeout layer also stops the store operation.
#[derive(Clone)]
pub struct TimedCollection {
    inner: Arc<dyn DocumentCollection>,
    timeout: Duration,
}

impl TimedCollection {
    /// Wrap `inner`, bounding each operation by `timeout`
    pub fn new(inner: Arc<dyn DocumentCollection>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn bounded<T>(
        &self,
        operation: StoreOperation,
        call: impl Future<Output = StoreResult<T>> + Send,
    ) -> StoreResult<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    collection = %self.inner.name(),
                    operation = %operation,
                    timeout = ?self.timeout,
                    "Store operation timed out"
                );
                Err(StoreError::Timeout {
                    operation,
                    after: self.timeout,
                })
            }
        }
    }
}

#[async_trait]
impl DocumentCollection for TimedCollection {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn find(&self, filter: Document, skip: u64, limit: i64) -> StoreResult<Vec<Document>> {
        self.bounded(StoreOperation::Find, self.inner.find(filter, skip, limit))
            .await
    }

    async fn insert_one(&self, document: Document) -> StoreResult<Bson> {
        self.bounded(StoreOperation::Insert, self.inner.insert_one(document))
            .await
    }

    async fn find_one(&self, filter: Document) -> StoreResult<Option<Document>> {
        self.bounded(StoreOperation::FindOne, self.inner.find_one(filter))
            .await
    }

    async fn update_one(&self, filter: Document, update: Document) -> StoreResult<u64> {
        self.bounded(StoreOperation::Update, self.inner.update_one(filter, update))
            .await
    }

    async fn delete_one(&self, filter: Document) -> StoreResult<u64> {
        self.bounded(StoreOperation::Delete, self.inner.delete_one(filter))
            .await
    }
}
