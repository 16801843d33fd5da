//! MongoDB driver

use std::sync::Arc;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database};

use super::{DocumentCollection, DocumentDatabase, StoreError, StoreOperation, StoreResult};
use crate::config::StoreConfig;

/// Handle to a MongoDB database
#[derive(Debug, Clone)]
pub struct MongoDatabase {
    database: Database,
}

impl MongoDatabase {
    /// Open a client for the configured URL and verify it with a ping
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let mut options = ClientOptions::parse(&config.url)
            .await
            .map_err(|e| StoreError::query(StoreOperation::Connect, e.to_string()))?;
        options.connect_timeout = Some(config.connect_timeout());
        options.server_selection_timeout = Some(config.connect_timeout());
        options.app_name = Some(env!("CARGO_PKG_NAME").to_string());

        let client =
            Client::with_options(options).map_err(|e| StoreError::Connection(e.to_string()))?;
        let db = Self {
            database: client.database(&config.database),
        };

        db.ping()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(db)
    }
}

#[async_trait]
impl DocumentDatabase for MongoDatabase {
    fn collection(&self, name: &str) -> Arc<dyn DocumentCollection> {
        Arc::new(MongoCollection {
            name: name.to_string(),
            inner: self.database.collection::<Document>(name),
        })
    }

    async fn ping(&self) -> StoreResult<()> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(|e| StoreError::query(StoreOperation::Ping, e.to_string()))
    }
}

/// Handle to a MongoDB collection of raw documents
#[derive(Debug, Clone)]
pub struct MongoCollection {
    name: String,
    inner: Collection<Document>,
}

#[async_trait]
impl DocumentCollection for MongoCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find(&self, filter: Document, skip: u64, limit: i64) -> StoreResult<Vec<Document>> {
        let cursor = self
            .inner
            .find(filter)
            .skip(skip)
            .limit(limit)
            .await
            .map_err(|e| StoreError::query(StoreOperation::Find, e.to_string()))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| StoreError::query(StoreOperation::Find, e.to_string()))
    }

    async fn insert_one(&self, document: Document) -> StoreResult<Bson> {
        self.inner
            .insert_one(document)
            .await
            .map(|result| result.inserted_id)
            .map_err(|e| StoreError::query(StoreOperation::Insert, e.to_string()))
    }

    async fn find_one(&self, filter: Document) -> StoreResult<Option<Document>> {
        self.inner
            .find_one(filter)
            .await
            .map_err(|e| StoreError::query(StoreOperation::FindOne, e.to_string()))
    }

    async fn update_one(&self, filter: Document, update: Document) -> StoreResult<u64> {
        self.inner
            .update_one(filter, update)
            .await
            .map(|result| result.matched_count)
            .map_err(|e| StoreError::query(StoreOperation::Update, e.to_string()))
    }

    async fn delete_one(&self, filter: Document) -> StoreResult<u64> {
        self.inner
            .delete_one(filter)
            .await
            .map(|result| result.deleted_count)
            .map_err(|e| StoreError::query(StoreOperation::Delete, e.to_string()))
    }
}
