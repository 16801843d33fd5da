//! In-process document store selected by `mem://` URLs
//!
//! Documents are kept in insertion order, which is the natural order `find`
//! returns. Filters support top-level equality only; updates support `$set`.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use mongodb::bson::{oid::ObjectId, Bson, Document};
use tokio::sync::RwLock;

use super::{DocumentCollection, DocumentDatabase, StoreError, StoreOperation, StoreResult};

/// In-memory database holding named collections
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    collections: DashMap<String, Arc<MemoryCollection>>,
}

impl MemoryDatabase {
    /// Create an empty database
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentDatabase for MemoryDatabase {
    fn collection(&self, name: &str) -> Arc<dyn DocumentCollection> {
        let collection = self
            .collections
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryCollection::new(name)))
            .clone();
        collection
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// In-memory collection
#[derive(Debug)]
pub struct MemoryCollection {
    name: String,
    documents: RwLock<Vec<Document>>,
}

impl MemoryCollection {
    /// Create an empty collection
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: RwLock::new(Vec::new()),
        }
    }
}

fn matches(document: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(key, expected)| document.get(key) == Some(expected))
}

fn apply_update(document: &mut Document, update: &Document) -> StoreResult<()> {
    for (operator, fields) in update {
        if operator != "$set" {
            return Err(StoreError::query(
                StoreOperation::Update,
                format!("unsupported update operator '{}'", operator),
            ));
        }
        let Bson::Document(fields) = fields else {
            return Err(StoreError::query(
                StoreOperation::Update,
                "$set expects a document",
            ));
        };
        for (key, value) in fields {
            if key == "_id" {
                return Err(StoreError::query(
                    StoreOperation::Update,
                    "the _id field is immutable",
                ));
            }
            document.insert(key.clone(), value.clone());
        }
    }
    Ok(())
}

#[async_trait]
impl DocumentCollection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find(&self, filter: Document, skip: u64, limit: i64) -> StoreResult<Vec<Document>> {
        let documents = self.documents.read().await;
        let matching = documents
            .iter()
            .filter(|doc| matches(doc, &filter))
            .skip(usize::try_from(skip).unwrap_or(usize::MAX));

        // A negative limit behaves like its absolute value, zero means unbounded
        let found = match limit.unsigned_abs() {
            0 => matching.cloned().collect(),
            n => matching
                .take(usize::try_from(n).unwrap_or(usize::MAX))
                .cloned()
                .collect(),
        };
        Ok(found)
    }

    async fn insert_one(&self, mut document: Document) -> StoreResult<Bson> {
        let id = match document.get("_id") {
            Some(id) => id.clone(),
            None => {
                let id = Bson::ObjectId(ObjectId::new());
                document.insert("_id", id.clone());
                id
            }
        };

        let mut documents = self.documents.write().await;
        if documents.iter().any(|doc| doc.get("_id") == Some(&id)) {
            return Err(StoreError::query(
                StoreOperation::Insert,
                format!("duplicate key _id: {}", id),
            ));
        }
        documents.push(document);
        Ok(id)
    }

    async fn find_one(&self, filter: Document) -> StoreResult<Option<Document>> {
        let documents = self.documents.read().await;
        Ok(documents.iter().find(|doc| matches(doc, &filter)).cloned())
    }

    async fn update_one(&self, filter: Document, update: Document) -> StoreResult<u64> {
        let mut documents = self.documents.write().await;
        match documents.iter_mut().find(|doc| matches(doc, &filter)) {
            Some(document) => {
                apply_update(document, &update)?;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_one(&self, filter: Document) -> StoreResult<u64> {
        let mut documents = self.documents.write().await;
        match documents.iter().position(|doc| matches(doc, &filter)) {
            Some(index) => {
                documents.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }
}
