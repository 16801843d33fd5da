//! Entity-agnostic document CRUD

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;
use mongodb::bson::{doc, Document};

use super::UsecaseError;
use crate::entity::Record;
use crate::ids::RecordId;
use crate::pagination::{Page, Pagination, PaginationDefaults};
use crate::store::{DocumentCollection, StoreError, StoreOperation};

/// CRUD operations for records of type `R` stored in one collection
///
/// Every read goes to the store; nothing is cached between calls.
pub struct DocumentCrud<R> {
    collection: Arc<dyn DocumentCollection>,
    defaults: PaginationDefaults,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for DocumentCrud<R> {
    fn clone(&self) -> Self {
        Self {
            collection: Arc::clone(&self.collection),
            defaults: self.defaults,
            _record: PhantomData,
        }
    }
}

fn by_id(id: RecordId) -> Document {
    doc! { "_id": id }
}

fn not_found(id: RecordId) -> UsecaseError {
    UsecaseError::NotFound(format!("no document with id {} was found", id))
}

impl<R: Record> DocumentCrud<R> {
    /// CRUD over `collection` with default pagination
    pub fn new(collection: Arc<dyn DocumentCollection>) -> Self {
        Self::with_defaults(collection, PaginationDefaults::default())
    }

    /// CRUD over `collection` with explicit pagination defaults
    pub fn with_defaults(collection: Arc<dyn DocumentCollection>, defaults: PaginationDefaults) -> Self {
        Self {
            collection,
            defaults,
            _record: PhantomData,
        }
    }

    /// One page of records in store order
    ///
    /// A page past the end of the collection is empty, not an error.
    pub async fn list(&self, requested: Pagination) -> Result<Page<R>, UsecaseError> {
        let pagination = self.defaults.normalize(requested);
        let documents = self
            .collection
            .find(Document::new(), pagination.skip(), i64::from(pagination.limit))
            .await?;

        let items = documents
            .into_iter()
            .map(R::from_document)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            collection = %self.collection.name(),
            page = pagination.page,
            limit = pagination.limit,
            returned = items.len(),
            "Listed records"
        );
        Ok(Page { items, pagination })
    }

    /// Insert a record and return it as stored
    pub async fn create(&self, mut record: R) -> Result<R, UsecaseError> {
        record
            .validate()
            .map_err(|errors| UsecaseError::Validation(errors.into()))?;
        record.stamp_created(Utc::now());

        let inserted_id = self.collection.insert_one(record.to_document()?).await?;
        let stored = self
            .collection
            .find_one(doc! { "_id": inserted_id.clone() })
            .await?
            .ok_or_else(|| {
                StoreError::query(
                    StoreOperation::FindOne,
                    format!("inserted document {} could not be read back", inserted_id),
                )
            })?;

        tracing::debug!(collection = %self.collection.name(), id = %inserted_id, "Created record");
        Ok(R::from_document(stored)?)
    }

    /// The record with the given id
    pub async fn get_by_id(&self, id: &str) -> Result<R, UsecaseError> {
        let id = RecordId::parse(id)?;
        self.require(id).await
    }

    /// Replace the mutable fields of an existing record
    ///
    /// The id and creation timestamp never change.
    pub async fn update_by_id(&self, id: &str, record: &R) -> Result<R, UsecaseError> {
        let id = RecordId::parse(id)?;
        record
            .validate()
            .map_err(|errors| UsecaseError::Validation(errors.into()))?;
        self.require(id).await?;

        let matched = self
            .collection
            .update_one(by_id(id), doc! { "$set": record.mutable_fields()? })
            .await?;
        // Deleted between the existence check and the update
        if matched == 0 {
            return Err(not_found(id));
        }

        tracing::debug!(collection = %self.collection.name(), id = %id, "Updated record");
        self.require(id).await
    }

    /// Delete an existing record
    pub async fn delete_by_id(&self, id: &str) -> Result<(), UsecaseError> {
        let id = RecordId::parse(id)?;
        self.require(id).await?;

        let deleted = self.collection.delete_one(by_id(id)).await?;
        if deleted == 0 {
            return Err(not_found(id));
        }

        tracing::debug!(collection = %self.collection.name(), id = %id, "Deleted record");
        Ok(())
    }

    async fn require(&self, id: RecordId) -> Result<R, UsecaseError> {
        match self.collection.find_one(by_id(id)).await? {
            Some(document) => Ok(R::from_document(document)?),
            None => Err(not_found(id)),
        }
    }
}
