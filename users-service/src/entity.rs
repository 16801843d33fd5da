//! Domain records and their store representation

use chrono::{DateTime, Utc};
use mongodb::bson::{self, doc, oid::ObjectId, Document};
use serde::{Deserialize, Serialize};

use crate::adapter::Validate;
use crate::store::StoreError;

/// A record persisted as a document
///
/// The store owns the identifier and the creation timestamp; both are
/// assigned on insert and never change afterwards.
pub trait Record: Validate + Send + Sync + Sized + 'static {
    /// Document form used on insert; must not carry an `_id`
    fn to_document(&self) -> Result<Document, StoreError>;

    /// Decode a stored document
    fn from_document(document: Document) -> Result<Self, StoreError>;

    /// Fields an update may change, as the body of a `$set`
    fn mutable_fields(&self) -> Result<Document, StoreError>;

    /// Assign the creation timestamp before insert
    fn stamp_created(&mut self, at: DateTime<Utc>);
}

/// A user of the system
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct User {
    /// Store-assigned id, hex `ObjectId`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// Display name, 3 to 100 characters
    #[serde(default, skip_serializing_if = "String::is_empty")]
    #[validate(length(min = 3, max = 100, message = "name must be between 3 and 100 characters"))]
    pub name: String,

    /// Email address
    #[serde(default, skip_serializing_if = "String::is_empty")]
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,

    /// Age in years
    #[serde(default, skip_serializing_if = "is_zero")]
    #[validate(range(min = 1, message = "age must be a positive number"))]
    pub age: i64,

    /// Server-assigned creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

fn is_zero(n: &i64) -> bool {
    *n == 0
}

#[derive(Debug, Serialize, Deserialize)]
struct UserDocument {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    age: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<bson::DateTime>,
}

impl From<&User> for UserDocument {
    fn from(user: &User) -> Self {
        Self {
            id: None,
            name: user.name.clone(),
            email: user.email.clone(),
            age: user.age,
            created_at: user
                .created_at
                .map(|at| bson::DateTime::from_millis(at.timestamp_millis())),
        }
    }
}

impl From<UserDocument> for User {
    fn from(document: UserDocument) -> Self {
        Self {
            id: document.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: document.name,
            email: document.email,
            age: document.age,
            created_at: document
                .created_at
                .and_then(|at| DateTime::from_timestamp_millis(at.timestamp_millis())),
        }
    }
}

impl Record for User {
    fn to_document(&self) -> Result<Document, StoreError> {
        bson::to_document(&UserDocument::from(self))
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn from_document(document: Document) -> Result<Self, StoreError> {
        bson::from_document::<UserDocument>(document)
            .map(User::from)
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn mutable_fields(&self) -> Result<Document, StoreError> {
        Ok(doc! {
            "name": self.name.clone(),
            "email": self.email.clone(),
            "age": self.age,
        })
    }

    fn stamp_created(&mut self, at: DateTime<Utc>) {
        self.created_at = Some(at);
    }
}
