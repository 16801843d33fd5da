//! Identifiers: store-native record ids and per-request tracing ids
//!
//! # Record ids
//!
//! Records are addressed at the API boundary by the 24-character hex form of
//! their BSON `ObjectId`. [`RecordId::parse`] is the single translation point
//! from that string form into the store-native representation:
//!
//! ```rust
//! use users_service::ids::RecordId;
//!
//! let id = RecordId::parse("65f1c0a2b3d4e5f607182930").unwrap();
//! assert_eq!(id.to_string(), "65f1c0a2b3d4e5f607182930");
//! assert!(RecordId::parse("not-a-valid-id").is_err());
//! ```
//!
//! # Request ids
//!
//! Request ids use the TypeID format with a `req` prefix and a UUIDv7 suffix,
//! e.g. `req_01h455vb4pex5vsknk084sn02q`, so they sort by arrival time.

use std::fmt;

use http::Request;
use mongodb::bson::{oid::ObjectId, Bson};
use mti::prelude::*;
use tower_http::request_id::{MakeRequestId, RequestId as TowerRequestId};

/// Store-native identifier of a persisted record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(ObjectId);

impl RecordId {
    /// Parse the API string form into the store-native id
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRecordId`] when the input is not a 24-character hex string.
    pub fn parse(raw: &str) -> Result<Self, InvalidRecordId> {
        ObjectId::parse_str(raw)
            .map(Self)
            .map_err(|_| InvalidRecordId(raw.to_string()))
    }

    /// Generate a fresh id
    #[must_use]
    pub fn generate() -> Self {
        Self(ObjectId::new())
    }

}

impl From<RecordId> for Bson {
    fn from(id: RecordId) -> Self {
        Bson::ObjectId(id.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

/// The given string is not a valid record identifier
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid id '{0}': expected a 24 character hex object id")]
pub struct InvalidRecordId(pub String);

/// A type-safe request identifier for log correlation
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(MagicTypeId);

impl RequestId {
    /// The prefix used for request IDs
    pub const PREFIX: &'static str = "req";

    /// Creates a new time-sortable request ID
    #[must_use]
    pub fn new() -> Self {
        Self(Self::PREFIX.create_type_id::<V7>())
    }

    /// Returns the request ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `MakeRequestId` implementation for `tower_http::request_id::SetRequestIdLayer`
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeTypedRequestId;

impl MakeRequestId for MakeTypedRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<TowerRequestId> {
        let id = RequestId::new();
        let header_value = http::HeaderValue::from_str(id.as_str()).ok()?;
        Some(TowerRequestId::new(header_value))
    }
}
