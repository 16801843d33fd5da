//! # users-service
//!
//! User CRUD over HTTP/JSON backed by a document store.
//!
//! The service is assembled from a few generic pieces:
//!
//! - **Component registry** ([`registry`]): components are registered by name
//!   and interface at startup, the registry is sealed, and consumers resolve
//!   them without naming concrete types
//! - **Request adapter** ([`adapter`]): typed handlers
//!   `async fn(Context<S>, Req) -> Result<Resp, E>` become axum handlers with
//!   binding, validation and JSON encoding done for them
//! - **Pagination** ([`pagination`]): `page`/`limit` normalization, skip
//!   computation and `x-pagination-*` response headers
//! - **CRUD usecase** ([`usecase`]): generic document CRUD and the `users`
//!   component built on it
//!
//! ## Example
//!
//! ```rust,no_run
//! use users_service::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     users_service::service::run(config).await
//! }
//! ```

pub mod adapter;
pub mod adapters;
pub mod config;
pub mod entity;
pub mod error;
pub mod ids;
pub mod observability;
pub mod pagination;
pub mod registry;
pub mod rest;
pub mod server;
pub mod service;
pub mod state;
pub mod store;
pub mod usecase;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapter::{handler, Context, Reply, Validate, ValidationErrors};
    pub use crate::adapters::Adapter;
    pub use crate::config::Config;
    pub use crate::entity::{Record, User};
    pub use crate::error::{Error, Result};
    pub use crate::ids::{MakeTypedRequestId, RecordId, RequestId};
    pub use crate::observability::init_tracing;
    pub use crate::pagination::{Page, Pagination, PaginationDefaults};
    pub use crate::registry::{Component, Registry, RegistryError};
    pub use crate::rest::{ApiError, ApiErrorKind};
    pub use crate::server::Server;
    pub use crate::state::AppState;
    pub use crate::store::{DocumentCollection, DocumentDatabase, StoreError};
    pub use crate::usecase::{DocumentCrud, UsecaseError, UsersComponent, UsersUsecase};

    pub use axum::{routing::get, Router};
}
