//! API error types for handler operations
//!
//! Every failure reaching the HTTP surface is an [`ApiError`]. It maps to a
//! status code by kind and renders as `{"error": <message>, "code": <CODE>}`.
//!
//! # Example
//!
//! ```rust
//! use users_service::rest::{ApiError, ApiErrorKind};
//! use users_service::usecase::UsecaseError;
//!
//! let error = ApiError::from(UsecaseError::NotFound("no document with id 1 was found".into()));
//! assert_eq!(error.kind, ApiErrorKind::NotFound);
//! assert_eq!(error.kind.error_code(), "NOT_FOUND");
//! ```

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::adapter::AdapterError;
use crate::store::StoreError;
use crate::usecase::UsecaseError;

/// Operation being performed when the API error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    /// Binding or validating the request, before any handler ran
    Request,
    /// Listing entities
    List,
    /// Getting a single entity by ID
    Get,
    /// Creating a new entity
    Create,
    /// Updating an existing entity
    Update,
    /// Deleting an entity
    Delete,
}

impl fmt::Display for ApiOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request => write!(f, "request"),
            Self::List => write!(f, "list"),
            Self::Get => write!(f, "get"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Category of API error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// Malformed request
    BadRequest,
    /// Identifier is not a valid store id
    InvalidId,
    /// Request validation failed
    ValidationFailed,
    /// Entity was not found
    NotFound,
    /// Internal server error
    InternalError,
    /// The document store is unreachable
    ServiceUnavailable,
    /// The document store did not answer in time
    Timeout,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest => write!(f, "bad_request"),
            Self::InvalidId => write!(f, "invalid_id"),
            Self::ValidationFailed => write!(f, "validation_failed"),
            Self::NotFound => write!(f, "not_found"),
            Self::InternalError => write!(f, "internal_error"),
            Self::ServiceUnavailable => write!(f, "service_unavailable"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

impl ApiErrorKind {
    /// Get the HTTP status code for this error kind
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest | Self::InvalidId => StatusCode::BAD_REQUEST,
            Self::ValidationFailed => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Get the error code string for this error kind
    #[must_use]
    pub fn error_code(&self) -> String {
        format!("{}", self).to_uppercase()
    }
}

/// Structured API error with operation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// The operation being performed when the error occurred
    pub operation: ApiOperation,
    /// The category of error
    pub kind: ApiErrorKind,
    /// Client-facing message
    pub message: String,
    /// Internal detail, logged but never sent to the client
    pub detail: Option<String>,
}

impl ApiError {
    /// Create a new API error
    pub fn new(operation: ApiOperation, kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            detail: None,
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ApiOperation::Request, ApiErrorKind::BadRequest, message)
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ApiOperation::Request, ApiErrorKind::InternalError, message)
    }

    /// Set the operation that caused the error
    #[must_use]
    pub fn with_operation(mut self, operation: ApiOperation) -> Self {
        self.operation = operation;
        self
    }

    /// Check if this error is retriable
    pub fn is_retriable(&self) -> bool {
        matches!(
            self.kind,
            ApiErrorKind::ServiceUnavailable | ApiErrorKind::Timeout
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "API {} error during {}: {}",
            self.kind, self.operation, self.message
        )
    }
}

impl std::error::Error for ApiError {}

/// Response body for API errors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Client-facing message
    pub error: String,
    /// Upper-case error code
    pub code: String,
}

/// Error body carrying the internal detail in place of the client message
///
/// Attached as a response extension when the error has a detail; it is never
/// written to the wire unless a later layer chooses to render it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailedErrorBody(pub ApiErrorResponse);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.kind.status_code();

        if status.is_server_error() {
            tracing::error!(
                operation = %self.operation,
                kind = %self.kind,
                detail = ?self.detail,
                retriable = self.is_retriable(),
                "API error: {}", self.message
            );
        } else {
            tracing::info!(
                operation = %self.operation,
                kind = %self.kind,
                "API error: {}", self.message
            );
        }

        let code = self.kind.error_code();
        let detailed = self.detail.map(|detail| {
            DetailedErrorBody(ApiErrorResponse {
                error: detail,
                code: code.clone(),
            })
        });
        let body = ApiErrorResponse {
            error: self.message,
            code,
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(detailed) = detailed {
            response.extensions_mut().insert(detailed);
        }
        response
    }
}

impl From<AdapterError> for ApiError {
    fn from(err: AdapterError) -> Self {
        let kind = match err {
            AdapterError::Binding(_) => ApiErrorKind::BadRequest,
            AdapterError::Validation(_) => ApiErrorKind::ValidationFailed,
        };
        Self::new(ApiOperation::Request, kind, err.to_string())
    }
}

impl From<UsecaseError> for ApiError {
    fn from(err: UsecaseError) -> Self {
        let (kind, message) = match &err {
            UsecaseError::InvalidId(_) => (ApiErrorKind::InvalidId, err.to_string()),
            UsecaseError::NotFound(_) => (ApiErrorKind::NotFound, err.to_string()),
            UsecaseError::Validation(_) => (ApiErrorKind::ValidationFailed, err.to_string()),
            UsecaseError::Store(StoreError::Timeout { .. }) => (
                ApiErrorKind::Timeout,
                "The document store did not respond in time".to_string(),
            ),
            UsecaseError::Store(StoreError::Connection(_)) => (
                ApiErrorKind::ServiceUnavailable,
                "Service temporarily unavailable".to_string(),
            ),
            UsecaseError::Store(_) | UsecaseError::NotInitialized(_) => (
                ApiErrorKind::InternalError,
                "An internal error occurred".to_string(),
            ),
        };

        let detail = kind.status_code().is_server_error().then(|| err.to_string());
        Self {
            operation: ApiOperation::Request,
            kind,
            message,
            detail,
        }
    }
}
