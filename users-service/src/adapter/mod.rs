//! Generic request adapter
//!
//! Turns a strongly typed business handler
//!
//! ```text
//! async fn(Context<S>, Req) -> Result<Resp, E>
//! ```
//!
//! into an axum handler. Each request goes through three steps:
//!
//! 1. **bind** path, query and JSON body into `Req`, each field reading only
//!    the source its section names ([`bind`])
//! 2. **validate** `Req` ([`Validate`]); failures never reach the handler
//! 3. **encode** `Resp` as JSON with 200 OK, adding pagination headers when
//!    [`Reply::pagination`] reports one, or render `E`
//!
//! ```rust,ignore
//! Router::new()
//!     .route("/users", get(adapter::handler(list_users)))
//!     .route("/user/{UserId}", get(adapter::handler(get_user)))
//! ```

pub mod bind;
pub mod lenient;
mod validate;

use std::future::Future;

use axum::extract::{Request, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::pagination::{attach_metadata, Pagination};

pub use validate::{FieldError, Validate, ValidationErrors};

/// Header carrying the request id set by the server's request-id layer
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Failure before the handler runs
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    /// The request could not be decoded into the expected shape
    #[error("{0}")]
    Binding(String),

    /// The request decoded but violates a constraint
    #[error("{0}")]
    Validation(ValidationErrors),
}

/// Per-request context handed to typed handlers
#[derive(Debug, Clone)]
pub struct Context<S> {
    /// Shared application state
    pub state: S,
    /// Request id, when the request-id layer assigned one
    pub request_id: Option<String>,
}

/// A typed response body
///
/// List responses override [`Reply::pagination`] so the adapter can echo the
/// effective page and limit as response headers.
pub trait Reply: Serialize {
    /// Pagination applied to produce this response
    fn pagination(&self) -> Option<Pagination> {
        None
    }
}

/// Bind and validate a request
pub async fn extract<Req>(request: Request) -> Result<Req, AdapterError>
where
    Req: DeserializeOwned + Validate,
{
    let bound: Req = bind::bind(request).await?;
    bound
        .validate()
        .map_err(|errors| AdapterError::Validation(errors.into()))?;
    Ok(bound)
}

/// Encode a successful reply
pub fn encode<Resp: Reply>(reply: Resp) -> Response {
    let pagination = reply.pagination();
    let mut response = Json(reply).into_response();
    if let Some(pagination) = pagination {
        attach_metadata(response.headers_mut(), pagination);
    }
    response
}

/// Wrap a typed handler into an axum handler
///
/// Binding and validation failures are converted into the handler's error
/// type `E` and rendered through it, so every failure shares one body shape.
pub fn handler<Req, Resp, E, S, F, Fut>(
    f: F,
) -> impl Fn(State<S>, Request) -> BoxFuture<'static, Response> + Clone + Send + Sync + 'static
where
    Req: DeserializeOwned + Validate + Send + 'static,
    Resp: Reply + Send + 'static,
    E: IntoResponse + From<AdapterError> + Send + 'static,
    S: Clone + Send + Sync + 'static,
    F: Fn(Context<S>, Req) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<Resp, E>> + Send + 'static,
{
    move |State(state): State<S>, request: Request| {
        let f = f.clone();
        Box::pin(async move {
            let request_id = request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);

            let bound = match extract::<Req>(request).await {
                Ok(bound) => bound,
                Err(err) => {
                    tracing::info!(
                        request_id = ?request_id,
                        request_type = std::any::type_name::<Req>(),
                        "Request rejected: {}",
                        err
                    );
                    return E::from(err).into_response();
                }
            };

            let context = Context { state, request_id };
            match f(context, bound).await {
                Ok(reply) => encode(reply),
                Err(err) => err.into_response(),
            }
        })
    }
}
