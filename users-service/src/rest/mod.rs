//! HTTP surface: user endpoints, health probes and error rendering

mod error;
pub mod health;
pub mod users;

use axum::http::StatusCode;
use axum::middleware::map_response;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

pub use error::{ApiError, ApiErrorKind, ApiErrorResponse, ApiOperation, DetailedErrorBody};

/// Build the application router
///
/// When `http.collapse_error_status` is set, every failed user request is
/// answered with 400 Bad Request carrying the underlying error message; the
/// body keeps its specific error code.
pub fn router(state: AppState) -> Router {
    let mut api = users::routes();
    if state.config().http.collapse_error_status {
        api = api.layer(map_response(collapse_error_status));
    }

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::readiness))
        .merge(api)
        .with_state(state)
}

async fn collapse_error_status(response: Response) -> Response {
    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    let mut response = match response.extensions().get::<DetailedErrorBody>().cloned() {
        Some(DetailedErrorBody(body)) => Json(body).into_response(),
        None => response,
    };
    *response.status_mut() = StatusCode::BAD_REQUEST;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    use async_trait::async_trait;
    use mongodb::bson::{Bson, Document};

    use crate::config::Config;
    use crate::registry::Registry;
    use crate::service;
    use crate::store::{
        DocumentCollection, DocumentDatabase, MemoryDatabase, StoreError, StoreOperation,
        StoreResult,
    };

    fn app() -> Router {
        let state = service::wire(
            &Registry::new(),
            Config::default(),
            Arc::new(MemoryDatabase::new()),
        )
        .unwrap();
        router(state)
    }

    /// Store whose inserts always hit a duplicate key
    struct DuplicateKeys;

    #[async_trait]
    impl DocumentCollection for DuplicateKeys {
        fn name(&self) -> &str {
            "users"
        }

        async fn find(&self, _: Document, _: u64, _: i64) -> StoreResult<Vec<Document>> {
            Ok(Vec::new())
        }

        async fn insert_one(&self, _: Document) -> StoreResult<Bson> {
            Err(StoreError::query(
                StoreOperation::Insert,
                "E11000 duplicate key error collection: users index: email_1",
            ))
        }

        async fn find_one(&self, _: Document) -> StoreResult<Option<Document>> {
            Ok(None)
        }

        async fn update_one(&self, _: Document, _: Document) -> StoreResult<u64> {
            Ok(0)
        }

        async fn delete_one(&self, _: Document) -> StoreResult<u64> {
            Ok(0)
        }
    }

    #[async_trait]
    impl DocumentDatabase for DuplicateKeys {
        fn collection(&self, _: &str) -> Arc<dyn DocumentCollection> {
            Arc::new(DuplicateKeys)
        }

        async fn ping(&self) -> StoreResult<()> {
            Ok(())
        }
    }

    async fn create_against_failing_store(collapse: bool) -> (StatusCode, serde_json::Value) {
        let mut config = Config::default();
        config.http.collapse_error_status = collapse;
        let state = service::wire(&Registry::new(), config, Arc::new(DuplicateKeys)).unwrap();

        let response = router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/user")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"name": "Alice Example", "email": "alice@example.com", "age": 30}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json(app(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "users-service");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_readiness_pings_store() {
        let (status, body) = get_json(app(), "/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ready"], true);
        assert_eq!(body["dependencies"]["store"]["healthy"], true);
    }

    #[tokio::test]
    async fn test_store_failure_is_hidden_by_default() {
        let (status, body) = create_against_failing_store(false).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "An internal error occurred");
        assert_eq!(body["code"], "INTERNAL_ERROR");
    }

    #[tokio::test]
    async fn test_collapsed_store_failure_carries_message() {
        let (status, body) = create_against_failing_store(true).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("E11000 duplicate key"));
        assert_eq!(body["code"], "INTERNAL_ERROR");
    }

    #[tokio::test]
    async fn test_collapse_leaves_success_untouched() {
        let response = collapse_error_status(
            Response::builder()
                .status(StatusCode::OK)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = collapse_error_status(
            Response::builder()
                .status(StatusCode::GATEWAY_TIMEOUT)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
