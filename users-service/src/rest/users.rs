//! User endpoints
//!
//! | Method | Path             | Request                       |
//! |--------|------------------|-------------------------------|
//! | GET    | `/users`         | query `page`, `limit`         |
//! | POST   | `/user`          | body `name`, `email`, `age`   |
//! | GET    | `/user/{UserId}` | path `UserId`                 |
//! | PUT    | `/user/{UserId}` | path `UserId`, body as POST   |
//! | DELETE | `/user/{UserId}` | path `UserId`                 |

use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiOperation};
use crate::adapter::{self, lenient, Context, Reply, Validate};
use crate::entity::User;
use crate::pagination::Pagination;
use crate::state::AppState;

/// `page` and `limit` query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    /// 1-indexed page; zero or absent selects the default
    #[serde(default, deserialize_with = "lenient::u32")]
    pub page: u32,

    /// Page size; zero or absent selects the default
    #[serde(default, deserialize_with = "lenient::u32")]
    pub limit: u32,
}

/// `UserId` path parameter
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UserPath {
    #[serde(rename = "UserId", default)]
    #[validate(length(min = 1, message = "UserId is required"))]
    pub user_id: String,
}

/// Writable user fields, read from the JSON body
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UserFields {
    /// Display name
    #[serde(default)]
    #[validate(length(min = 3, max = 100, message = "name must be between 3 and 100 characters"))]
    pub name: String,

    /// Email address
    #[serde(default)]
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,

    /// Age in years
    #[serde(default, deserialize_with = "lenient::i64")]
    #[validate(range(min = 1, message = "age must be a positive number"))]
    pub age: i64,
}

impl UserFields {
    fn into_user(self, id: String) -> User {
        User {
            id,
            name: self.name,
            email: self.email,
            age: self.age,
            created_at: None,
        }
    }
}

/// `GET /users`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ListUsersRequest {
    #[serde(default)]
    pub query: PageQuery,
}

/// `GET` and `DELETE /user/{UserId}`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UserIdRequest {
    #[serde(default)]
    #[validate(nested)]
    pub path: UserPath,
}

/// `POST /user`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[serde(default)]
    #[validate(nested)]
    pub body: UserFields,
}

/// `PUT /user/{UserId}`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[serde(default)]
    #[validate(nested)]
    pub path: UserPath,

    #[serde(default)]
    #[validate(nested)]
    pub body: UserFields,
}

/// Body of `GET /users`
#[derive(Debug, Clone, Serialize)]
pub struct ListUsersResponse {
    /// Users on this page
    pub data: Vec<User>,

    /// Sent as headers, not in the body
    #[serde(skip)]
    pub pagination: Pagination,
}

impl Reply for ListUsersResponse {
    fn pagination(&self) -> Option<Pagination> {
        Some(self.pagination)
    }
}

/// A single user
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct UserResponse {
    /// The user
    pub user: User,
}

impl Reply for UserResponse {}

/// Confirmation message
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    /// Message text
    pub message: String,
}

impl Reply for MessageResponse {}

/// `GET /users`
pub async fn list_users(
    ctx: Context<AppState>,
    request: ListUsersRequest,
) -> Result<ListUsersResponse, ApiError> {
    let requested = ctx
        .state
        .pagination_defaults()
        .normalize(Pagination::new(request.query.page, request.query.limit));

    let page = ctx
        .state
        .users()
        .get_all(requested)
        .await
        .map_err(|e| ApiError::from(e).with_operation(ApiOperation::List))?;

    tracing::info!(
        request_id = ?ctx.request_id,
        page = page.pagination.page,
        limit = page.pagination.limit,
        returned = page.items.len(),
        "Listed users"
    );
    Ok(ListUsersResponse {
        data: page.items,
        pagination: page.pagination,
    })
}

/// `POST /user`
pub async fn create_user(
    ctx: Context<AppState>,
    request: CreateUserRequest,
) -> Result<UserResponse, ApiError> {
    let user = ctx
        .state
        .users()
        .create(request.body.into_user(String::new()))
        .await
        .map_err(|e| ApiError::from(e).with_operation(ApiOperation::Create))?;

    tracing::info!(request_id = ?ctx.request_id, user_id = %user.id, "Created user");
    Ok(UserResponse { user })
}

/// `GET /user/{UserId}`
pub async fn get_user(
    ctx: Context<AppState>,
    request: UserIdRequest,
) -> Result<UserResponse, ApiError> {
    let user = ctx
        .state
        .users()
        .get_by_id(&request.path.user_id)
        .await
        .map_err(|e| ApiError::from(e).with_operation(ApiOperation::Get))?;

    tracing::info!(request_id = ?ctx.request_id, user_id = %user.id, "Fetched user");
    Ok(UserResponse { user })
}

/// `PUT /user/{UserId}`
pub async fn update_user(
    ctx: Context<AppState>,
    request: UpdateUserRequest,
) -> Result<UserResponse, ApiError> {
    let user = ctx
        .state
        .users()
        .update_by_id(request.body.into_user(request.path.user_id))
        .await
        .map_err(|e| ApiError::from(e).with_operation(ApiOperation::Update))?;

    tracing::info!(request_id = ?ctx.request_id, user_id = %user.id, "Updated user");
    Ok(UserResponse { user })
}

/// `DELETE /user/{UserId}`
pub async fn delete_user(
    ctx: Context<AppState>,
    request: UserIdRequest,
) -> Result<MessageResponse, ApiError> {
    let id = request.path.user_id;
    ctx.state
        .users()
        .delete_by_id(&id)
        .await
        .map_err(|e| ApiError::from(e).with_operation(ApiOperation::Delete))?;

    tracing::info!(request_id = ?ctx.request_id, user_id = %id, "Deleted user");
    Ok(MessageResponse {
        message: format!("success delete {}", id),
    })
}

/// Register the user endpoints
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(adapter::handler(list_users)))
        .route("/user", axum::routing::post(adapter::handler(create_user)))
        .route(
            "/user/{UserId}",
            get(adapter::handler(get_user))
                .put(adapter::handler(update_user))
                .delete(adapter::handler(delete_user)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::registry::Registry;
    use crate::service;
    use crate::store::MemoryDatabase;
    use std::sync::Arc;

    async fn app_with(config: Config) -> Router {
        let registry = Registry::new();
        let state = service::wire(&registry, config, Arc::new(MemoryDatabase::new())).unwrap();
        crate::rest::router(state)
    }

    async fn app() -> Router {
        app_with(Config::default()).await
    }

    struct Exchange {
        status: StatusCode,
        headers: http::HeaderMap,
        body: Value,
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Exchange {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        Exchange {
            status,
            headers,
            body,
        }
    }

    fn alice() -> Value {
        json!({ "name": "Alice Example", "email": "alice@example.com", "age": 30 })
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let app = app().await;

        let created = call(&app, "POST", "/user", Some(alice())).await;
        assert_eq!(created.status, StatusCode::OK);
        let id = created.body["id"].as_str().unwrap().to_string();
        assert_eq!(id.len(), 24);
        assert!(created.body["created_at"].is_string());

        let fetched = call(&app, "GET", &format!("/user/{}", id), None).await;
        assert_eq!(fetched.status, StatusCode::OK);
        assert_eq!(fetched.body["id"], id.as_str());
        assert_eq!(fetched.body["name"], "Alice Example");
        assert_eq!(fetched.body["email"], "alice@example.com");
        assert_eq!(fetched.body["age"], 30);
        assert_eq!(fetched.body["created_at"], created.body["created_at"]);
    }

    #[tokio::test]
    async fn test_list_second_page_of_twelve() {
        let app = app().await;
        for n in 1..=12 {
            let body = json!({
                "name": format!("User {:02}", n),
                "email": format!("user{}@example.com", n),
                "age": 20 + n,
            });
            assert_eq!(call(&app, "POST", "/user", Some(body)).await.status, StatusCode::OK);
        }

        let listed = call(&app, "GET", "/users?page=2&limit=5", None).await;
        assert_eq!(listed.status, StatusCode::OK);
        assert_eq!(listed.headers.get("x-pagination-page").unwrap(), "2");
        assert_eq!(listed.headers.get("x-pagination-limit").unwrap(), "5");

        let names: Vec<_> = listed.body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["User 06", "User 07", "User 08", "User 09", "User 10"]);
    }

    #[tokio::test]
    async fn test_list_defaults_and_empty_page() {
        let app = app().await;
        call(&app, "POST", "/user", Some(alice())).await;

        let listed = call(&app, "GET", "/users", None).await;
        assert_eq!(listed.headers.get("x-pagination-page").unwrap(), "1");
        assert_eq!(listed.headers.get("x-pagination-limit").unwrap(), "10");
        assert_eq!(listed.body["data"].as_array().unwrap().len(), 1);

        let past_end = call(&app, "GET", "/users?page=9&limit=10", None).await;
        assert_eq!(past_end.status, StatusCode::OK);
        assert_eq!(past_end.body, json!({ "data": [] }));
    }

    #[tokio::test]
    async fn test_update_keeps_identity() {
        let app = app().await;
        let created = call(&app, "POST", "/user", Some(alice())).await.body;
        let id = created["id"].as_str().unwrap();

        let updated = call(
            &app,
            "PUT",
            &format!("/user/{}", id),
            Some(json!({ "name": "Alicia", "email": "alicia@example.com", "age": 31 })),
        )
        .await;

        assert_eq!(updated.status, StatusCode::OK);
        assert_eq!(updated.body["id"], created["id"]);
        assert_eq!(updated.body["created_at"], created["created_at"]);
        assert_eq!(updated.body["name"], "Alicia");
        assert_eq!(updated.body["age"], 31);
    }

    #[tokio::test]
    async fn test_fields_bind_only_from_body() {
        let app = app().await;

        let created = call(&app, "POST", "/user?name=Mallory&age=99", Some(alice())).await;
        assert_eq!(created.status, StatusCode::OK);
        assert_eq!(created.body["name"], "Alice Example");
        assert_eq!(created.body["age"], 30);

        let id = created.body["id"].as_str().unwrap();
        let updated = call(
            &app,
            "PUT",
            &format!("/user/{}?name=Mallory&email=mallory@example.com", id),
            Some(json!({ "name": "Alicia", "email": "alicia@example.com", "age": 31 })),
        )
        .await;
        assert_eq!(updated.status, StatusCode::OK);
        assert_eq!(updated.body["name"], "Alicia");
        assert_eq!(updated.body["email"], "alicia@example.com");
    }

    #[tokio::test]
    async fn test_body_cannot_choose_the_updated_user() {
        let app = app().await;
        let first = call(&app, "POST", "/user", Some(alice())).await.body;
        let second = call(
            &app,
            "POST",
            "/user",
            Some(json!({ "name": "Bob Example", "email": "bob@example.com", "age": 40 })),
        )
        .await
        .body;

        let mut body = json!({ "name": "Robert", "email": "robert@example.com", "age": 41 });
        body["UserId"] = first["id"].clone();
        let updated = call(&app, "PUT", &format!("/user/{}", second["id"].as_str().unwrap()), Some(body)).await;
        assert_eq!(updated.body["id"], second["id"]);

        let untouched = call(&app, "GET", &format!("/user/{}", first["id"].as_str().unwrap()), None).await;
        assert_eq!(untouched.body["name"], "Alice Example");
    }

    #[tokio::test]
    async fn test_padded_id_is_rejected() {
        let app = app().await;
        let created = call(&app, "POST", "/user", Some(alice())).await.body;
        let id = created["id"].as_str().unwrap();

        let deleted = call(&app, "DELETE", &format!("/user/%20{}%20", id), None).await;
        assert_eq!(deleted.status, StatusCode::BAD_REQUEST);
        assert_eq!(deleted.body["code"], "INVALID_ID");

        let fetched = call(&app, "GET", &format!("/user/{}", id), None).await;
        assert_eq!(fetched.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_user() {
        let app = app().await;
        let missing = "65f1c0a2b3d4e5f607182930";

        let updated = call(&app, "PUT", &format!("/user/{}", missing), Some(alice())).await;
        assert_eq!(updated.status, StatusCode::NOT_FOUND);
        assert_eq!(updated.body["code"], "NOT_FOUND");

        let deleted = call(&app, "DELETE", &format!("/user/{}", missing), None).await;
        assert_eq!(deleted.status, StatusCode::NOT_FOUND);
        assert_eq!(
            deleted.body["error"],
            format!("no document with id {} was found", missing)
        );
    }

    #[tokio::test]
    async fn test_delete() {
        let app = app().await;
        let created = call(&app, "POST", "/user", Some(alice())).await.body;
        let id = created["id"].as_str().unwrap();

        let deleted = call(&app, "DELETE", &format!("/user/{}", id), None).await;
        assert_eq!(deleted.status, StatusCode::OK);
        assert_eq!(deleted.body, json!({ "message": format!("success delete {}", id) }));

        let fetched = call(&app, "GET", &format!("/user/{}", id), None).await;
        assert_eq!(fetched.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_id_is_not_not_found() {
        let app = app().await;
        let fetched = call(&app, "GET", "/user/not-a-valid-id", None).await;
        assert_eq!(fetched.status, StatusCode::BAD_REQUEST);
        assert_eq!(fetched.body["code"], "INVALID_ID");
    }

    #[tokio::test]
    async fn test_binding_vs_validation() {
        let app = app().await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/user")
                    .header("content-type", "application/json")
                    .body(Body::from("{\"name\": "))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let invalid = call(
            &app,
            "POST",
            "/user",
            Some(json!({ "name": "Al", "email": "not-an-email", "age": 30 })),
        )
        .await;
        assert_eq!(invalid.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(invalid.body["code"], "VALIDATION_FAILED");

        let listed = call(&app, "GET", "/users", None).await;
        assert_eq!(listed.body["data"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_collapsed_error_status() {
        let mut config = Config::default();
        config.http.collapse_error_status = true;
        let app = app_with(config).await;

        let fetched = call(&app, "GET", "/user/65f1c0a2b3d4e5f607182930", None).await;
        assert_eq!(fetched.status, StatusCode::BAD_REQUEST);
        assert_eq!(fetched.body["code"], "NOT_FOUND");
    }
}
