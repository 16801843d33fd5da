//! Request binding
//!
//! Path parameters, query parameters and the JSON body are collected into
//! separate sections of one JSON object:
//!
//! ```text
//! { "path": {..}, "query": {..}, "body": {..} }
//! ```
//!
//! The request type picks its sources by declaring fields named after the
//! sections, so a value can only ever bind from the source its field names:
//!
//! ```rust,ignore
//! #[derive(Deserialize, Validate)]
//! struct UpdateUserRequest {
//!     #[serde(default)]
//!     path: UserPath,
//!     #[serde(default)]
//!     #[validate(nested)]
//!     body: UserFields,
//! }
//! ```
//!
//! Sections a type does not declare are ignored.

use axum::body::{to_bytes, Body};
use axum::extract::rejection::RawPathParamsRejection;
use axum::extract::{FromRequestParts, Query, RawPathParams, Request};
use http::header::CONTENT_TYPE;
use http::request::Parts;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::AdapterError;

/// Bind a request into `T`
pub async fn bind<T: DeserializeOwned>(request: Request) -> Result<T, AdapterError> {
    let value = collect(request).await?;
    decode(value)
}

/// Section holding path parameters
pub const PATH: &str = "path";
/// Section holding query parameters
pub const QUERY: &str = "query";
/// Section holding the JSON body
pub const BODY: &str = "body";

/// Collect path, query and body into their own sections
pub async fn collect(request: Request) -> Result<Value, AdapterError> {
    let (mut parts, body) = request.into_parts();

    let body = body_fields(&parts, body).await?;
    let query = query_fields(&parts)?;
    let path = path_fields(&mut parts).await?;

    let mut sections = Map::new();
    sections.insert(PATH.to_string(), Value::Object(path));
    sections.insert(QUERY.to_string(), Value::Object(query));
    sections.insert(BODY.to_string(), Value::Object(body));
    Ok(Value::Object(sections))
}

/// Deserialize collected sections into `T`
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, AdapterError> {
    serde_json::from_value(value).map_err(|e| AdapterError::Binding(e.to_string()))
}

async fn body_fields(parts: &Parts, body: Body) -> Result<Map<String, Value>, AdapterError> {
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|e| AdapterError::Binding(format!("failed to read request body: {}", e)))?;

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    if !is_json_content_type(parts) {
        return Err(AdapterError::Binding(
            "expected request with `Content-Type: application/json`".to_string(),
        ));
    }

    match serde_json::from_slice(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Ok(Map::new()),
        Ok(_) => Err(AdapterError::Binding(
            "request body must be a JSON object".to_string(),
        )),
        Err(e) => Err(AdapterError::Binding(format!("malformed JSON body: {}", e))),
    }
}

fn query_fields(parts: &Parts) -> Result<Map<String, Value>, AdapterError> {
    let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
        .map_err(|rejection| AdapterError::Binding(rejection.body_text()))?;

    Ok(pairs
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect())
}

async fn path_fields(parts: &mut Parts) -> Result<Map<String, Value>, AdapterError> {
    match RawPathParams::from_request_parts(parts, &()).await {
        Ok(params) => Ok(params
            .iter()
            .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
            .collect()),
        Err(RawPathParamsRejection::MissingPathParams(_)) => Ok(Map::new()),
        Err(rejection) => Err(AdapterError::Binding(rejection.body_text())),
    }
}

fn is_json_content_type(parts: &Parts) -> bool {
    let Some(content_type) = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };

    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || (essence.starts_with("application/") && essence.ends_with("+json"))
}
