use crate::dispatch::{dispatch, KvMethod};
use crate::error::{ApiError, ErrorResponse};
use crate::models::{KvEvent, KvResponse, Record};
use crate::routes;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::Method,
};
use std::collections::HashMap;

/// /kv handler - Read or store a record depending on the request method
///
/// GET reads the `key` query parameter, POST stores the `{key, value}` JSON
/// body. Every other method is answered with 400. A POST body that is not
/// valid UTF-8 is rejected before it reaches the store.
#[utoipa::path(
    method(get, post),
    path = routes::KV,
    params(
        ("key" = Option<String>, Query, description = "Key to read (GET only)")
    ),
    request_body(
        content = Record,
        description = "Record to store (POST only); an existing record with the same key is overwritten",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "GET: the stored value, any JSON. POST: {\"message\":\"Data stored\"}", body = serde_json::Value),
        (status = 400, description = "Invalid method, missing key or malformed body", body = ErrorResponse),
        (status = 404, description = "Key not found", body = ErrorResponse),
        (status = 500, description = "Storage error", body = ErrorResponse)
    ),
    tag = "kv"
)]
pub async fn kv_handler(
    State(state): State<AppState>,
    method: Method,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> KvResponse {
    let body = match decode_body(body) {
        Ok(body) => body,
        // Only POST reads the body; other methods keep their own outcome
        Err(err) if KvMethod::from(method.as_str()) == KvMethod::Post => {
            return KvResponse::from(err);
        }
        Err(_) => None,
    };

    let event = KvEvent {
        http_method: method.as_str().to_string(),
        query_string_parameters: (!params.is_empty()).then_some(params),
        body,
    };

    dispatch(state.store.as_ref(), &event).await
}

fn decode_body(body: Bytes) -> Result<Option<String>, ApiError> {
    if body.is_empty() {
        return Ok(None);
    }

    String::from_utf8(body.to_vec())
        .map(Some)
        .map_err(|err| ApiError::InvalidBody(format!("body is not valid UTF-8: {}", err)))
}
