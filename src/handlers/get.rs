use crate::error::ApiError;
use crate::models::{KvEvent, KvResponse};
use crate::store::KvStore;
use axum::http::StatusCode;

/// GET handler - Retrieve the value stored under the `key` query parameter
///
/// Responds 200 with the serialized value, 404 when no record exists for the
/// key, 400 when the key is missing or empty and 500 when the store fails.
pub async fn get_handler(store: &dyn KvStore, event: &KvEvent) -> Result<KvResponse, ApiError> {
    let key = event
        .query_param("key")
        .ok_or(ApiError::MissingField("key"))?;
    if key.is_empty() {
        return Err(ApiError::EmptyKey);
    }

    match store.get(key).await? {
        Some(value) => {
            tracing::info!("Successfully retrieved value for key: {}", key);
            Ok(KvResponse::json(StatusCode::OK, &value))
        }
        None => {
            tracing::info!("No value stored for key: {}", key);
            Err(ApiError::KeyNotFound(key.to_string()))
        }
    }
}
