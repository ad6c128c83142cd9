use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::models::KvResponse;

/// Error response type
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

/// Response type for health check endpoint
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Response type for unhealthy status
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct UnhealthyResponse {
    pub status: String,
    pub error: String,
}

/// Custom error type for the key-value handlers
///
/// Each variant maps to a status code and an `ErrorResponse` body once
/// rendered into a `KvResponse`.
#[derive(Debug)]
pub enum ApiError {
    /// Method other than GET or POST
    InvalidMethod(String),
    /// POST body missing or not a JSON object
    InvalidBody(String),
    /// Required request field absent
    MissingField(&'static str),
    /// Key present but empty
    EmptyKey,
    /// Key not found in the store
    KeyNotFound(String),
    /// Storage operation error
    StorageError(anyhow::Error),
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::InvalidMethod(method) => {
                tracing::debug!("Unsupported method: {:?}", method);
                (
                    StatusCode::BAD_REQUEST,
                    "Invalid request method".to_string(),
                )
            }
            ApiError::InvalidBody(detail) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid request body: {}", detail),
            ),
            ApiError::MissingField(field) => (
                StatusCode::BAD_REQUEST,
                format!("Missing required field: {}", field),
            ),
            ApiError::EmptyKey => (
                StatusCode::BAD_REQUEST,
                "Key must be a non-empty string".to_string(),
            ),
            ApiError::KeyNotFound(key) => {
                (StatusCode::NOT_FOUND, format!("Key not found: {}", key))
            }
            ApiError::StorageError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Storage error: {:#}", err),
            ),
        }
    }
}

impl From<ApiError> for KvResponse {
    fn from(err: ApiError) -> Self {
        let (status, message) = err.status_and_message();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", message);
        } else {
            tracing::warn!("Request rejected: {}", message);
        }

        KvResponse::json(status, &ErrorResponse { message })
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::StorageError(err)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::InvalidBody(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_of(err: ApiError) -> (u16, ErrorResponse) {
        let response = KvResponse::from(err);
        let body: ErrorResponse = serde_json::from_str(&response.body).unwrap();
        (response.status_code, body)
    }

    #[test]
    fn test_invalid_method_message_is_fixed() {
        let response = KvResponse::from(ApiError::InvalidMethod("DELETE".to_string()));

        assert_eq!(response.status_code, 400);
        assert_eq!(response.body, r#"{"message":"Invalid request method"}"#);
    }

    #[test]
    fn test_key_not_found_is_404() {
        let (status, body) = body_of(ApiError::KeyNotFound("abc".to_string()));

        assert_eq!(status, 404);
        assert!(body.message.contains("abc"));
    }

    #[test]
    fn test_storage_error_keeps_context_chain() {
        let err = anyhow::anyhow!("connection refused").context("Failed to read from Spanner");
        let (status, body) = body_of(ApiError::from(err));

        assert_eq!(status, 500);
        assert!(body.message.contains("Failed to read from Spanner"));
        assert!(body.message.contains("connection refused"));
    }

    #[test]
    fn test_json_error_maps_to_invalid_body() {
        let err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let (status, body) = body_of(ApiError::from(err));

        assert_eq!(status, 400);
        assert!(body.message.starts_with("Invalid request body"));
    }
}
