use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// A key/value pair persisted in the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Record {
    pub key: String,
    pub value: JsonValue,
}

/// Body of a successful write and of routing errors
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Inbound request in proxy-event form
///
/// The `/kv` endpoint builds one of these from the HTTP request; `/invoke`
/// accepts it directly as a JSON document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KvEvent {
    pub http_method: String,
    #[serde(default)]
    pub query_string_parameters: Option<HashMap<String, String>>,
    #[serde(default)]
    pub body: Option<String>,
}

impl KvEvent {
    /// Value of a query string parameter, if one was supplied
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_string_parameters
            .as_ref()
            .and_then(|params| params.get(name))
            .map(String::as_str)
    }
}

/// Outbound response in proxy-event form: a status code and a serialized
/// JSON body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KvResponse {
    pub status_code: u16,
    pub body: String,
}

impl KvResponse {
    /// Serialize `body` as JSON under the given status
    pub fn json<T: Serialize>(status: StatusCode, body: &T) -> Self {
        match serde_json::to_string(body) {
            Ok(body) => Self {
                status_code: status.as_u16(),
                body,
            },
            Err(err) => {
                tracing::error!("Failed to serialize response body: {}", err);
                Self {
                    status_code: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                    body: r#"{"message":"Failed to serialize response body"}"#.to_string(),
                }
            }
        }
    }

    pub fn message(status: StatusCode, message: impl Into<String>) -> Self {
        Self::json(
            status,
            &MessageResponse {
                message: message.into(),
            },
        )
    }
}

impl IntoResponse for KvResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status, [(header::CONTENT_TYPE, "application/json")], self.body).into_response()
    }
}
