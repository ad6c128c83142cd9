use crate::error::ApiError;
use crate::handlers::{get_handler, post_handler};
use crate::models::{KvEvent, KvResponse};
use crate::store::KvStore;

/// Methods the key-value endpoint understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvMethod {
    Get,
    Post,
    Unsupported(String),
}

impl From<&str> for KvMethod {
    fn from(method: &str) -> Self {
        match method {
            "GET" => KvMethod::Get,
            "POST" => KvMethod::Post,
            other => KvMethod::Unsupported(other.to_string()),
        }
    }
}

/// Route an event to the handler matching its method
///
/// Handler results are returned unchanged apart from rendering errors into
/// their response form. Unsupported methods never reach the store.
pub async fn dispatch(store: &dyn KvStore, event: &KvEvent) -> KvResponse {
    let result = match KvMethod::from(event.http_method.as_str()) {
        KvMethod::Get => get_handler(store, event).await,
        KvMethod::Post => post_handler(store, event).await,
        KvMethod::Unsupported(method) => Err(ApiError::InvalidMethod(method)),
    };

    result.unwrap_or_else(KvResponse::from)
}
