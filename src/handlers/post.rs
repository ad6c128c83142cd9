use crate::error::ApiError;
use crate::models::{KvEvent, KvResponse, Record};
use crate::store::KvStore;
use axum::http::StatusCode;
use serde_json::Value as JsonValue;

/// POST handler - Store the `{key, value}` pair carried in the request body
///
/// Any existing record for the key is overwritten. Nothing is written when
/// the body fails to parse.
pub async fn post_handler(store: &dyn KvStore, event: &KvEvent) -> Result<KvResponse, ApiError> {
    let record = parse_record(event.body.as_deref())?;
    let key = record.key.clone();

    store.put(record).await?;

    tracing::info!("Successfully stored value for key: {}", key);
    Ok(KvResponse::message(StatusCode::OK, "Data stored"))
}

/// Parse a request body into a `Record`
///
/// `key` must be a non-empty string. `value` may be any JSON, `null`
/// included, but the field itself must be present.
fn parse_record(body: Option<&str>) -> Result<Record, ApiError> {
    let body = body.ok_or_else(|| ApiError::InvalidBody("request body is empty".to_string()))?;

    let JsonValue::Object(mut fields) = serde_json::from_str::<JsonValue>(body)? else {
        return Err(ApiError::InvalidBody("expected a JSON object".to_string()));
    };

    let key = match fields.remove("key") {
        Some(JsonValue::String(key)) => key,
        Some(_) => return Err(ApiError::InvalidBody("`key` must be a string".to_string())),
        None => return Err(ApiError::MissingField("key")),
    };
    if key.is_empty() {
        return Err(ApiError::EmptyKey);
    }

    let value = fields.remove("value").ok_or(ApiError::MissingField("value"))?;

    Ok(Record { key, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorResponse;
    use crate::store::testing::{FailingStore, RecordingStore};
    use crate::store::MemoryStore;
    use serde_json::json;

    fn post_event(body: Option<&str>) -> KvEvent {
        KvEvent {
            http_method: "POST".to_string(),
            query_string_parameters: None,
            body: body.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_post_stores_value() {
        let store = MemoryStore::new();

        let response = post_handler(&store, &post_event(Some(r#"{"key":"x","value":42}"#)))
            .await
            .unwrap();

        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, r#"{"message":"Data stored"}"#);
        assert_eq!(store.get("x").await.unwrap(), Some(json!(42)));
    }

    #[tokio::test]
    async fn test_post_overwrites_existing_record() {
        let store = MemoryStore::new();

        post_handler(&store, &post_event(Some(r#"{"key":"a","value":{"first":1}}"#)))
            .await
            .unwrap();
        post_handler(&store, &post_event(Some(r#"{"key":"a","value":{"second":2}}"#)))
            .await
            .unwrap();

        assert_eq!(store.get("a").await.unwrap(), Some(json!({"second": 2})));
    }

    #[tokio::test]
    async fn test_post_accepts_explicit_null_value() {
        let store = MemoryStore::new();

        post_handler(&store, &post_event(Some(r#"{"key":"n","value":null}"#)))
            .await
            .unwrap();

        assert_eq!(store.get("n").await.unwrap(), Some(JsonValue::Null));
    }

    #[tokio::test]
    async fn test_post_invalid_json_writes_nothing() {
        let store = RecordingStore::default();

        let err = post_handler(&store, &post_event(Some("{invalid json}")))
            .await
            .unwrap_err();
        let response = KvResponse::from(err);

        assert_eq!(response.status_code, 400);
        let body: ErrorResponse = serde_json::from_str(&response.body).unwrap();
        assert!(body.message.starts_with("Invalid request body"));
        assert_eq!(store.puts(), 0);
    }

    #[tokio::test]
    async fn test_post_without_body() {
        let store = RecordingStore::default();

        let err = post_handler(&store, &post_event(None)).await.unwrap_err();

        assert!(matches!(err, ApiError::InvalidBody(_)));
        assert_eq!(store.puts(), 0);
    }

    #[test]
    fn test_parse_record_rejects_non_object() {
        assert!(matches!(parse_record(Some("[1,2]")), Err(ApiError::InvalidBody(_))));
        assert!(matches!(parse_record(Some("42")), Err(ApiError::InvalidBody(_))));
    }

    #[test]
    fn test_parse_record_requires_fields() {
        assert!(matches!(
            parse_record(Some(r#"{"value":1}"#)),
            Err(ApiError::MissingField("key"))
        ));
        assert!(matches!(
            parse_record(Some(r#"{"key":"k"}"#)),
            Err(ApiError::MissingField("value"))
        ));
        assert!(matches!(
            parse_record(Some(r#"{"key":"","value":1}"#)),
            Err(ApiError::EmptyKey)
        ));
        assert!(matches!(
            parse_record(Some(r#"{"key":7,"value":1}"#)),
            Err(ApiError::InvalidBody(_))
        ));
    }

    #[test]
    fn test_parse_record_ignores_extra_fields() {
        let record = parse_record(Some(r#"{"key":"k","value":"v","ttl":30}"#)).unwrap();

        assert_eq!(
            record,
            Record {
                key: "k".to_string(),
                value: json!("v"),
            }
        );
    }

    #[tokio::test]
    async fn test_post_storage_failure_is_500() {
        let err = post_handler(&FailingStore, &post_event(Some(r#"{"key":"x","value":1}"#)))
            .await
            .unwrap_err();
        let response = KvResponse::from(err);

        assert_eq!(response.status_code, 500);
        let body: ErrorResponse = serde_json::from_str(&response.body).unwrap();
        assert!(body.message.contains("Storage error"));
    }
}
