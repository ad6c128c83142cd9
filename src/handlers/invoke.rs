use crate::dispatch::dispatch;
use crate::models::{KvEvent, KvResponse};
use crate::routes;
use crate::state::AppState;
use axum::{extract::State, Json};

/// POST /invoke handler - Dispatch a proxy event and return the proxy response
///
/// Unlike `/kv`, the HTTP status of this endpoint is always 200 once the
/// event parses; the dispatcher's outcome is carried in `statusCode`.
#[utoipa::path(
    post,
    path = routes::INVOKE,
    request_body = KvEvent,
    responses(
        (status = 200, description = "Event dispatched", body = KvResponse),
        (status = 400, description = "Event is not valid JSON"),
        (status = 422, description = "Event is missing httpMethod")
    ),
    tag = "kv"
)]
pub async fn invoke_handler(
    State(state): State<AppState>,
    Json(event): Json<KvEvent>,
) -> Json<KvResponse> {
    tracing::debug!("Invoking {} event", event.http_method);
    Json(dispatch(state.store.as_ref(), &event).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::build_router;
    use crate::store::MemoryStore;
    use axum::{body::Body, http::Request, http::StatusCode, Router};
    use serde_json::json;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn setup_test_app() -> Router {
        build_router(AppState {
            store: Arc::new(MemoryStore::new()),
        })
    }

    async fn invoke(app: Router, event: serde_json::Value) -> (StatusCode, KvResponse) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/invoke")
                    .header("content-type", "application/json")
                    .body(Body::from(event.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_invoke_post_then_get() {
        let app = setup_test_app();

        let (status, response) = invoke(
            app.clone(),
            json!({"httpMethod": "POST", "body": "{\"key\":\"x\",\"value\":42}"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, r#"{"message":"Data stored"}"#);

        let (_, response) = invoke(
            app,
            json!({"httpMethod": "GET", "queryStringParameters": {"key": "x"}}),
        )
        .await;
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, "42");
    }

    #[tokio::test]
    async fn test_invoke_reports_dispatch_errors_in_status_code() {
        let app = setup_test_app();

        let (status, response) = invoke(app, json!({"httpMethod": "PATCH"})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(response.status_code, 400);
        assert_eq!(response.body, r#"{"message":"Invalid request method"}"#);
    }
}
