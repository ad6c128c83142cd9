use axum::{
    body::Body,
    http::Request,
    routing::{any, get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use crate::api_doc::ApiDoc;
use crate::handlers::{health_handler, invoke_handler, kv_handler};
use crate::routes;
use crate::state::AppState;

/// Build the service router with tracing and OpenAPI docs attached
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(routes::HEALTH, get(health_handler))
        .route(routes::KV, any(kv_handler))
        .route(routes::INVOKE, post(invoke_handler))
        .merge(SwaggerUi::new(routes::SWAGGER_UI).url(routes::OPENAPI_JSON, ApiDoc::openapi()))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    request_id = %Uuid::new_v4(),
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .with_state(state)
}
