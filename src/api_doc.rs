use utoipa::OpenApi;

use crate::error::{ErrorResponse, HealthResponse, UnhealthyResponse};
use crate::handlers;
use crate::models::{KvEvent, KvResponse, MessageResponse, Record};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "kv-proxy API",
        version = "1.0.0",
        description = "A method-dispatched JSON key-value store backed by Google Cloud Spanner"
    ),
    paths(
        handlers::health::health_handler,
        handlers::kv::kv_handler,
        handlers::invoke::invoke_handler
    ),
    components(
        schemas(
            Record,
            MessageResponse,
            KvEvent,
            KvResponse,
            ErrorResponse,
            HealthResponse,
            UnhealthyResponse
        )
    ),
    tags(
        (name = "health", description = "Health check operations"),
        (name = "kv", description = "Key-value store operations")
    )
)]
pub struct ApiDoc;
