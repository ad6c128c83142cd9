// Route path constants - single source of truth for all API paths

pub const HEALTH: &str = "/health";
pub const KV: &str = "/kv";
pub const INVOKE: &str = "/invoke";
pub const SWAGGER_UI: &str = "/swagger-ui";
pub const OPENAPI_JSON: &str = "/api-docs/openapi.json";
