pub mod get;
pub mod health;
pub mod invoke;
pub mod kv;
pub mod post;

pub use get::get_handler;
pub use health::health_handler;
pub use invoke::invoke_handler;
pub use kv::kv_handler;
pub use post::post_handler;
