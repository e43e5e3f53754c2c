//! HTTP surface: kv and cache endpoints behind request-scoped logging.

pub mod handlers;
pub mod request;
pub mod server;

pub use request::{request_logging, RequestLog, RequestLogging};
pub use server::{create_router, start_server, AppState};
