use super::handlers;
use super::request::{request_logging, RequestLogging};
use crate::cache::Cache;
use crate::config::ServerConfig;
use crate::kv::KvStore;
use crate::logging::{Formatter, Logger, TextFormatter};
use anyhow::Result;
use axum::{middleware, routing::get, Router};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub kv: Arc<dyn KvStore>,
    pub cache: Arc<dyn Cache>,
    /// TTL for `PUT /kv/:key` without `max_age`
    pub default_max_age: Duration,
}

/// Builds the router. `request_template`, when set, becomes the formatter
/// override for every log line written through a `RequestLog`.
pub fn create_router(state: AppState, logger: Logger, request_template: Option<&str>) -> Router {
    let formatter = request_template.map(|t| Arc::new(TextFormatter::new(t)) as Arc<dyn Formatter>);
    let logging = Arc::new(RequestLogging { logger, formatter });

    Router::new()
        .route("/health", get(handlers::health))
        .route("/kv/:key", get(handlers::get_kv).put(handlers::put_kv))
        .route(
            "/cache/:key",
            get(handlers::get_cache)
                .put(handlers::put_cache)
                .delete(handlers::delete_cache),
        )
        .with_state(state)
        .layer(middleware::from_fn_with_state(logging, request_logging))
        .layer(TraceLayer::new_for_http())
}

/// Serves until Ctrl-C.
pub async fn start_server(config: &ServerConfig, state: AppState, logger: Logger) -> Result<()> {
    let app = create_router(state, logger.clone(), config.request_template.as_deref());

    let addr = SocketAddr::from((config.host.parse::<std::net::IpAddr>()?, config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Listening on {}", addr);
    logger.info(format_args!("Listening on {}", addr));

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown signal received, draining connections...");
        })
        .await?;

    info!("Server stopped gracefully");
    Ok(())
}
