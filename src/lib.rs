//! Buffered, level-routed logging with a small KV/cache HTTP service on top.
//!
//! [`logging`] holds the dispatch core. Everything else is a consumer of it:
//! [`db`] logs statements through it, [`kv`] reports cleanup failures through
//! it and [`webserver`] writes request-scoped and access events.

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod kv;
pub mod logging;
pub mod webserver;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing for the crate's own diagnostics
///
/// Note: This function can only be called once per process.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}
