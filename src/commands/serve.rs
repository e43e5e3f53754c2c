use anyhow::Result;
use logroute::cache::MemoryCache;
use logroute::config;
use logroute::db::Db;
use logroute::kv::SqlKv;
use logroute::log_info;
use logroute::logging::{self, build_subscriptions, Logger};
use logroute::webserver::{start_server, AppState};
use std::sync::Arc;
use tracing::info;

/// Start sequence:
/// 1. Log boot messages; they are buffered until handlers exist
/// 2. Load configuration and install the configured handlers
/// 3. Open the database and wire the stores
/// 4. Serve until shutdown, then flush
pub async fn execute(config_path: &str) -> Result<()> {
    log_info!("logroute v{} starting, config={}", env!("CARGO_PKG_VERSION"), config_path);
    let logger = logging::global().clone();

    let result = run(&logger, config_path).await;
    if let Err(e) = &result {
        logger.error(format_args!("logroute exiting: {:#}", e));
    }

    // Delivers anything still buffered, e.g. when config loading failed
    let replayed = logger.flush();
    if replayed > 0 {
        info!(replayed, "Flushed buffered log events to the default handler");
    }
    result
}

async fn run(logger: &Logger, config_path: &str) -> Result<()> {
    let cfg = config::load_config(config_path)?;

    let subscriptions = build_subscriptions(&cfg.logging)?;
    info!(handlers = subscriptions.len(), "Installing log handlers");
    logger.initialize(subscriptions)?;
    logger.info(format_args!("Configuration loaded from {}", config_path));

    let db = Arc::new(Db::open(&cfg.database, logger.clone()).await?);
    let kv = SqlKv::new(db, cfg.kv.clone(), logger.clone())?;
    kv.ping().await?;

    let state = AppState {
        kv: Arc::new(kv),
        cache: Arc::new(MemoryCache::new()),
        default_max_age: cfg.kv.default_max_age(),
    };

    start_server(&cfg.server, state, logger.clone()).await?;
    logger.info(format_args!("Server stopped"));
    Ok(())
}
