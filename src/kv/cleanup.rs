//! Background purge of expired kv entries.

use crate::db::{Db, SqlValue};
use crate::logging::Logger;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;

/// Spawns the TTL cleanup loop.
///
/// The first pass runs immediately, then once per `interval`. A failed pass
/// is logged at error level and the loop keeps going; abort the returned
/// handle to stop it.
pub fn spawn_cleanup_task(
    db: Arc<Db>,
    clean_query: String,
    interval: Duration,
    logger: Logger,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        cleanup_loop(db, clean_query, interval, logger).await;
    })
}

async fn cleanup_loop(db: Arc<Db>, clean_query: String, interval: Duration, logger: Logger) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        match run_cleanup_now(&db, &clean_query).await {
            Ok(deleted) => {
                tracing::debug!(deleted, "SQLKV cleanup completed");
            }
            Err(e) => {
                logger.error(format_args!("Clean SQLKV fail: {}", e));
            }
        }
    }
}

/// Runs the clean query once with the current unix time; returns rows removed.
pub async fn run_cleanup_now(db: &Db, clean_query: &str) -> Result<u64, sqlx::Error> {
    let now = chrono::Utc::now().timestamp();
    let result = db.execute(clean_query, &[SqlValue::Integer(now)]).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::logging::{Event, Handler, HandlerError, Level, Subscription};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Errors {
        lines: Mutex<Vec<String>>,
    }

    impl Handler for Errors {
        fn write(&self, event: &Event) -> Result<(), HandlerError> {
            self.lines.lock().unwrap().push(event.message().to_string());
            Ok(())
        }
    }

    async fn create_test_db() -> Arc<Db> {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            debug: false,
        };
        let db = Db::open(&config, Logger::new()).await.unwrap();
        db.execute("CREATE TABLE kv (key TEXT PRIMARY KEY, value BLOB, expires INTEGER)", &[])
            .await
            .unwrap();
        Arc::new(db)
    }

    #[tokio::test]
    async fn test_run_cleanup_now_removes_expired() {
        let db = create_test_db().await;
        db.execute(
            "INSERT INTO kv (key, value, expires) VALUES ('old', x'00', 1000), ('new', x'00', 99999999999)",
            &[],
        )
        .await
        .unwrap();

        let deleted = run_cleanup_now(&db, "DELETE FROM kv WHERE expires <= ?").await.unwrap();
        assert_eq!(deleted, 1);
    }

    #[tokio::test]
    async fn test_cleanup_loop_survives_errors() {
        let db = create_test_db().await;
        let logger = Logger::new();
        let errors = Arc::new(Errors::default());
        logger
            .initialize(vec![Subscription::new(errors.clone(), [Level::Error])])
            .unwrap();

        let handle = spawn_cleanup_task(
            db,
            "DELETE FROM missing_table WHERE expires <= ?".to_string(),
            Duration::from_millis(20),
            logger,
        );

        tokio::time::sleep(Duration::from_millis(90)).await;
        assert!(!handle.is_finished());
        handle.abort();

        let lines = errors.lines.lock().unwrap();
        assert!(lines.len() >= 2);
        assert!(lines[0].starts_with("Clean SQLKV fail:"));
    }
}
