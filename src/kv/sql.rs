use super::cleanup::spawn_cleanup_task;
use super::{KvError, KvStore};
use crate::config::KvConfig;
use crate::db::{Db, SqlValue};
use crate::logging::Logger;
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

#[derive(Default)]
struct TableState {
    initialized: bool,
    cleaner: Option<JoinHandle<()>>,
}

/// Key/value store on top of caller-supplied SQL.
///
/// The table is created lazily on first use. `set_query` binds
/// `(key, value, expires_unix)`, `get_query` binds `(key)` and must select
/// the value as its first column, `clean_query` binds `(now_unix)`.
pub struct SqlKv {
    db: Arc<Db>,
    config: KvConfig,
    logger: Logger,
    state: Mutex<TableState>,
}

impl SqlKv {
    pub fn new(db: Arc<Db>, config: KvConfig, logger: Logger) -> Result<Self, KvError> {
        if config.get_query.trim().is_empty() {
            return Err(KvError::Config("Missing GetQuery".to_string()));
        }
        if config.set_query.trim().is_empty() {
            return Err(KvError::Config("Missing SetQuery".to_string()));
        }
        if config.clean_query.is_some() && config.clean_interval().is_zero() {
            return Err(KvError::Config("CleanInterval must be positive".to_string()));
        }

        Ok(Self {
            db,
            config,
            logger,
            state: Mutex::new(TableState::default()),
        })
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        self.db.ping().await
    }

    /// Whether the TTL cleanup task has been started
    pub async fn is_cleaning(&self) -> bool {
        self.state.lock().await.cleaner.is_some()
    }

    async fn ensure_table(&self) -> Result<(), KvError> {
        let mut state = self.state.lock().await;
        if state.initialized {
            return Ok(());
        }

        for query in &self.config.create_queries {
            self.db
                .execute(query, &[])
                .await
                .map_err(KvError::CreateTable)?;
        }
        state.initialized = true;

        if let Some(clean_query) = &self.config.clean_query {
            state.cleaner = Some(spawn_cleanup_task(
                self.db.clone(),
                clean_query.clone(),
                self.config.clean_interval(),
                self.logger.clone(),
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl KvStore for SqlKv {
    async fn get(&self, key: &str) -> Result<Vec<u8>, KvError> {
        self.ensure_table().await?;

        let params = [SqlValue::from(key)];
        let row = self
            .db
            .fetch_optional(&self.config.get_query, &params)
            .await?
            .ok_or(KvError::NotFound)?;

        Ok(row.try_get::<Vec<u8>, _>(0)?)
    }

    async fn set(&self, key: &str, value: &[u8], max_age: Duration) -> Result<(), KvError> {
        self.ensure_table().await?;

        let max_age = i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX);
        let expires = chrono::Utc::now().timestamp().saturating_add(max_age);
        let params = [
            SqlValue::from(key),
            SqlValue::from(value),
            SqlValue::Integer(expires),
        ];
        self.db.execute(&self.config.set_query, &params).await?;
        Ok(())
    }
}

impl Drop for SqlKv {
    fn drop(&mut self) {
        if let Some(cleaner) = self.state.get_mut().cleaner.take() {
            cleaner.abort();
        }
    }
}
