//! Key/value storage with per-entry expiry.

pub mod cleanup;
pub mod sql;

pub use cleanup::{run_cleanup_now, spawn_cleanup_task};
pub use sql::SqlKv;

use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum KvError {
    #[error("key not found")]
    NotFound,

    #[error("invalid kv configuration: {0}")]
    Config(String),

    #[error("Create SQLKV table fail: {0}")]
    CreateTable(#[source] sqlx::Error),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait KvStore: Send + Sync {
    /// Returns the stored bytes, or [`KvError::NotFound`].
    async fn get(&self, key: &str) -> Result<Vec<u8>, KvError>;

    /// Stores `value` until `max_age` from now.
    async fn set(&self, key: &str, value: &[u8], max_age: Duration) -> Result<(), KvError>;
}
