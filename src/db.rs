//! SQLite pool wrapper that can echo every statement to the debug log.

use crate::config::DatabaseConfig;
use crate::logging::Logger;
use anyhow::{Context, Result};
use sqlx::query::Query;
use sqlx::sqlite::{
    Sqlite, SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteQueryResult,
    SqliteRow,
};
use sqlx::{Connection, Transaction};
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

/// Positional statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Real(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Blob(v)
    }
}

impl From<&[u8]> for SqlValue {
    fn from(v: &[u8]) -> Self {
        SqlValue::Blob(v.to_vec())
    }
}

/// Collapses runs of spaces, tabs and newlines so multi-line SQL logs on one line.
pub fn normalize_query(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub struct Db {
    pool: SqlitePool,
    debug: bool,
    logger: Logger,
}

impl Db {
    pub async fn open(config: &DatabaseConfig, logger: Logger) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .with_context(|| format!("Invalid database url: {}", config.url))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(30));

        // In-memory databases have no parent directory
        if let Some(parent) = options.get_filename().parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create database directory {}", parent.display()))?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await
            .context("open sql db fail")?;

        Ok(Self {
            pool,
            debug: config.debug,
            logger,
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        conn.ping().await?;
        Ok(())
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        if self.debug {
            self.logger.debug(format_args!("Begin SQL Transaction"));
        }
        Ok(self.pool.begin().await?)
    }

    /// Runs a statement that returns no rows.
    #[track_caller]
    pub fn execute<'a>(
        &'a self,
        query: &'a str,
        params: &'a [SqlValue],
    ) -> impl Future<Output = Result<SqliteQueryResult, sqlx::Error>> + 'a {
        self.trace(query, params);
        async move { bind_all(sqlx::query(query), params).execute(&self.pool).await }
    }

    #[track_caller]
    pub fn fetch_all<'a>(
        &'a self,
        query: &'a str,
        params: &'a [SqlValue],
    ) -> impl Future<Output = Result<Vec<SqliteRow>, sqlx::Error>> + 'a {
        self.trace(query, params);
        async move { bind_all(sqlx::query(query), params).fetch_all(&self.pool).await }
    }

    #[track_caller]
    pub fn fetch_optional<'a>(
        &'a self,
        query: &'a str,
        params: &'a [SqlValue],
    ) -> impl Future<Output = Result<Option<SqliteRow>, sqlx::Error>> + 'a {
        self.trace(query, params);
        async move { bind_all(sqlx::query(query), params).fetch_optional(&self.pool).await }
    }

    #[track_caller]
    fn trace(&self, query: &str, params: &[SqlValue]) {
        if self.debug {
            self.logger.debug(format_args!(
                "SQL: query=\"{}\", params={:?}",
                normalize_query(query),
                params
            ));
        }
    }
}

impl fmt::Debug for Db {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Db").field("debug", &self.debug).finish_non_exhaustive()
    }
}

fn bind_all<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &'q [SqlValue],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            SqlValue::Null => query.bind(None::<i64>),
            SqlValue::Integer(v) => query.bind(*v),
            SqlValue::Real(v) => query.bind(*v),
            SqlValue::Text(v) => query.bind(v.as_str()),
            SqlValue::Blob(v) => query.bind(v.as_slice()),
        };
    }
    query
}
