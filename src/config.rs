use crate::logging::Level;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
    pub kv: KvConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub handlers: Vec<HandlerConfig>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            handlers: vec![HandlerConfig {
                name: Some("console".to_string()),
                kind: HandlerKind::Stderr,
                levels: Level::STANDARD.to_vec(),
                path: None,
                template: None,
            }],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HandlerConfig {
    pub name: Option<String>,
    pub kind: HandlerKind,
    pub levels: Vec<Level>,
    /// Required for `file` handlers
    pub path: Option<PathBuf>,
    /// Line template, see `logging::format`
    pub template: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerKind {
    Stderr,
    Stdout,
    File,
    Tracing,
}

impl HandlerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandlerKind::Stderr => "stderr",
            HandlerKind::Stdout => "stdout",
            HandlerKind::File => "file",
            HandlerKind::Tracing => "tracing",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// Log every statement at debug level
    pub debug: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:./data/logroute.db".to_string(),
            max_connections: 5,
            debug: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KvConfig {
    pub create_queries: Vec<String>,
    pub get_query: String,
    pub set_query: String,
    pub clean_query: Option<String>,
    pub clean_interval_seconds: u64,
    /// TTL applied by `PUT /kv/:key` without `max_age`
    pub default_max_age_seconds: u64,
}

impl KvConfig {
    pub fn clean_interval(&self) -> Duration {
        Duration::from_secs(self.clean_interval_seconds)
    }

    pub fn default_max_age(&self) -> Duration {
        Duration::from_secs(self.default_max_age_seconds)
    }
}

impl Default for KvConfig {
    fn default() -> Self {
        Self {
            create_queries: vec![
                "CREATE TABLE IF NOT EXISTS kv (
                    key TEXT PRIMARY KEY,
                    value BLOB NOT NULL,
                    expires INTEGER NOT NULL
                )"
                .to_string(),
            ],
            get_query: "SELECT value FROM kv WHERE key = ? AND expires > CAST(strftime('%s', 'now') AS INTEGER)".to_string(),
            set_query: "INSERT OR REPLACE INTO kv (key, value, expires) VALUES (?, ?, ?)".to_string(),
            clean_query: Some("DELETE FROM kv WHERE expires <= ?".to_string()),
            clean_interval_seconds: 60,
            default_max_age_seconds: 3600,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Formatter override for logs emitted while handling a request
    pub request_template: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_template: Some(
                "{time} [{level}] {attr:request.clientip} {attr:request.method} {attr:request.url} {message}".to_string(),
            ),
        }
    }
}

pub fn load_config(path: &str) -> anyhow::Result<Config> {
    let config = config::Config::builder()
        .add_source(config::File::with_name(path))
        .add_source(config::Environment::with_prefix("LOGROUTE").separator("__"))
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

pub fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.logging.handlers.is_empty() {
        anyhow::bail!("At least one logging handler must be configured");
    }

    for (index, handler) in cfg.logging.handlers.iter().enumerate() {
        let name = handler.name.as_deref().unwrap_or(handler.kind.as_str());
        if handler.levels.is_empty() {
            anyhow::bail!("Logging handler #{} '{}' subscribes to no levels", index, name);
        }
        if handler.kind == HandlerKind::File && handler.path.is_none() {
            anyhow::bail!("Logging handler #{} '{}' is a file handler without a path", index, name);
        }
    }

    if cfg.database.url.is_empty() {
        anyhow::bail!("Database url cannot be empty");
    }
    if cfg.database.max_connections == 0 {
        anyhow::bail!("Database max_connections must be >= 1");
    }

    if cfg.kv.get_query.trim().is_empty() {
        anyhow::bail!("Missing kv get_query");
    }
    if cfg.kv.set_query.trim().is_empty() {
        anyhow::bail!("Missing kv set_query");
    }
    if cfg.kv.clean_query.is_some() && cfg.kv.clean_interval_seconds == 0 {
        anyhow::bail!("kv clean_interval_seconds must be > 0 when clean_query is set");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_config_requires_handler() {
        let mut cfg = Config::default();
        cfg.logging.handlers.clear();

        let result = validate_config(&cfg);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("At least one logging handler"));
    }

    #[test]
    fn test_validate_config_file_handler_needs_path() {
        let mut cfg = Config::default();
        cfg.logging.handlers[0].kind = HandlerKind::File;

        let result = validate_config(&cfg);
        assert!(result.unwrap_err().to_string().contains("without a path"));
    }

    #[test]
    fn test_validate_config_requires_kv_queries() {
        let mut cfg = Config::default();
        cfg.kv.set_query = "  ".to_string();

        let result = validate_config(&cfg);
        assert!(result.unwrap_err().to_string().contains("Missing kv set_query"));
    }

    #[test]
    fn test_load_config_from_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[[logging.handlers]]
name = "errors"
kind = "stderr"
levels = ["error", "fatal"]

[[logging.handlers]]
kind = "tracing"
levels = ["info", "access"]

[server]
port = 9090
"#
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let cfg = load_config(&path).unwrap();

        assert_eq!(cfg.logging.handlers.len(), 2);
        assert_eq!(cfg.logging.handlers[0].levels, vec![Level::Error, Level::Fatal]);
        assert_eq!(cfg.logging.handlers[1].kind, HandlerKind::Tracing);
        assert_eq!(cfg.logging.handlers[1].levels[1], Level::access());
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.kv.clean_interval_seconds, 60);
    }
}
