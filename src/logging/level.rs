use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Severity of a log event.
///
/// The five well-known levels are closed variants; anything else (for
/// example the `access` pseudo-level used for request logs) is carried as
/// a custom tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Custom(Arc<str>),
}

impl Level {
    /// The five built-in severities, lowest first.
    pub const STANDARD: [Level; 5] = [
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
    ];

    /// Level for `name`, matched the same way configuration is parsed:
    /// trimmed and case-insensitive, so `custom("Audit")` equals
    /// `"audit".parse()` and `custom("INFO")` is [`Level::Info`].
    pub fn custom(name: &str) -> Self {
        let name = name.trim().to_ascii_lowercase();
        match name.as_str() {
            "debug" => Level::Debug,
            "info" => Level::Info,
            "warn" | "warning" => Level::Warn,
            "error" => Level::Error,
            "fatal" => Level::Fatal,
            _ => Level::Custom(Arc::from(name)),
        }
    }

    /// Level used for per-request access lines
    pub fn access() -> Self {
        Level::custom("access")
    }

    pub fn as_str(&self) -> &str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
            Level::Custom(name) => name,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Level::Custom(_))
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("level name cannot be empty")]
pub struct EmptyLevelName;

impl FromStr for Level {
    type Err = EmptyLevelName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.is_empty() {
            return Err(EmptyLevelName);
        }

        Ok(Level::custom(name))
    }
}

impl TryFrom<String> for Level {
    type Error = EmptyLevelName;

    fn try_from(value: String) -> Result<Self, EmptyLevelName> {
        value.parse()
    }
}

impl From<Level> for String {
    fn from(level: Level) -> Self {
        level.as_str().to_string()
    }
}
