//! Immutable log event record.

use super::format::Formatter;
use super::level::Level;
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Structured key/value fields attached to an event
pub type Attributes = HashMap<String, String>;

/// Source location an event is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    pub file: &'static str,
    pub line: u32,
    pub column: u32,
    pub module: Option<&'static str>,
}

impl CallSite {
    /// Location of the nearest caller not marked `#[track_caller]`.
    #[track_caller]
    pub fn caller() -> Self {
        Self::from_location(Location::caller())
    }

    pub fn from_location(location: &'static Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
            column: location.column(),
            module: None,
        }
    }

    pub fn with_module(mut self, module: &'static str) -> Self {
        self.module = Some(module);
        self
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// One log occurrence.
///
/// Fields are private so an event cannot change after construction; handlers
/// receive it by shared reference, buffered events are owned by the buffer.
#[derive(Clone)]
pub struct Event {
    level: Level,
    message: String,
    call_site: CallSite,
    attrs: Option<Attributes>,
    formatter: Option<Arc<dyn Formatter>>,
    timestamp: DateTime<Local>,
}

impl Event {
    pub fn new(
        call_site: CallSite,
        level: Level,
        attrs: Option<Attributes>,
        formatter: Option<Arc<dyn Formatter>>,
        args: fmt::Arguments<'_>,
    ) -> Self {
        Self {
            level,
            message: render(args),
            call_site,
            attrs,
            formatter,
            timestamp: Local::now(),
        }
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn call_site(&self) -> &CallSite {
        &self.call_site
    }

    pub fn attrs(&self) -> Option<&Attributes> {
        self.attrs.as_ref()
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.as_ref()?.get(key).map(String::as_str)
    }

    /// Per-event formatter override, if the caller supplied one
    pub fn formatter(&self) -> Option<&Arc<dyn Formatter>> {
        self.formatter.as_ref()
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("level", &self.level)
            .field("message", &self.message)
            .field("call_site", &self.call_site)
            .field("attrs", &self.attrs)
            .field("has_formatter", &self.formatter.is_some())
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

// A Display impl that returns Err leaves whatever was written so far.
fn render(args: fmt::Arguments<'_>) -> String {
    if let Some(s) = args.as_str() {
        return s.to_string();
    }
    let mut out = String::new();
    let _ = fmt::write(&mut out, args);
    out
}
