//! Logger carrying request-local attributes and formatter.

use super::event::{Attributes, CallSite};
use super::facade::Logger;
use super::format::Formatter;
use super::level::Level;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Merges its attribute map into every event it emits and tags each event
/// with its formatter override. Clones share the same attribute map.
#[derive(Clone)]
pub struct ScopedLogger {
    logger: Logger,
    attrs: Arc<Mutex<Attributes>>,
    formatter: Option<Arc<dyn Formatter>>,
}

impl ScopedLogger {
    pub fn new(logger: Logger, formatter: Option<Arc<dyn Formatter>>) -> Self {
        Self {
            logger,
            attrs: Arc::new(Mutex::new(Attributes::new())),
            formatter,
        }
    }

    pub fn set_attr(&self, key: impl Into<String>, value: impl Into<String>) {
        self.lock_attrs().insert(key.into(), value.into());
    }

    /// Sets `key` only if nothing has set it yet.
    pub fn set_attr_default(&self, key: &str, value: &str) {
        self.lock_attrs()
            .entry(key.to_string())
            .or_insert_with(|| value.to_string());
    }

    pub fn attr(&self, key: &str) -> Option<String> {
        self.lock_attrs().get(key).cloned()
    }

    pub fn attrs(&self) -> Attributes {
        self.lock_attrs().clone()
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Emits with the current attribute snapshot. `with_formatter = false`
    /// leaves formatting to each handler.
    pub fn emit(&self, call_site: CallSite, level: Level, with_formatter: bool, args: fmt::Arguments<'_>) {
        let formatter = if with_formatter { self.formatter.clone() } else { None };
        self.logger
            .log_with(call_site, level, Some(self.attrs()), formatter, args);
    }

    #[track_caller]
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.emit(CallSite::caller(), Level::Debug, true, args);
    }

    #[track_caller]
    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.emit(CallSite::caller(), Level::Info, true, args);
    }

    #[track_caller]
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.emit(CallSite::caller(), Level::Warn, true, args);
    }

    #[track_caller]
    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.emit(CallSite::caller(), Level::Error, true, args);
    }

    #[track_caller]
    pub fn fatal(&self, args: fmt::Arguments<'_>) {
        self.emit(CallSite::caller(), Level::Fatal, true, args);
    }

    fn lock_attrs(&self) -> MutexGuard<'_, Attributes> {
        self.attrs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ScopedLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedLogger")
            .field("attrs", &*self.lock_attrs())
            .field("has_formatter", &self.formatter.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::error::HandlerError;
    use crate::logging::event::Event;
    use crate::logging::format::TextFormatter;
    use crate::logging::handler::{Handler, Subscription};

    #[derive(Default)]
    struct Capture {
        events: Mutex<Vec<Event>>,
    }

    impl Handler for Capture {
        fn write(&self, event: &Event) -> Result<(), HandlerError> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    fn ready_logger(capture: Arc<Capture>) -> Logger {
        let logger = Logger::new();
        logger
            .initialize(vec![Subscription::new(
                capture,
                Level::STANDARD.into_iter().chain([Level::access()]),
            )])
            .unwrap();
        logger
    }

    #[test]
    fn test_scoped_logger_merges_attributes() {
        let capture = Arc::new(Capture::default());
        let scoped = ScopedLogger::new(ready_logger(capture.clone()), None);
        scoped.set_attr("request.clientip", "127.0.0.1");

        scoped.info(format_args!("handling"));

        let events = capture.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].attr("request.clientip"), Some("127.0.0.1"));
        assert_eq!(events[0].message(), "handling");
    }

    #[test]
    fn test_scoped_logger_carries_formatter_override() {
        let capture = Arc::new(Capture::default());
        let formatter: Arc<dyn Formatter> = Arc::new(TextFormatter::new("{attr:ip} {message}"));
        let scoped = ScopedLogger::new(ready_logger(capture.clone()), Some(formatter));
        scoped.set_attr("ip", "10.1.1.1");

        scoped.warn(format_args!("slow"));
        scoped.emit(CallSite::caller(), Level::access(), false, format_args!(""));

        let events = capture.events.lock().unwrap();
        let line = events[0].formatter().unwrap().format(&events[0]);
        assert_eq!(line, "10.1.1.1 slow");
        assert!(events[1].formatter().is_none());
    }

    #[test]
    fn test_attr_default_does_not_overwrite() {
        let scoped = ScopedLogger::new(Logger::new(), None);
        scoped.set_attr("request.user", "alice");
        scoped.set_attr_default("request.user", "-");
        scoped.set_attr_default("request.auth", "-");

        assert_eq!(scoped.attr("request.user").as_deref(), Some("alice"));
        assert_eq!(scoped.attr("request.auth").as_deref(), Some("-"));
    }
}
