use super::core::LoggingCore;
use super::error::LoggingError;
use super::event::{Attributes, CallSite};
use super::format::Formatter;
use super::handler::Subscription;
use super::level::Level;
use std::fmt;
use std::sync::{Arc, OnceLock};

static GLOBAL: OnceLock<Logger> = OnceLock::new();

/// Process-wide logger backed by a single [`LoggingCore`].
///
/// Created lazily and not ready until someone calls `initialize` or `flush`
/// on it; everything logged before that is buffered.
pub fn global() -> &'static Logger {
    GLOBAL.get_or_init(Logger::new)
}

/// Cheap cloneable handle to a [`LoggingCore`].
///
/// All level methods are `#[track_caller]`: the recorded call site is the
/// code calling them, not this module.
#[derive(Clone, Debug)]
pub struct Logger {
    core: Arc<LoggingCore>,
}

impl Logger {
    pub fn new() -> Self {
        Self::from_core(Arc::new(LoggingCore::new()))
    }

    pub fn from_core(core: Arc<LoggingCore>) -> Self {
        Self { core }
    }

    pub fn core(&self) -> &Arc<LoggingCore> {
        &self.core
    }

    pub fn initialize(&self, subscriptions: Vec<Subscription>) -> Result<(), LoggingError> {
        self.core.initialize(subscriptions)
    }

    pub fn flush(&self) -> usize {
        self.core.flush()
    }

    #[track_caller]
    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        self.core.log(CallSite::caller(), level, None, None, args);
    }

    /// Full-control entry point: explicit call site, attributes and
    /// formatter override.
    pub fn log_with(
        &self,
        call_site: CallSite,
        level: Level,
        attrs: Option<Attributes>,
        formatter: Option<Arc<dyn Formatter>>,
        args: fmt::Arguments<'_>,
    ) {
        self.core.log(call_site, level, attrs, formatter, args);
    }

    #[track_caller]
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.core.log(CallSite::caller(), Level::Debug, None, None, args);
    }

    #[track_caller]
    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.core.log(CallSite::caller(), Level::Info, None, None, args);
    }

    #[track_caller]
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.core.log(CallSite::caller(), Level::Warn, None, None, args);
    }

    #[track_caller]
    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.core.log(CallSite::caller(), Level::Error, None, None, args);
    }

    #[track_caller]
    pub fn fatal(&self, args: fmt::Arguments<'_>) {
        self.core.log(CallSite::caller(), Level::Fatal, None, None, args);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

/// Logs through the process-wide logger: `log_event!(Level::access(), "...")`.
#[macro_export]
macro_rules! log_event {
    ($level:expr, $($arg:tt)+) => {
        $crate::logging::global().log_with(
            $crate::logging::CallSite::caller().with_module(module_path!()),
            $level,
            None,
            None,
            format_args!($($arg)+),
        )
    };
}

#[macro_export]
macro_rules! log_debug { ($($arg:tt)+) => { $crate::log_event!($crate::logging::Level::Debug, $($arg)+) } }
#[macro_export]
macro_rules! log_info  { ($($arg:tt)+) => { $crate::log_event!($crate::logging::Level::Info, $($arg)+) } }
#[macro_export]
macro_rules! log_warn  { ($($arg:tt)+) => { $crate::log_event!($crate::logging::Level::Warn, $($arg)+) } }
#[macro_export]
macro_rules! log_error { ($($arg:tt)+) => { $crate::log_event!($crate::logging::Level::Error, $($arg)+) } }
#[macro_export]
macro_rules! log_fatal { ($($arg:tt)+) => { $crate::log_event!($crate::logging::Level::Fatal, $($arg)+) } }

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::error::HandlerError;
    use crate::logging::event::Event;
    use crate::logging::handler::Handler;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Sites {
        seen: Mutex<Vec<(String, u32)>>,
    }

    impl Handler for Sites {
        fn write(&self, event: &Event) -> Result<(), HandlerError> {
            let site = event.call_site();
            self.seen.lock().unwrap().push((site.file.to_string(), site.line));
            Ok(())
        }
    }

    #[test]
    fn test_wrappers_report_application_call_site() {
        let logger = Logger::new();
        let sites = Arc::new(Sites::default());
        logger
            .initialize(vec![Subscription::new(sites.clone(), Level::STANDARD)])
            .unwrap();

        logger.warn(format_args!("here"));
        let expected_line = line!() - 1;

        let seen = sites.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].0.ends_with("facade.rs"));
        assert_eq!(seen[0].1, expected_line);
    }

    #[test]
    fn test_clones_share_core() {
        let logger = Logger::new();
        let clone = logger.clone();
        clone.info(format_args!("buffered"));
        assert_eq!(logger.core().pending_count(), 1);
        assert!(Arc::ptr_eq(logger.core(), clone.core()));
    }
}
