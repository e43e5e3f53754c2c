//! Event routing core.
//!
//! ```text
//!            log()
//!              │
//!     registry installed? ──yes──► HandlerRegistry::deliver (caller's thread)
//!              │ no
//!              ▼
//!      lock pending ── installed meanwhile? ──yes──► deliver live
//!              │ no
//!              ▼
//!      EventBuffer::push
//!
//!   initialize()/flush():  lock pending → build registry → take buffer
//!                          → replay per level in FIFO order → publish registry
//! ```
//!
//! The registry is published only after the replay, while the pending lock
//! is still held. A caller that saw "not ready" waits on that lock and then
//! sees the published registry, so replayed events always precede live ones
//! and nothing is appended to a buffer that has already been drained.

use super::buffer::EventBuffer;
use super::error::LoggingError;
use super::event::{Attributes, CallSite, Event};
use super::format::Formatter;
use super::handler::{Handler, Subscription};
use super::handlers::StreamHandler;
use super::level::Level;
use super::registry::HandlerRegistry;
use arc_swap::ArcSwapOption;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub struct LoggingCore {
    registry: ArcSwapOption<HandlerRegistry>,
    pending: Mutex<EventBuffer>,
    default_handler: Arc<dyn Handler>,
}

impl LoggingCore {
    /// Creates a not-ready core whose fallback configuration writes to stderr.
    pub fn new() -> Self {
        Self::with_default_handler(Arc::new(StreamHandler::stderr()))
    }

    /// Creates a not-ready core with a custom fallback handler, used when
    /// [`flush`](Self::flush) runs before any explicit configuration.
    pub fn with_default_handler(default_handler: Arc<dyn Handler>) -> Self {
        Self {
            registry: ArcSwapOption::empty(),
            pending: Mutex::new(EventBuffer::new()),
            default_handler,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.registry.load().is_some()
    }

    /// Number of events waiting for a registry
    pub fn pending_count(&self) -> usize {
        self.lock_pending().len()
    }

    /// Routes one event: buffered before readiness, delivered synchronously
    /// to the subscribed handlers afterwards. Never fails.
    pub fn log(
        &self,
        call_site: CallSite,
        level: Level,
        attrs: Option<Attributes>,
        formatter: Option<Arc<dyn Formatter>>,
        args: fmt::Arguments<'_>,
    ) {
        if let Some(registry) = self.registry.load_full() {
            if !registry.has_subscribers(&level) {
                tracing::trace!(level = %level, "No log handler subscribed, event dropped");
                return;
            }
            let event = Event::new(call_site, level, attrs, formatter, args);
            registry.deliver(&event);
            return;
        }

        let event = Event::new(call_site, level, attrs, formatter, args);

        let mut pending = self.lock_pending();
        match self.registry.load_full() {
            None => pending.push(event),
            Some(registry) => {
                drop(pending);
                if registry.has_subscribers(event.level()) {
                    registry.deliver(&event);
                } else {
                    tracing::trace!(level = %event.level(), "No log handler subscribed, event dropped");
                }
            }
        }
    }

    /// Installs the handler registry and replays buffered events.
    ///
    /// Only the first transition to ready is accepted; later calls return
    /// [`LoggingError::AlreadyInitialized`] and change nothing.
    pub fn initialize(&self, subscriptions: Vec<Subscription>) -> Result<(), LoggingError> {
        let mut pending = self.lock_pending();
        if self.registry.load().is_some() {
            return Err(LoggingError::AlreadyInitialized);
        }
        self.install(&mut pending, subscriptions);
        Ok(())
    }

    /// Forces readiness and delivers anything buffered.
    ///
    /// Without a prior [`initialize`](Self::initialize) the default handler is
    /// installed for every standard level plus `access`. Safe to call any
    /// number of times; returns how many buffered events were replayed.
    pub fn flush(&self) -> usize {
        let mut pending = self.lock_pending();
        match self.registry.load_full() {
            Some(registry) => replay(&registry, pending.take()),
            None => {
                tracing::debug!("Logging not configured, installing default handler");
                let subscriptions = vec![self.default_subscription()];
                self.install(&mut pending, subscriptions)
            }
        }
    }

    fn install(&self, pending: &mut MutexGuard<'_, EventBuffer>, subscriptions: Vec<Subscription>) -> usize {
        let registry = Arc::new(HandlerRegistry::new(subscriptions));
        let replayed = replay(&registry, pending.take());
        self.registry.store(Some(registry));

        tracing::debug!(replayed, "Logging core ready");
        replayed
    }

    fn default_subscription(&self) -> Subscription {
        Subscription::new(
            self.default_handler.clone(),
            Level::STANDARD.into_iter().chain([Level::access()]),
        )
    }

    fn lock_pending(&self) -> MutexGuard<'_, EventBuffer> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for LoggingCore {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LoggingCore {
    fn drop(&mut self) {
        let has_pending = match self.pending.get_mut() {
            Ok(buffer) => !buffer.is_empty(),
            Err(poisoned) => !poisoned.into_inner().is_empty(),
        };
        if has_pending {
            self.flush();
        }
    }
}

impl fmt::Debug for LoggingCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingCore")
            .field("ready", &self.is_ready())
            .field("pending", &self.pending_count())
            .finish()
    }
}

fn replay(registry: &HandlerRegistry, buffer: EventBuffer) -> usize {
    let mut replayed = 0;

    for (level, events) in buffer.into_queues() {
        if !registry.has_subscribers(&level) {
            tracing::trace!(level = %level, count = events.len(), "No log handler subscribed, buffered events dropped");
            continue;
        }
        for event in &events {
            registry.deliver(event);
        }
        replayed += events.len();
    }

    replayed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::error::HandlerError;

    #[derive(Default)]
    struct Collect {
        seen: Mutex<Vec<(Level, String)>>,
    }

    impl Collect {
        fn messages(&self) -> Vec<String> {
            self.seen.lock().unwrap().iter().map(|(_, m)| m.clone()).collect()
        }
    }

    impl Handler for Collect {
        fn write(&self, event: &Event) -> Result<(), HandlerError> {
            self.seen
                .lock()
                .unwrap()
                .push((event.level().clone(), event.message().to_string()));
            Ok(())
        }
    }

    fn log(core: &LoggingCore, level: Level, msg: &str) {
        core.log(CallSite::caller(), level, None, None, format_args!("{}", msg));
    }

    #[test]
    fn test_core_buffers_until_initialized() {
        let core = LoggingCore::new();
        let sink = Arc::new(Collect::default());

        log(&core, Level::Info, "one");
        log(&core, Level::Info, "two");
        assert!(!core.is_ready());
        assert_eq!(core.pending_count(), 2);
        assert!(sink.messages().is_empty());

        core.initialize(vec![Subscription::new(sink.clone(), [Level::Info])]).unwrap();
        assert!(core.is_ready());
        assert_eq!(core.pending_count(), 0);
        assert_eq!(sink.messages(), vec!["one", "two"]);
    }

    #[test]
    fn test_second_initialize_is_rejected() {
        let core = LoggingCore::new();
        let first = Arc::new(Collect::default());
        let second = Arc::new(Collect::default());

        core.initialize(vec![Subscription::new(first.clone(), [Level::Warn])]).unwrap();
        let err = core
            .initialize(vec![Subscription::new(second.clone(), [Level::Warn])])
            .unwrap_err();
        assert!(matches!(err, LoggingError::AlreadyInitialized));

        log(&core, Level::Warn, "still first");
        assert_eq!(first.messages(), vec!["still first"]);
        assert!(second.messages().is_empty());
    }

    #[test]
    fn test_flush_without_config_uses_default_handler() {
        let fallback = Arc::new(Collect::default());
        let core = LoggingCore::with_default_handler(fallback.clone());

        log(&core, Level::Warn, "boot");
        assert_eq!(core.flush(), 1);
        assert!(core.is_ready());
        assert_eq!(fallback.messages(), vec!["boot"]);

        log(&core, Level::access(), "GET /");
        assert_eq!(fallback.messages(), vec!["boot", "GET /"]);
    }

    #[test]
    fn test_flush_twice_does_not_redeliver() {
        let fallback = Arc::new(Collect::default());
        let core = LoggingCore::with_default_handler(fallback.clone());

        log(&core, Level::Error, "once");
        core.flush();
        assert_eq!(core.flush(), 0);
        assert_eq!(fallback.messages(), vec!["once"]);
    }

    #[test]
    fn test_drop_flushes_pending_events() {
        let fallback = Arc::new(Collect::default());
        {
            let core = LoggingCore::with_default_handler(fallback.clone());
            log(&core, Level::Info, "late");
        }
        assert_eq!(fallback.messages(), vec!["late"]);
    }

    #[test]
    fn test_unsubscribed_level_after_ready_is_dropped() {
        let core = LoggingCore::new();
        let sink = Arc::new(Collect::default());
        core.initialize(vec![Subscription::new(sink.clone(), [Level::Error])]).unwrap();

        log(&core, Level::Debug, "ignored");
        assert!(sink.messages().is_empty());
        assert_eq!(core.pending_count(), 0);
    }
}
