//! Level → handler routing table.
//!
//! The registry owns the canonical handler list; per-level routes are index
//! lists into it, so a handler subscribed to several levels is stored once.

use super::event::Event;
use super::handler::{Handler, Subscription};
use super::level::Level;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

pub struct HandlerRegistry {
    handlers: Vec<Arc<dyn Handler>>,
    routes: HashMap<Level, Vec<usize>>,
}

impl HandlerRegistry {
    /// Builds routes preserving subscription order within every level.
    pub fn new(subscriptions: Vec<Subscription>) -> Self {
        let mut handlers = Vec::with_capacity(subscriptions.len());
        let mut routes: HashMap<Level, Vec<usize>> = HashMap::new();

        for subscription in subscriptions {
            let index = handlers.len();
            handlers.push(subscription.handler);

            for level in subscription.levels {
                let route = routes.entry(level).or_default();
                // Listing a level twice must not double-deliver
                if !route.contains(&index) {
                    route.push(index);
                }
            }
        }

        Self { handlers, routes }
    }

    pub fn has_subscribers(&self, level: &Level) -> bool {
        self.routes.get(level).is_some_and(|route| !route.is_empty())
    }

    pub fn subscriber_count(&self, level: &Level) -> usize {
        self.routes.get(level).map_or(0, Vec::len)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Writes `event` to every handler routed for its level, in order.
    ///
    /// A handler returning an error or panicking is reported and skipped;
    /// the remaining handlers still run.
    pub fn deliver(&self, event: &Event) {
        let Some(route) = self.routes.get(event.level()) else {
            return;
        };

        for &index in route {
            let handler = &self.handlers[index];
            let result = panic::catch_unwind(AssertUnwindSafe(|| handler.write(event)));

            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(
                        handler = handler.name(),
                        level = %event.level(),
                        error = %e,
                        "Log handler write failed"
                    );
                }
                Err(_) => {
                    tracing::warn!(
                        handler = handler.name(),
                        level = %event.level(),
                        "Log handler panicked during write"
                    );
                }
            }
        }
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.handlers.iter().map(|h| h.name()).collect();
        f.debug_struct("HandlerRegistry")
            .field("handlers", &names)
            .field("routes", &self.routes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::error::HandlerError;
    use crate::logging::event::CallSite;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        tag: &'static str,
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl Handler for Recording {
        fn write(&self, event: &Event) -> Result<(), HandlerError> {
            self.seen
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.tag, event.message()));
            Ok(())
        }
    }

    fn event(level: Level, msg: &'static str) -> Event {
        Event::new(CallSite::caller(), level, None, None, format_args!("{}", msg))
    }

    #[test]
    fn test_registry_routes_by_level() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let registry = HandlerRegistry::new(vec![Subscription::new(
            Arc::new(Recording { tag: "a", seen: seen.clone() }),
            [Level::Error, Level::Fatal],
        )]);

        assert!(registry.has_subscribers(&Level::Error));
        assert!(registry.has_subscribers(&Level::Fatal));
        assert!(!registry.has_subscribers(&Level::Info));

        registry.deliver(&event(Level::Info, "x"));
        registry.deliver(&event(Level::Error, "y"));
        assert_eq!(*seen.lock().unwrap(), vec!["a:y"]);
    }

    #[test]
    fn test_registry_preserves_subscription_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let registry = HandlerRegistry::new(vec![
            Subscription::new(Arc::new(Recording { tag: "first", seen: seen.clone() }), [Level::Info]),
            Subscription::new(Arc::new(Recording { tag: "second", seen: seen.clone() }), [Level::Info]),
        ]);

        registry.deliver(&event(Level::Info, "m"));
        assert_eq!(*seen.lock().unwrap(), vec!["first:m", "second:m"]);
        assert_eq!(registry.subscriber_count(&Level::Info), 2);
    }

    #[test]
    fn test_registry_shares_handler_across_levels() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let registry = HandlerRegistry::new(vec![Subscription::new(
            Arc::new(Recording { tag: "a", seen }),
            [Level::Info, Level::Warn, Level::Info],
        )]);

        assert_eq!(registry.handler_count(), 1);
        assert_eq!(registry.subscriber_count(&Level::Info), 1);
        assert_eq!(registry.subscriber_count(&Level::Warn), 1);
    }
}
