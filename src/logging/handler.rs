use super::error::HandlerError;
use super::event::Event;
use super::level::Level;
use std::sync::Arc;

/// Output sink for log events.
///
/// `write` runs synchronously on the logging caller's thread. It must not
/// block indefinitely and must not log through the same core it is
/// registered with.
pub trait Handler: Send + Sync {
    fn write(&self, event: &Event) -> Result<(), HandlerError>;

    /// Name used in diagnostics when a write fails
    fn name(&self) -> &str {
        "handler"
    }
}

/// A handler together with the levels it receives.
#[derive(Clone)]
pub struct Subscription {
    pub handler: Arc<dyn Handler>,
    pub levels: Vec<Level>,
}

impl Subscription {
    pub fn new(handler: Arc<dyn Handler>, levels: impl IntoIterator<Item = Level>) -> Self {
        Self {
            handler,
            levels: levels.into_iter().collect(),
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("handler", &self.handler.name())
            .field("levels", &self.levels)
            .finish()
    }
}
