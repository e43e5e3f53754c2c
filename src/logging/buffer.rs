use super::event::Event;
use super::level::Level;
use std::collections::HashMap;

/// Events held back until a handler registry is installed.
///
/// Order across levels is not tracked; within a level events stay in
/// arrival order.
#[derive(Debug, Default)]
pub struct EventBuffer {
    queues: HashMap<Level, Vec<Event>>,
    len: usize,
}

impl EventBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        self.queues
            .entry(event.level().clone())
            .or_default()
            .push(event);
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Moves all queued events out, leaving this buffer empty.
    pub fn take(&mut self) -> EventBuffer {
        std::mem::take(self)
    }

    pub fn into_queues(self) -> impl Iterator<Item = (Level, Vec<Event>)> {
        self.queues.into_iter()
    }
}
