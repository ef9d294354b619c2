//! Notifier that records every event.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::port::{Event, OrderNotifier};

/// Records events for later assertions. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Number of `ConnectionExhausted` events seen.
    pub fn exhausted_count(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| matches!(event, Event::ConnectionExhausted { .. }))
            .count()
    }
}

impl OrderNotifier for RecordingNotifier {
    fn notify(&self, event: Event) {
        self.events.lock().push(event);
    }
}
