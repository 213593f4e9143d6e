// Event sinks
//
// Sinks must not block: the core calls `emit` on hot paths, outside of its
// table locks, and expects the call to return promptly.

use crate::event::SecurityEvent;
use parking_lot::Mutex;
use tracing::info;

/// Receiver for security events emitted by the authentication core
pub trait EventSink: Send + Sync {
    fn emit(&self, event: SecurityEvent);
}

/// Sink that forwards events to the `tracing` subscriber as structured records
#[derive(Debug, Default, Clone)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: SecurityEvent) {
        let envelope = event.to_envelope();
        info!(
            target: "auth_events",
            event = envelope.event_type,
            payload = %envelope.data,
            "security event"
        );
    }
}

/// Sink that buffers events in memory, used by tests and local tooling
#[derive(Debug, Default)]
pub struct CapturingSink {
    events: Mutex<Vec<SecurityEvent>>,
}

impl CapturingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain all captured events
    pub fn take(&self) -> Vec<SecurityEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Snapshot of captured event names, in emission order
    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(SecurityEvent::name).collect()
    }

    /// Number of captured events matching `name`
    pub fn count_of(&self, name: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| event.name() == name)
            .count()
    }
}

impl EventSink for CapturingSink {
    fn emit(&self, event: SecurityEvent) {
        self.events.lock().push(event);
    }
}

/// Sink that discards everything
#[derive(Debug, Default, Clone)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: SecurityEvent) {}
}
