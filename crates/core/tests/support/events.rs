//! Recording event sink.

use std::sync::Mutex;

use chime_core::session::ports::EventSink;
use chime_domain::SessionEvent;

/// Captures every emitted `SessionEvent` for later assertions.
#[derive(Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<SessionEvent>>,
}

impl RecordingEventSink {
    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().expect("events lock").clone()
    }

    pub fn contains(&self, predicate: impl Fn(&SessionEvent) -> bool) -> bool {
        self.events().iter().any(|event| predicate(event))
    }

    pub fn count(&self, predicate: impl Fn(&SessionEvent) -> bool) -> usize {
        self.events().iter().filter(|event| predicate(event)).count()
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: SessionEvent) {
        self.events.lock().expect("events lock").push(event);
    }
}
