use serde::{Deserialize, Serialize};

/// Session notification for the embedding UI layer.
///
/// Each event carries everything the UI needs to react, so handlers never
/// have to reach back into the session from a callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameEvent {
    /// The local player just became IT.
    BecameIt,
    /// The round is over; the named player held IT the longest.
    RoundEnded { loser_name: String, time_as_it: f32 },
    /// A player joined or left the room.
    PlayerCountChanged { count: usize },
    /// The realtime connection could not be established.
    ConnectionFailed { reason: String },
}

/// Observer for session notifications.
///
/// Implementations must not call back into the session; they run inside
/// its update path.
pub trait EventSink: Send {
    fn emit(&mut self, event: GameEvent);
}

/// Sink that discards everything. For headless or driven sessions.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: GameEvent) {}
}

/// Sink that records every event for later inspection. Clones share the
/// same log.
#[cfg(any(test, feature = "test-helpers"))]
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    events: std::sync::Arc<std::sync::Mutex<Vec<GameEvent>>>,
}

#[cfg(any(test, feature = "test-helpers"))]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything emitted so far, in order.
    pub fn events(&self) -> Vec<GameEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count_of(&self, predicate: impl Fn(&GameEvent) -> bool) -> usize {
        self.events().iter().filter(|e| predicate(e)).count()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl EventSink for RecordingSink {
    fn emit(&mut self, event: GameEvent) {
        self.events.lock().unwrap().push(event);
    }
}
