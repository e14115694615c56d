//! Bus subscriber that mirrors game events into the log.
//!
//! UI collaborators would subscribe the same way; the headless host only
//! traces each event with its dotted name and JSON payload.

use guildhall_events::{EventSubscriber, GameEvent};
use tracing::{debug, warn};

/// Logs every event it receives at `debug`.
#[derive(Debug, Default)]
pub struct EventLog {
    seen: u64,
}

impl EventLog {
    /// Create a new event log.
    pub const fn new() -> Self {
        Self { seen: 0 }
    }
}

impl EventSubscriber for EventLog {
    fn on_event(&mut self, event: &GameEvent) {
        self.seen = self.seen.saturating_add(1);
        let kind = event.kind().as_str();
        match serde_json::to_string(event) {
            Ok(payload) => debug!(kind, seq = self.seen, %payload, "Game event"),
            Err(err) => warn!(kind, %err, "Game event could not be serialized"),
        }
    }
}

#[cfg(test)]
mod tests {
    use guildhall_events::{CycleStarted, EventBus, EventKind};

    use super::*;

    #[test]
    fn counts_what_it_sees() {
        let mut log = EventLog::new();
        log.on_event(&GameEvent::CycleStarted(CycleStarted { cycle: 1 }));
        log.on_event(&GameEvent::CycleStarted(CycleStarted { cycle: 2 }));
        assert_eq!(log.seen, 2);

        let mut bus = EventBus::new();
        bus.subscribe(EventLog::new());
        bus.publish(GameEvent::CycleStarted(CycleStarted { cycle: 1 }));
        assert_eq!(bus.count_of(EventKind::CycleStarted), 1);
    }
}
