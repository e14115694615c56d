//! Synchronous publish/subscribe bus.
//!
//! [`EventBus::publish`] dispatches to every matching subscriber in
//! subscription order before returning, then appends the event to a bounded
//! history. Nothing is queued across calls. Subscribers receive a shared
//! reference and cannot publish back into the bus.

use std::collections::{BTreeSet, VecDeque};

use tracing::trace;

use crate::event::{EventKind, GameEvent};

/// Default number of events retained in [`EventBus::history`].
pub const DEFAULT_HISTORY_CAPACITY: usize = 1024;

/// Receiver of published events.
pub trait EventSubscriber {
    /// Handle one event. Called synchronously from [`EventBus::publish`].
    fn on_event(&mut self, event: &GameEvent);
}

impl<F> EventSubscriber for F
where
    F: FnMut(&GameEvent),
{
    fn on_event(&mut self, event: &GameEvent) {
        self(event);
    }
}

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

/// An event as retained in history, with its publication sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    /// Monotonic publication counter, starting at 0.
    pub seq: u64,
    /// The event.
    pub event: GameEvent,
}

struct Subscription {
    id: SubscriptionId,
    filter: Option<BTreeSet<EventKind>>,
    subscriber: Box<dyn EventSubscriber>,
}

impl Subscription {
    fn wants(&self, kind: EventKind) -> bool {
        self.filter.as_ref().is_none_or(|kinds| kinds.contains(&kind))
    }
}

/// The event bus.
pub struct EventBus {
    subscriptions: Vec<Subscription>,
    history: VecDeque<RecordedEvent>,
    capacity: usize,
    next_seq: u64,
    next_subscription: u64,
}

impl core::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.subscriptions.len())
            .field("history", &self.history.len())
            .field("capacity", &self.capacity)
            .field("next_seq", &self.next_seq)
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Create a bus retaining [`DEFAULT_HISTORY_CAPACITY`] events.
    pub fn new() -> Self {
        Self::with_history_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create a bus retaining at most `capacity` events in history.
    pub fn with_history_capacity(capacity: usize) -> Self {
        Self {
            subscriptions: Vec::new(),
            history: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY)),
            capacity,
            next_seq: 0,
            next_subscription: 0,
        }
    }

    /// Subscribe to every event.
    pub fn subscribe(&mut self, subscriber: impl EventSubscriber + 'static) -> SubscriptionId {
        self.register(None, Box::new(subscriber))
    }

    /// Subscribe to the listed kinds only.
    pub fn subscribe_to(
        &mut self,
        kinds: impl IntoIterator<Item = EventKind>,
        subscriber: impl EventSubscriber + 'static,
    ) -> SubscriptionId {
        let filter = kinds.into_iter().collect();
        self.register(Some(filter), Box::new(subscriber))
    }

    /// Remove a subscription. Returns whether it existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    /// Publish an event to every matching subscriber, in subscription order.
    pub fn publish(&mut self, event: GameEvent) {
        let kind = event.kind();
        trace!(kind = kind.as_str(), seq = self.next_seq, "Publishing event");

        for subscription in &mut self.subscriptions {
            if subscription.wants(kind) {
                subscription.subscriber.on_event(&event);
            }
        }

        if self.capacity > 0 {
            if self.history.len() >= self.capacity {
                self.history.pop_front();
            }
            self.history.push_back(RecordedEvent {
                seq: self.next_seq,
                event,
            });
        }
        self.next_seq = self.next_seq.saturating_add(1);
    }

    /// Retained events, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &RecordedEvent> {
        self.history.iter()
    }

    /// Retained events of one kind, oldest first.
    pub fn history_of(&self, kind: EventKind) -> impl Iterator<Item = &GameEvent> {
        self.history
            .iter()
            .map(|r| &r.event)
            .filter(move |e| e.kind() == kind)
    }

    /// Count of retained events of one kind.
    pub fn count_of(&self, kind: EventKind) -> usize {
        self.history_of(kind).count()
    }

    /// Total number of events ever published.
    pub const fn published(&self) -> u64 {
        self.next_seq
    }

    /// Drop all retained history. Subscriptions are kept.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    fn register(
        &mut self,
        filter: Option<BTreeSet<EventKind>>,
        subscriber: Box<dyn EventSubscriber>,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription = self.next_subscription.saturating_add(1);
        self.subscriptions.push(Subscription {
            id,
            filter,
            subscriber,
        });
        id
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use guildhall_types::Phase;

    use super::*;
    use crate::event::{CycleStarted, PhaseStarted};

    fn phase_started(cycle: u32) -> GameEvent {
        GameEvent::PhaseStarted(PhaseStarted {
            cycle,
            phase: Phase::TerritorySelection,
        })
    }

    #[test]
    fn dispatches_in_subscription_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();

        let first = Rc::clone(&log);
        bus.subscribe(move |_: &GameEvent| first.borrow_mut().push("first"));
        let second = Rc::clone(&log);
        bus.subscribe(move |_: &GameEvent| second.borrow_mut().push("second"));

        bus.publish(phase_started(1));
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn filtered_subscriber_sees_only_its_kinds() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        let sink = Rc::clone(&seen);
        bus.subscribe_to([EventKind::CycleStarted], move |e: &GameEvent| {
            sink.borrow_mut().push(e.kind());
        });

        bus.publish(phase_started(1));
        bus.publish(GameEvent::CycleStarted(CycleStarted { cycle: 2 }));

        assert_eq!(*seen.borrow(), vec![EventKind::CycleStarted]);
        assert_eq!(bus.count_of(EventKind::PhaseStarted), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let count = Rc::new(RefCell::new(0u32));
        let mut bus = EventBus::new();
        let sink = Rc::clone(&count);
        let id = bus.subscribe(move |_: &GameEvent| *sink.borrow_mut() += 1);

        bus.publish(phase_started(1));
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(phase_started(2));

        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn history_is_bounded_and_keeps_newest() {
        let mut bus = EventBus::with_history_capacity(2);
        for cycle in 1..=3 {
            bus.publish(GameEvent::CycleStarted(CycleStarted { cycle }));
        }
        let seqs: Vec<u64> = bus.history().map(|r| r.seq).collect();
        assert_eq!(seqs, vec![1, 2]);
        assert_eq!(bus.published(), 3);
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let mut bus = EventBus::with_history_capacity(0);
        bus.publish(phase_started(1));
        assert_eq!(bus.history().count(), 0);
        assert_eq!(bus.published(), 1);
    }
}
