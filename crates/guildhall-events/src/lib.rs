//! Typed events and the event bus for the Guildhall core.
//!
//! Every state change in the core is announced as a [`GameEvent`]. UI
//! collaborators subscribe to the bus and react; they never reach into game
//! state directly. Dispatch is synchronous and ordered.
//!
//! # Modules
//!
//! - [`event`] -- The [`GameEvent`] enum, one payload struct per event kind
//! - [`bus`] -- [`EventBus`] with kind filters and bounded history

pub mod bus;
pub mod event;

pub use bus::{EventBus, EventSubscriber, RecordedEvent, SubscriptionId};
pub use event::{
    AuctionClosed, AuctionMatched, AuctionOpened, AuctionPositionUpdated, ConstructPurchased,
    ConstructUpgraded, CycleEnded, CycleStarted, DecayCompleted, DecayProcessing, EventKind,
    GameEnded, GameEvent, GoldAdded, GoldDeducted, InstallationCancelled, InstallationCompleted,
    InstallationStarted, MarketEventRolled, PhaseEnded, PhaseStarted, ProductionCompleted,
    ProductionStarted, TerritoriesResolved, TerritoryClaimRejected, TerritoryClaimed,
    TerritoryOwnershipChanged, TimerExpired, TimerWarning, TradeFailed, TradeSettled,
    TransactionCreated, TurnEnded, TurnStarted,
};

#[cfg(test)]
mod tests {
    #[test]
    fn export_bindings() {
        use ts_rs::TS;

        let _ = crate::event::GameEvent::export_all();
        let _ = crate::event::EventKind::export_all();
    }
}
