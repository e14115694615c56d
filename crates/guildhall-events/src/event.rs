//! Typed game events.
//!
//! One payload struct per event kind. Serialized form is adjacently tagged
//! with the dotted event name, e.g.
//! `{"kind": "phase.started", "payload": {"cycle": 1, "phase": "auction_phase"}}`.

use guildhall_types::{
    AuctionPosition, ClaimStatus, ConstructId, ConstructType, InstallationId, MarketEvent,
    OutcomeTier, Phase, PlayerId, PositionMode, RejectionReason, ResourceKind, Standing,
    TerritoryId, Transaction, TransactionId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Cycle, phase, turn
// ---------------------------------------------------------------------------

/// A new cycle began.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CycleStarted {
    /// The cycle number, 1-based.
    pub cycle: u32,
}

/// A cycle finished its last phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CycleEnded {
    /// The cycle that ended.
    pub cycle: u32,
    /// Standings at the end of the cycle.
    pub standings: Vec<Standing>,
}

/// A phase began.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PhaseStarted {
    /// Current cycle.
    pub cycle: u32,
    /// The phase that started.
    pub phase: Phase,
}

/// A phase ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PhaseEnded {
    /// Current cycle.
    pub cycle: u32,
    /// The phase that ended.
    pub phase: Phase,
}

/// A player's turn began.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TurnStarted {
    /// Current cycle.
    pub cycle: u32,
    /// Current phase.
    pub phase: Phase,
    /// The player whose turn it is.
    pub player: PlayerId,
    /// Host time at which the turn is force-ended.
    pub deadline_ms: u64,
}

/// A player's turn ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TurnEnded {
    /// Current cycle.
    pub cycle: u32,
    /// Current phase.
    pub phase: Phase,
    /// The player whose turn ended.
    pub player: PlayerId,
    /// Whether the timer ran out rather than the player ending the turn.
    pub timed_out: bool,
}

/// The current turn is close to its deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TimerWarning {
    /// Current phase.
    pub phase: Phase,
    /// The player whose turn is running out.
    pub player: PlayerId,
    /// Warning mark that was crossed, in seconds remaining.
    pub remaining_secs: u64,
}

/// The current turn hit its deadline and was force-ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TimerExpired {
    /// Current phase.
    pub phase: Phase,
    /// The player whose turn expired.
    pub player: PlayerId,
}

// ---------------------------------------------------------------------------
// Territories
// ---------------------------------------------------------------------------

/// A claim was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TerritoryClaimed {
    /// Claimed territory.
    pub territory: TerritoryId,
    /// Claiming player.
    pub player: PlayerId,
    /// Whether another claim on the territory already existed.
    pub status: ClaimStatus,
}

/// A claim lost dispute resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TerritoryClaimRejected {
    /// Disputed territory.
    pub territory: TerritoryId,
    /// The losing player.
    pub player: PlayerId,
    /// The player who won the territory.
    pub winner: PlayerId,
}

/// A territory changed hands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TerritoryOwnershipChanged {
    /// The territory.
    pub territory: TerritoryId,
    /// Previous owner, if any.
    pub previous: Option<PlayerId>,
    /// New owner.
    pub owner: PlayerId,
}

/// All claims of a selection phase were resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TerritoriesResolved {
    /// Cycle whose claims were resolved.
    pub cycle: u32,
    /// Territories that gained an owner.
    pub awarded: u32,
    /// Claims that lost a dispute or could not be applied.
    pub rejected: u32,
}

// ---------------------------------------------------------------------------
// Constructs
// ---------------------------------------------------------------------------

/// A construct was bought into inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ConstructPurchased {
    /// New construct.
    pub construct: ConstructId,
    /// Buyer.
    pub player: PlayerId,
    /// Kind bought.
    pub construct_type: ConstructType,
    /// Gold paid.
    pub price: u64,
}

/// An active construct gained a level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ConstructUpgraded {
    /// The construct.
    pub construct: ConstructId,
    /// Owner.
    pub player: PlayerId,
    /// Level after the upgrade.
    pub level: u8,
    /// Gold paid.
    pub cost: u64,
}

/// A construct began installation on a territory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct InstallationStarted {
    /// The installation.
    pub installation: InstallationId,
    /// Construct being placed.
    pub construct: ConstructId,
    /// Target territory.
    pub territory: TerritoryId,
    /// Owning player.
    pub player: PlayerId,
    /// Host time at which the outcome is rolled.
    pub due_at_ms: u64,
}

/// An installation's outcome was rolled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct InstallationCompleted {
    /// The installation.
    pub installation: InstallationId,
    /// Construct that was placed.
    pub construct: ConstructId,
    /// Target territory.
    pub territory: TerritoryId,
    /// Owning player.
    pub player: PlayerId,
    /// Die face, `1..=6`.
    pub roll: u8,
    /// Outcome tier for the roll.
    pub tier: OutcomeTier,
    /// Whether the construct is now active.
    pub success: bool,
    /// Resulting efficiency.
    #[ts(as = "String")]
    pub efficiency: Decimal,
}

/// An installation was cancelled by its owner, or abandoned because it
/// could not be rolled; the construct is lost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct InstallationCancelled {
    /// The installation.
    pub installation: InstallationId,
    /// Construct that was lost.
    pub construct: ConstructId,
    /// Owning player.
    pub player: PlayerId,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Gold left a player's account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GoldDeducted {
    /// Account holder.
    pub player: PlayerId,
    /// Amount removed.
    pub amount: u64,
    /// Balance after the deduction.
    pub balance: u64,
    /// Why the gold was spent.
    pub reason: String,
}

/// Gold entered a player's account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GoldAdded {
    /// Account holder.
    pub player: PlayerId,
    /// Amount added.
    pub amount: u64,
    /// Balance after the credit.
    pub balance: u64,
    /// Why the gold was granted.
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Trades
// ---------------------------------------------------------------------------

/// A pending transaction was enqueued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TransactionCreated {
    /// The transaction.
    pub transaction: TransactionId,
    /// Buyer.
    pub buyer: PlayerId,
    /// Seller.
    pub seller: PlayerId,
    /// Resource to exchange.
    pub resource: ResourceKind,
    /// Gold per unit.
    pub unit_price: u64,
    /// Units to exchange.
    pub quantity: u64,
}

impl From<&Transaction> for TransactionCreated {
    fn from(tx: &Transaction) -> Self {
        Self {
            transaction: tx.id,
            buyer: tx.buyer,
            seller: tx.seller,
            resource: tx.resource,
            unit_price: tx.unit_price,
            quantity: tx.quantity,
        }
    }
}

/// A transaction settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TradeSettled {
    /// The transaction.
    pub transaction: TransactionId,
    /// Buyer.
    pub buyer: PlayerId,
    /// Seller.
    pub seller: PlayerId,
    /// Resource exchanged.
    pub resource: ResourceKind,
    /// Units exchanged.
    pub quantity: u64,
    /// Gold paid by the buyer.
    pub total: u64,
    /// Gold withheld into guild revenue.
    pub guild_tax: u64,
    /// Gold received by the seller.
    pub net: u64,
}

/// A transaction failed settlement. It is never retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TradeFailed {
    /// The transaction.
    pub transaction: TransactionId,
    /// Why it failed.
    pub reason: RejectionReason,
}

// ---------------------------------------------------------------------------
// Auction
// ---------------------------------------------------------------------------

/// The auction books opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AuctionOpened {
    /// Current cycle.
    pub cycle: u32,
    /// Host time at which the auction closes.
    pub closes_at_ms: u64,
}

/// A player's position was set, replaced or withdrawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AuctionPositionUpdated {
    /// Owning player.
    pub player: PlayerId,
    /// Resource book.
    pub resource: ResourceKind,
    /// Limit price.
    pub price: u64,
    /// Units; 0 means the position was withdrawn.
    pub quantity: u64,
    /// Buy or sell.
    pub mode: PositionMode,
}

impl From<&AuctionPosition> for AuctionPositionUpdated {
    fn from(p: &AuctionPosition) -> Self {
        Self {
            player: p.player,
            resource: p.resource,
            price: p.price,
            quantity: p.quantity,
            mode: p.mode,
        }
    }
}

/// A bid crossed an ask.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AuctionMatched {
    /// Resource book.
    pub resource: ResourceKind,
    /// Buying player.
    pub buyer: PlayerId,
    /// Selling player.
    pub seller: PlayerId,
    /// Trade price per unit (the ask).
    pub price: u64,
    /// Units matched.
    pub quantity: u64,
    /// Pending transaction handed to settlement, if it could be created.
    pub transaction: Option<TransactionId>,
}

/// The auction books closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AuctionClosed {
    /// Current cycle.
    pub cycle: u32,
    /// Unmatched positions discarded at close.
    pub cleared: u32,
}

/// A market event was rolled for the coming cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MarketEventRolled {
    /// The event.
    pub event: MarketEvent,
}

// ---------------------------------------------------------------------------
// Production and decay
// ---------------------------------------------------------------------------

/// Production began for a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ProductionStarted {
    /// Current cycle.
    pub cycle: u32,
}

/// Production finished for a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ProductionCompleted {
    /// Current cycle.
    pub cycle: u32,
    /// Active constructs that produced.
    pub constructs: u32,
    /// Total units credited.
    pub units: u64,
}

/// Decay began for a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DecayProcessing {
    /// Current cycle.
    pub cycle: u32,
}

/// Decay finished for a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DecayCompleted {
    /// Current cycle.
    pub cycle: u32,
    /// Total units removed across all players.
    pub units_lost: u64,
}

/// The final cycle ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GameEnded {
    /// Number of cycles played.
    pub cycles: u32,
    /// Final standings.
    pub standings: Vec<Standing>,
}

// ---------------------------------------------------------------------------
// The event enum
// ---------------------------------------------------------------------------

/// Every event the core publishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", content = "payload")]
#[ts(export, export_to = "bindings/")]
pub enum GameEvent {
    /// `cycle.started`
    #[serde(rename = "cycle.started")]
    CycleStarted(CycleStarted),
    /// `cycle.ended`
    #[serde(rename = "cycle.ended")]
    CycleEnded(CycleEnded),
    /// `phase.started`
    #[serde(rename = "phase.started")]
    PhaseStarted(PhaseStarted),
    /// `phase.ended`
    #[serde(rename = "phase.ended")]
    PhaseEnded(PhaseEnded),
    /// `turn.started`
    #[serde(rename = "turn.started")]
    TurnStarted(TurnStarted),
    /// `turn.ended`
    #[serde(rename = "turn.ended")]
    TurnEnded(TurnEnded),
    /// `timer.warning`
    #[serde(rename = "timer.warning")]
    TimerWarning(TimerWarning),
    /// `timer.expired`
    #[serde(rename = "timer.expired")]
    TimerExpired(TimerExpired),
    /// `territory.claimed`
    #[serde(rename = "territory.claimed")]
    TerritoryClaimed(TerritoryClaimed),
    /// `territory.claim_rejected`
    #[serde(rename = "territory.claim_rejected")]
    TerritoryClaimRejected(TerritoryClaimRejected),
    /// `territory.ownership_changed`
    #[serde(rename = "territory.ownership_changed")]
    TerritoryOwnershipChanged(TerritoryOwnershipChanged),
    /// `territories.resolved`
    #[serde(rename = "territories.resolved")]
    TerritoriesResolved(TerritoriesResolved),
    /// `construct.purchased`
    #[serde(rename = "construct.purchased")]
    ConstructPurchased(ConstructPurchased),
    /// `construct.upgraded`
    #[serde(rename = "construct.upgraded")]
    ConstructUpgraded(ConstructUpgraded),
    /// `installation.started`
    #[serde(rename = "installation.started")]
    InstallationStarted(InstallationStarted),
    /// `installation.completed`
    #[serde(rename = "installation.completed")]
    InstallationCompleted(InstallationCompleted),
    /// `installation.cancelled`
    #[serde(rename = "installation.cancelled")]
    InstallationCancelled(InstallationCancelled),
    /// `gold.deducted`
    #[serde(rename = "gold.deducted")]
    GoldDeducted(GoldDeducted),
    /// `gold.added`
    #[serde(rename = "gold.added")]
    GoldAdded(GoldAdded),
    /// `transaction.created`
    #[serde(rename = "transaction.created")]
    TransactionCreated(TransactionCreated),
    /// `trade.settled`
    #[serde(rename = "trade.settled")]
    TradeSettled(TradeSettled),
    /// `trade.failed`
    #[serde(rename = "trade.failed")]
    TradeFailed(TradeFailed),
    /// `auction.opened`
    #[serde(rename = "auction.opened")]
    AuctionOpened(AuctionOpened),
    /// `auction.position_updated`
    #[serde(rename = "auction.position_updated")]
    AuctionPositionUpdated(AuctionPositionUpdated),
    /// `auction.matched`
    #[serde(rename = "auction.matched")]
    AuctionMatched(AuctionMatched),
    /// `auction.closed`
    #[serde(rename = "auction.closed")]
    AuctionClosed(AuctionClosed),
    /// `market.event`
    #[serde(rename = "market.event")]
    MarketEvent(MarketEventRolled),
    /// `resource_production.started`
    #[serde(rename = "resource_production.started")]
    ProductionStarted(ProductionStarted),
    /// `resource_production.completed`
    #[serde(rename = "resource_production.completed")]
    ProductionCompleted(ProductionCompleted),
    /// `resource_decay.processing`
    #[serde(rename = "resource_decay.processing")]
    DecayProcessing(DecayProcessing),
    /// `resource_decay.completed`
    #[serde(rename = "resource_decay.completed")]
    DecayCompleted(DecayCompleted),
    /// `game.ended`
    #[serde(rename = "game.ended")]
    GameEnded(GameEnded),
}

/// Discriminant of [`GameEvent`], used for subscription filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum EventKind {
    /// `cycle.started`
    CycleStarted,
    /// `cycle.ended`
    CycleEnded,
    /// `phase.started`
    PhaseStarted,
    /// `phase.ended`
    PhaseEnded,
    /// `turn.started`
    TurnStarted,
    /// `turn.ended`
    TurnEnded,
    /// `timer.warning`
    TimerWarning,
    /// `timer.expired`
    TimerExpired,
    /// `territory.claimed`
    TerritoryClaimed,
    /// `territory.claim_rejected`
    TerritoryClaimRejected,
    /// `territory.ownership_changed`
    TerritoryOwnershipChanged,
    /// `territories.resolved`
    TerritoriesResolved,
    /// `construct.purchased`
    ConstructPurchased,
    /// `construct.upgraded`
    ConstructUpgraded,
    /// `installation.started`
    InstallationStarted,
    /// `installation.completed`
    InstallationCompleted,
    /// `installation.cancelled`
    InstallationCancelled,
    /// `gold.deducted`
    GoldDeducted,
    /// `gold.added`
    GoldAdded,
    /// `transaction.created`
    TransactionCreated,
    /// `trade.settled`
    TradeSettled,
    /// `trade.failed`
    TradeFailed,
    /// `auction.opened`
    AuctionOpened,
    /// `auction.position_updated`
    AuctionPositionUpdated,
    /// `auction.matched`
    AuctionMatched,
    /// `auction.closed`
    AuctionClosed,
    /// `market.event`
    MarketEvent,
    /// `resource_production.started`
    ProductionStarted,
    /// `resource_production.completed`
    ProductionCompleted,
    /// `resource_decay.processing`
    DecayProcessing,
    /// `resource_decay.completed`
    DecayCompleted,
    /// `game.ended`
    GameEnded,
}

impl EventKind {
    /// Dotted wire name, e.g. `"phase.started"`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CycleStarted => "cycle.started",
            Self::CycleEnded => "cycle.ended",
            Self::PhaseStarted => "phase.started",
            Self::PhaseEnded => "phase.ended",
            Self::TurnStarted => "turn.started",
            Self::TurnEnded => "turn.ended",
            Self::TimerWarning => "timer.warning",
            Self::TimerExpired => "timer.expired",
            Self::TerritoryClaimed => "territory.claimed",
            Self::TerritoryClaimRejected => "territory.claim_rejected",
            Self::TerritoryOwnershipChanged => "territory.ownership_changed",
            Self::TerritoriesResolved => "territories.resolved",
            Self::ConstructPurchased => "construct.purchased",
            Self::ConstructUpgraded => "construct.upgraded",
            Self::InstallationStarted => "installation.started",
            Self::InstallationCompleted => "installation.completed",
            Self::InstallationCancelled => "installation.cancelled",
            Self::GoldDeducted => "gold.deducted",
            Self::GoldAdded => "gold.added",
            Self::TransactionCreated => "transaction.created",
            Self::TradeSettled => "trade.settled",
            Self::TradeFailed => "trade.failed",
            Self::AuctionOpened => "auction.opened",
            Self::AuctionPositionUpdated => "auction.position_updated",
            Self::AuctionMatched => "auction.matched",
            Self::AuctionClosed => "auction.closed",
            Self::MarketEvent => "market.event",
            Self::ProductionStarted => "resource_production.started",
            Self::ProductionCompleted => "resource_production.completed",
            Self::DecayProcessing => "resource_decay.processing",
            Self::DecayCompleted => "resource_decay.completed",
            Self::GameEnded => "game.ended",
        }
    }
}

impl core::fmt::Display for EventKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl GameEvent {
    /// The discriminant of this event.
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::CycleStarted(_) => EventKind::CycleStarted,
            Self::CycleEnded(_) => EventKind::CycleEnded,
            Self::PhaseStarted(_) => EventKind::PhaseStarted,
            Self::PhaseEnded(_) => EventKind::PhaseEnded,
            Self::TurnStarted(_) => EventKind::TurnStarted,
            Self::TurnEnded(_) => EventKind::TurnEnded,
            Self::TimerWarning(_) => EventKind::TimerWarning,
            Self::TimerExpired(_) => EventKind::TimerExpired,
            Self::TerritoryClaimed(_) => EventKind::TerritoryClaimed,
            Self::TerritoryClaimRejected(_) => EventKind::TerritoryClaimRejected,
            Self::TerritoryOwnershipChanged(_) => EventKind::TerritoryOwnershipChanged,
            Self::TerritoriesResolved(_) => EventKind::TerritoriesResolved,
            Self::ConstructPurchased(_) => EventKind::ConstructPurchased,
            Self::ConstructUpgraded(_) => EventKind::ConstructUpgraded,
            Self::InstallationStarted(_) => EventKind::InstallationStarted,
            Self::InstallationCompleted(_) => EventKind::InstallationCompleted,
            Self::InstallationCancelled(_) => EventKind::InstallationCancelled,
            Self::GoldDeducted(_) => EventKind::GoldDeducted,
            Self::GoldAdded(_) => EventKind::GoldAdded,
            Self::TransactionCreated(_) => EventKind::TransactionCreated,
            Self::TradeSettled(_) => EventKind::TradeSettled,
            Self::TradeFailed(_) => EventKind::TradeFailed,
            Self::AuctionOpened(_) => EventKind::AuctionOpened,
            Self::AuctionPositionUpdated(_) => EventKind::AuctionPositionUpdated,
            Self::AuctionMatched(_) => EventKind::AuctionMatched,
            Self::AuctionClosed(_) => EventKind::AuctionClosed,
            Self::MarketEvent(_) => EventKind::MarketEvent,
            Self::ProductionStarted(_) => EventKind::ProductionStarted,
            Self::ProductionCompleted(_) => EventKind::ProductionCompleted,
            Self::DecayProcessing(_) => EventKind::DecayProcessing,
            Self::DecayCompleted(_) => EventKind::DecayCompleted,
            Self::GameEnded(_) => EventKind::GameEnded,
        }
    }
}
