//! Core entity structs for the Guildhall core.
//!
//! Entities are plain data. Balances and ownership are mutated only by the
//! ledger and registry crates; these types carry no behaviour beyond small
//! derived accessors.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::enums::{
    Asset, ConstructStatus, ConstructType, LedgerEntryType, PartyKind, Phase, PositionMode,
    RejectionReason, ResourceKind, Terrain, TransactionStatus,
};
use crate::ids::{
    ConstructId, InstallationId, LedgerEntryId, PlayerId, TerritoryId, TransactionId,
};

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

/// A seated participant. Balances live in the ledger, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Player {
    /// Unique player identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Whether decisions come from the AI stand-in rather than a human.
    pub is_ai: bool,
    /// Turn order seat, 0-based.
    pub seat: u32,
}

/// Read model assembling a player's identity, balances and holdings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlayerSnapshot {
    /// Player identifier.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// AI flag.
    pub is_ai: bool,
    /// Gold balance.
    pub gold: u64,
    /// Stored resources by kind.
    pub resources: BTreeMap<ResourceKind, u64>,
    /// Constructs owned, in any status.
    pub constructs: Vec<ConstructId>,
    /// Territories owned.
    pub territories: Vec<TerritoryId>,
}

/// One row of the standings table emitted at cycle and game end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Standing {
    /// 1-based rank. Equal net worth falls back to seat order.
    pub rank: u32,
    /// Player identifier.
    pub player: PlayerId,
    /// Display name.
    pub name: String,
    /// Gold balance.
    pub gold: u64,
    /// Value of stored resources at the current reference prices.
    pub resource_value: u64,
    /// Number of territories owned.
    pub territories: u32,
    /// `gold + resource_value`.
    pub net_worth: u64,
}

// ---------------------------------------------------------------------------
// Map
// ---------------------------------------------------------------------------

/// Axial hex coordinate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct AxialCoord {
    /// Column axis.
    pub q: i32,
    /// Row axis.
    pub r: i32,
}

impl AxialCoord {
    /// Construct a coordinate.
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }
}

/// A hex on the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Territory {
    /// Unique territory identifier.
    pub id: TerritoryId,
    /// Position on the hex grid.
    pub coord: AxialCoord,
    /// Terrain kind.
    pub terrain: Terrain,
    /// Current owner, if claimed.
    pub owner: Option<PlayerId>,
    /// Per-resource richness shown to players. Production ignores it.
    /// Missing entries mean 1.
    #[ts(as = "BTreeMap<ResourceKind, String>")]
    pub base_modifiers: BTreeMap<ResourceKind, Decimal>,
    /// The single installed construct, if any.
    pub construct: Option<ConstructId>,
}

impl Territory {
    /// Displayed multiplier for `resource`, defaulting to 1.
    pub fn modifier_for(&self, resource: ResourceKind) -> Decimal {
        self.base_modifiers
            .get(&resource)
            .copied()
            .unwrap_or(Decimal::ONE)
    }
}

// ---------------------------------------------------------------------------
// Constructs
// ---------------------------------------------------------------------------

/// A purchased production unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Construct {
    /// Unique construct identifier.
    pub id: ConstructId,
    /// Kind of construct.
    pub construct_type: ConstructType,
    /// Level, `1..=3`.
    pub level: u8,
    /// Owning player.
    pub owner: PlayerId,
    /// Lifecycle status.
    pub status: ConstructStatus,
    /// Output multiplier. 0 is inert, 1 nominal.
    #[ts(as = "String")]
    pub efficiency: Decimal,
    /// Territory the construct is installed on, while active.
    pub territory: Option<TerritoryId>,
}

/// An in-flight installation awaiting its outcome roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Installation {
    /// Unique installation identifier.
    pub id: InstallationId,
    /// Construct being placed.
    pub construct: ConstructId,
    /// Target territory.
    pub territory: TerritoryId,
    /// Player who started the installation.
    pub player: PlayerId,
    /// Host monotonic time the installation started, in milliseconds.
    pub started_at_ms: u64,
    /// How long the installation takes, in milliseconds.
    pub duration_ms: u64,
}

impl Installation {
    /// Host time at which the installation becomes due.
    pub const fn due_at_ms(&self) -> u64 {
        self.started_at_ms.saturating_add(self.duration_ms)
    }
}

// ---------------------------------------------------------------------------
// Claims
// ---------------------------------------------------------------------------

/// A player's request to own a territory, resolved at the end of the
/// selection phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Claim {
    /// Territory claimed.
    pub territory: TerritoryId,
    /// Claiming player.
    pub player: PlayerId,
    /// Cycle in which the claim was made.
    pub cycle: u32,
    /// Phase in which the claim was made.
    pub phase: Phase,
    /// Submission sequence number across all claims of the phase.
    pub seq: u64,
    /// Host monotonic time of the claim, in milliseconds.
    pub claimed_at_ms: u64,
}

// ---------------------------------------------------------------------------
// Market
// ---------------------------------------------------------------------------

/// A two-party exchange of gold for a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Transaction {
    /// Unique transaction identifier.
    pub id: TransactionId,
    /// Player paying gold and receiving the resource.
    pub buyer: PlayerId,
    /// Player delivering the resource and receiving net gold.
    pub seller: PlayerId,
    /// Resource exchanged.
    pub resource: ResourceKind,
    /// Gold per unit.
    pub unit_price: u64,
    /// Units exchanged.
    pub quantity: u64,
    /// Tax withheld into guild revenue. Set at settlement.
    pub guild_tax: Option<u64>,
    /// Settlement status.
    pub status: TransactionStatus,
    /// Why settlement failed, if it did.
    pub failure: Option<RejectionReason>,
    /// Host monotonic time of creation, in milliseconds.
    pub created_at_ms: u64,
    /// Enqueue sequence number.
    pub seq: u64,
}

impl Transaction {
    /// `unit_price * quantity`, or `None` on overflow.
    pub const fn total(&self) -> Option<u64> {
        self.unit_price.checked_mul(self.quantity)
    }
}

/// A standing order in an auction book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AuctionPosition {
    /// Owning player.
    pub player: PlayerId,
    /// Resource the position trades.
    pub resource: ResourceKind,
    /// Limit price per unit.
    pub price: u64,
    /// Remaining units.
    pub quantity: u64,
    /// Buy or sell.
    pub mode: PositionMode,
    /// Submission sequence; lower wins price ties.
    pub seq: u64,
    /// Host monotonic time of submission, in milliseconds.
    pub submitted_at_ms: u64,
}

/// A market event affecting displayed reference prices for one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MarketEvent {
    /// Headline shown to players.
    pub name: String,
    /// Cycle the event applies to.
    pub cycle: u32,
    /// Reference price multiplier per resource. Missing entries mean 1.
    #[ts(as = "BTreeMap<ResourceKind, String>")]
    pub modifiers: BTreeMap<ResourceKind, Decimal>,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// One double-entry journal record.
///
/// Every balance movement produces exactly one entry. Replaying the journal
/// from empty accounts reproduces the live balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LedgerEntry {
    /// Unique entry identifier.
    pub id: LedgerEntryId,
    /// Position in the journal.
    pub seq: u64,
    /// Category of movement.
    pub entry_type: LedgerEntryType,
    /// Source party kind.
    pub from_kind: PartyKind,
    /// Source player, when `from_kind` is `Player`.
    pub from_player: Option<PlayerId>,
    /// Destination party kind.
    pub to_kind: PartyKind,
    /// Destination player, when `to_kind` is `Player`.
    pub to_player: Option<PlayerId>,
    /// What moved.
    pub asset: Asset,
    /// How much moved. Always positive.
    pub quantity: u64,
    /// Free-form reason (e.g. `"purchase"`, `"trade"`).
    pub reason: String,
    /// Related entity such as a transaction or construct id.
    pub reference_id: Option<Uuid>,
    /// Wall-clock time of the entry.
    pub created_at: DateTime<Utc>,
}
