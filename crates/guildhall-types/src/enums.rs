//! Enumeration types for the Guildhall core.
//!
//! Resources, terrain, construct kinds and lifecycle, the fixed phase order
//! of a cycle, auction and transaction modes, and the rejection reasons
//! returned by every command entry point.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Resources and terrain
// ---------------------------------------------------------------------------

/// A typed resource held in player balances and traded at auction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ResourceKind {
    /// Grain and livestock from farmland.
    Food,
    /// Timber from forests.
    Wood,
    /// Cut stone from hill quarries.
    Stone,
    /// Metal ore from mountain mines.
    Ore,
}

impl ResourceKind {
    /// Every resource kind, in canonical order.
    pub const ALL: [Self; 4] = [Self::Food, Self::Wood, Self::Stone, Self::Ore];

    /// Stable lowercase name used in configuration keys and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Wood => "wood",
            Self::Stone => "stone",
            Self::Ore => "ore",
        }
    }
}

impl core::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terrain of a territory hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Terrain {
    /// Open farmland.
    Plains,
    /// Woodland.
    Forest,
    /// Rocky hills.
    Hills,
    /// High peaks.
    Mountains,
    /// Arid waste; ideal for nothing.
    Desert,
}

impl Terrain {
    /// Every terrain kind, in canonical order.
    pub const ALL: [Self; 5] = [
        Self::Plains,
        Self::Forest,
        Self::Hills,
        Self::Mountains,
        Self::Desert,
    ];
}

// ---------------------------------------------------------------------------
// Constructs
// ---------------------------------------------------------------------------

/// The kind of a placeable production unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ConstructType {
    /// Produces food; best on plains.
    Farm,
    /// Produces wood; best in forests.
    LumberMill,
    /// Produces stone; best on hills.
    Quarry,
    /// Produces ore; best in mountains.
    Mine,
}

impl ConstructType {
    /// Every construct type, in canonical order.
    pub const ALL: [Self; 4] = [Self::Farm, Self::LumberMill, Self::Quarry, Self::Mine];

    /// The resource this construct produces.
    pub const fn produces(self) -> ResourceKind {
        match self {
            Self::Farm => ResourceKind::Food,
            Self::LumberMill => ResourceKind::Wood,
            Self::Quarry => ResourceKind::Stone,
            Self::Mine => ResourceKind::Ore,
        }
    }

    /// The terrain on which this construct earns the terrain-match bonus.
    pub const fn ideal_terrain(self) -> Terrain {
        match self {
            Self::Farm => Terrain::Plains,
            Self::LumberMill => Terrain::Forest,
            Self::Quarry => Terrain::Hills,
            Self::Mine => Terrain::Mountains,
        }
    }
}

/// Lifecycle status of a construct.
///
/// The transition graph is acyclic:
///
/// ```text
/// Inventory -> Placing -> { Active, Damaged, Lost }
/// Active    -> Damaged
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ConstructStatus {
    /// Purchased, held by the owner, not yet placed.
    Inventory,
    /// Installation in flight; outcome not yet rolled.
    Placing,
    /// Installed and producing at its efficiency.
    Active,
    /// Installation failed or later damage; inert.
    Damaged,
    /// Destroyed by a critical failure or a cancelled installation.
    Lost,
}

impl ConstructStatus {
    /// Whether the lifecycle graph permits moving from `self` to `next`.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Inventory, Self::Placing)
                | (Self::Placing, Self::Active | Self::Damaged | Self::Lost)
                | (Self::Active, Self::Damaged)
        )
    }
}

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

/// A named stage within a cycle. Phases run in the fixed order of
/// [`Phase::ORDER`] and wrap to the next cycle after `EndCycleEvents`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Phase {
    /// Players claim unowned territories, one turn each.
    TerritorySelection,
    /// Players buy, install, upgrade and cancel constructs, one turn each.
    ConstructOutfitting,
    /// Timed auction window; positions may be set by any player.
    AuctionPhase,
    /// Active constructs yield resources; no player input.
    ResourceProduction,
    /// Stored resources decay; no player input.
    ResourceDecay,
    /// Market events and cycle standings; no player input.
    EndCycleEvents,
}

impl Phase {
    /// The fixed cyclic order of phases within one cycle.
    pub const ORDER: [Self; 6] = [
        Self::TerritorySelection,
        Self::ConstructOutfitting,
        Self::AuctionPhase,
        Self::ResourceProduction,
        Self::ResourceDecay,
        Self::EndCycleEvents,
    ];

    /// Position of this phase within [`Phase::ORDER`].
    pub const fn index(self) -> usize {
        match self {
            Self::TerritorySelection => 0,
            Self::ConstructOutfitting => 1,
            Self::AuctionPhase => 2,
            Self::ResourceProduction => 3,
            Self::ResourceDecay => 4,
            Self::EndCycleEvents => 5,
        }
    }

    /// Snake-case name as used in event payloads and configuration.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TerritorySelection => "territory_selection",
            Self::ConstructOutfitting => "construct_outfitting",
            Self::AuctionPhase => "auction_phase",
            Self::ResourceProduction => "resource_production",
            Self::ResourceDecay => "resource_decay",
            Self::EndCycleEvents => "end_cycle_events",
        }
    }

    /// Whether the phase hands out turns through the turn sequencer.
    pub const fn is_turn_sequenced(self) -> bool {
        matches!(self, Self::TerritorySelection | Self::ConstructOutfitting)
    }

    /// Whether the phase accepts any player input at all.
    pub const fn accepts_player_input(self) -> bool {
        matches!(
            self,
            Self::TerritorySelection | Self::ConstructOutfitting | Self::AuctionPhase
        )
    }
}

impl core::fmt::Display for Phase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Market
// ---------------------------------------------------------------------------

/// Side of an auction position or a proposed trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum PositionMode {
    /// Willing to pay up to `price` per unit.
    Buy,
    /// Willing to accept at least `price` per unit.
    Sell,
}

/// Settlement status of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum TransactionStatus {
    /// Enqueued; no funds have moved.
    Pending,
    /// Settled; immutable.
    Completed,
    /// Rejected at settlement; kept for the record, never retried.
    Failed,
}

/// Standing of a recorded claim before the selection phase resolves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ClaimStatus {
    /// The only claim on its territory this phase.
    Pending,
    /// One of several claims on the same territory this phase.
    Disputed,
}

// ---------------------------------------------------------------------------
// Installation outcomes
// ---------------------------------------------------------------------------

/// Tier of an installation outcome, one per face of a six-sided die.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum OutcomeTier {
    /// Roll 1. The construct is lost.
    CriticalFailure,
    /// Roll 2. The construct is damaged.
    Failure,
    /// Roll 3. Active at reduced efficiency.
    PartialSuccess,
    /// Roll 4. Active at nominal efficiency.
    Success,
    /// Roll 5. Active with a bonus.
    GreatSuccess,
    /// Roll 6. Active with a large bonus.
    CriticalSuccess,
}

impl OutcomeTier {
    /// All tiers ordered by the die face that selects them.
    pub const ALL: [Self; 6] = [
        Self::CriticalFailure,
        Self::Failure,
        Self::PartialSuccess,
        Self::Success,
        Self::GreatSuccess,
        Self::CriticalSuccess,
    ];

    /// Map a die face to its tier. Faces outside `1..=6` have no tier.
    pub const fn from_roll(roll: u8) -> Option<Self> {
        match roll {
            1 => Some(Self::CriticalFailure),
            2 => Some(Self::Failure),
            3 => Some(Self::PartialSuccess),
            4 => Some(Self::Success),
            5 => Some(Self::GreatSuccess),
            6 => Some(Self::CriticalSuccess),
            _ => None,
        }
    }

    /// Whether the tier leaves the construct installed.
    pub const fn is_success(self) -> bool {
        !matches!(self, Self::CriticalFailure | Self::Failure)
    }

    /// Human-readable label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::CriticalFailure => "Critical Failure",
            Self::Failure => "Failure",
            Self::PartialSuccess => "Partial Success",
            Self::Success => "Success",
            Self::GreatSuccess => "Great Success",
            Self::CriticalSuccess => "Critical Success",
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Category of a ledger journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum LedgerEntryType {
    /// Starting balances granted when an account opens (world -> player).
    Endowment,
    /// Unconditional gold grant (world -> player).
    Grant,
    /// Gold spent on a purchase or upgrade (player -> void).
    Spend,
    /// Settled trade leg between players (player -> player).
    Trade,
    /// Guild tax withheld from a trade (player -> guild).
    GuildTax,
    /// Construct output (world -> player).
    Production,
    /// Stored resource lost to decay (player -> void).
    Decay,
}

/// The kind of party on either side of a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum PartyKind {
    /// A player account.
    Player,
    /// The aggregate guild revenue pool.
    Guild,
    /// External source (endowments, production).
    World,
    /// External sink (spending, decay).
    Void,
}

/// What a journal entry moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case", tag = "asset", content = "kind")]
#[ts(export, export_to = "bindings/")]
pub enum Asset {
    /// Gold coin.
    Gold,
    /// A typed resource.
    Resource(ResourceKind),
}

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

/// Why a command was rejected.
///
/// Every command entry point returns one of these inside a structured
/// rejection instead of propagating an error across the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum RejectionReason {
    /// Gold or resource balance too low.
    InsufficientFunds,
    /// The territory already has an owner.
    AlreadyOwned,
    /// Wrong construct, territory or game precondition.
    InvalidState,
    /// The player is not the one whose turn it is.
    NotCurrentPlayer,
    /// The current phase does not accept this command.
    PhaseMismatch,
    /// The construct is already at its maximum level.
    MaxLevelReached,
}
