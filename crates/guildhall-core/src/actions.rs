//! Typed player actions and what each phase permits.
//!
//! Actions are only accepted inside a turn: the acting player must be the
//! [`TurnSequencer`](crate::turn::TurnSequencer)'s current player and the
//! phase must list the action's kind in [`ActionKind::permitted_in`].
//! Auction positions, trades and installation cancels are separate commands
//! on the orchestrator and are not turn-gated.

use serde::{Deserialize, Serialize};

use guildhall_constructs::InstallationOutcome;
use guildhall_types::{
    ClaimStatus, ConstructId, ConstructType, InstallationId, Phase, RejectionReason, ResourceKind,
    TerritoryId, TransactionId,
};

/// One thing a player does during their turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Claim an unowned territory.
    ClaimTerritory {
        /// Target territory.
        territory: TerritoryId,
    },
    /// Buy a construct into inventory.
    PurchaseConstruct {
        /// Kind to buy.
        construct_type: ConstructType,
    },
    /// Start installing an inventory construct on an owned territory.
    InstallConstruct {
        /// Construct to place.
        construct: ConstructId,
        /// Target territory.
        territory: TerritoryId,
    },
    /// Raise an active construct's level.
    UpgradeConstruct {
        /// Construct to upgrade.
        construct: ConstructId,
    },
    /// End the turn without further actions.
    Pass,
}

/// Discriminant of [`Action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// [`Action::ClaimTerritory`]
    ClaimTerritory,
    /// [`Action::PurchaseConstruct`]
    PurchaseConstruct,
    /// [`Action::InstallConstruct`]
    InstallConstruct,
    /// [`Action::UpgradeConstruct`]
    UpgradeConstruct,
    /// [`Action::Pass`]
    Pass,
}

impl Action {
    /// The kind of this action.
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::ClaimTerritory { .. } => ActionKind::ClaimTerritory,
            Self::PurchaseConstruct { .. } => ActionKind::PurchaseConstruct,
            Self::InstallConstruct { .. } => ActionKind::InstallConstruct,
            Self::UpgradeConstruct { .. } => ActionKind::UpgradeConstruct,
            Self::Pass => ActionKind::Pass,
        }
    }
}

impl ActionKind {
    /// Whether a player may take this kind of action during `phase`.
    pub const fn permitted_in(self, phase: Phase) -> bool {
        match phase {
            Phase::TerritorySelection => matches!(self, Self::ClaimTerritory | Self::Pass),
            Phase::ConstructOutfitting => matches!(
                self,
                Self::PurchaseConstruct | Self::InstallConstruct | Self::UpgradeConstruct | Self::Pass
            ),
            Phase::AuctionPhase
            | Phase::ResourceProduction
            | Phase::ResourceDecay
            | Phase::EndCycleEvents => false,
        }
    }
}

/// What a successful command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// A claim was recorded.
    Claimed(ClaimStatus),
    /// A construct was bought.
    Purchased(ConstructId),
    /// An installation started.
    InstallationStarted(InstallationId),
    /// An installation was rolled.
    Installed(InstallationOutcome),
    /// An installation was cancelled and its construct lost.
    InstallationCancelled(ConstructId),
    /// A construct gained a level.
    Upgraded {
        /// The construct.
        construct: ConstructId,
        /// Its new level.
        level: u8,
    },
    /// A pending transaction was queued.
    TransactionCreated(TransactionId),
    /// An auction position was set, replaced or withdrawn.
    PositionUpdated,
    /// Periodic auction scans now cover this resource.
    ActiveResourceSet(ResourceKind),
    /// The player's turn ended.
    TurnEnded,
}

/// Why a command was refused. Nothing changed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason:?}: {message}")]
pub struct Rejection {
    /// Typed rejection kind.
    pub reason: RejectionReason,
    /// Human-readable detail.
    pub message: String,
}

impl Rejection {
    /// Build a rejection.
    pub fn new(reason: RejectionReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }
}

macro_rules! rejection_from {
    ($($err:ty),* $(,)?) => {
        $(
            impl From<$err> for Rejection {
                fn from(err: $err) -> Self {
                    Self::new(err.reason(), err.to_string())
                }
            }
        )*
    };
}

rejection_from!(
    guildhall_world::WorldError,
    guildhall_ledger::LedgerError,
    guildhall_constructs::ConstructError,
    guildhall_market::SettlementError,
    guildhall_market::AuctionError,
    crate::turn::TurnError,
);
