//! Error types for the `guildhall-world` crate.

use guildhall_types::{AxialCoord, ConstructId, PlayerId, RejectionReason, TerritoryId};

/// Errors raised by territory, production and decay operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// No territory with this id exists.
    #[error("territory not found: {0}")]
    TerritoryNotFound(TerritoryId),

    /// A territory with this id was already added.
    #[error("duplicate territory id: {0}")]
    DuplicateTerritory(TerritoryId),

    /// Another territory already sits at this coordinate.
    #[error("coordinate ({}, {}) is already occupied", .0.q, .0.r)]
    DuplicateCoord(AxialCoord),

    /// The territory already has an owner.
    #[error("territory {territory} is already owned by {owner}")]
    AlreadyOwned {
        /// The territory.
        territory: TerritoryId,
        /// Its owner.
        owner: PlayerId,
    },

    /// The player already claimed this territory in the current phase.
    #[error("player {player} already claimed territory {territory} this phase")]
    DuplicateClaim {
        /// The territory.
        territory: TerritoryId,
        /// The player.
        player: PlayerId,
    },

    /// The player does not own the territory.
    #[error("player {player} does not own territory {territory}")]
    NotOwner {
        /// The territory.
        territory: TerritoryId,
        /// The player.
        player: PlayerId,
    },

    /// The territory already holds a construct.
    #[error("territory {territory} already holds construct {construct}")]
    SlotOccupied {
        /// The territory.
        territory: TerritoryId,
        /// The construct already installed.
        construct: ConstructId,
    },

    /// The territory holds a different construct, or none.
    #[error("construct {construct} is not installed on territory {territory}")]
    ConstructNotInstalled {
        /// The territory.
        territory: TerritoryId,
        /// The construct.
        construct: ConstructId,
    },

    /// A decay rate is outside `[0, 1]`.
    #[error("decay rate must be between 0 and 1")]
    InvalidDecayRate,

    /// Arithmetic overflow during a checked operation.
    #[error("arithmetic overflow in world calculation")]
    ArithmeticOverflow,

    /// A ledger operation failed while crediting or decaying balances.
    #[error(transparent)]
    Ledger(#[from] guildhall_ledger::LedgerError),
}

impl WorldError {
    /// The rejection reason reported to the command caller.
    pub const fn reason(&self) -> RejectionReason {
        match self {
            Self::AlreadyOwned { .. } => RejectionReason::AlreadyOwned,
            Self::Ledger(inner) => inner.reason(),
            Self::TerritoryNotFound(_)
            | Self::DuplicateTerritory(_)
            | Self::DuplicateCoord(_)
            | Self::DuplicateClaim { .. }
            | Self::NotOwner { .. }
            | Self::SlotOccupied { .. }
            | Self::ConstructNotInstalled { .. }
            | Self::InvalidDecayRate
            | Self::ArithmeticOverflow => RejectionReason::InvalidState,
        }
    }
}
