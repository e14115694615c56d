//! Error types for the `guildhall-constructs` crate.

use guildhall_ledger::LedgerError;
use guildhall_types::{
    ConstructId, ConstructStatus, InstallationId, PlayerId, RejectionReason, TerritoryId,
};
use guildhall_world::WorldError;

/// Errors raised by purchases, upgrades and installations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConstructError {
    /// No construct with this id exists.
    #[error("construct not found: {0}")]
    ConstructNotFound(ConstructId),

    /// The construct belongs to another player.
    #[error("player {player} does not own construct {construct}")]
    NotOwner {
        /// The construct.
        construct: ConstructId,
        /// The player who tried to use it.
        player: PlayerId,
    },

    /// The lifecycle graph forbids this status change.
    #[error("construct {construct} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        /// The construct.
        construct: ConstructId,
        /// Current status.
        from: ConstructStatus,
        /// Requested status.
        to: ConstructStatus,
    },

    /// The operation needs the construct in a different status.
    #[error("construct {construct} is {status:?}, expected {expected:?}")]
    WrongStatus {
        /// The construct.
        construct: ConstructId,
        /// Current status.
        status: ConstructStatus,
        /// Status the operation requires.
        expected: ConstructStatus,
    },

    /// The construct is already at the top level.
    #[error("construct {construct} is already at level {level}")]
    MaxLevelReached {
        /// The construct.
        construct: ConstructId,
        /// Its level.
        level: u8,
    },

    /// No pending installation with this id exists.
    #[error("installation not found: {0}")]
    InstallationNotFound(InstallationId),

    /// The territory already has an installation in flight.
    #[error("territory {0} already has an installation in progress")]
    InstallationInFlight(TerritoryId),

    /// A die produced a face outside `1..=6`.
    #[error("invalid die face: {0}")]
    InvalidRoll(u8),

    /// Arithmetic overflow during a checked operation.
    #[error("arithmetic overflow in construct calculation")]
    ArithmeticOverflow,

    /// A territory check or slot update failed.
    #[error(transparent)]
    World(#[from] WorldError),

    /// A gold debit failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl ConstructError {
    /// The rejection reason reported to the command caller.
    pub const fn reason(&self) -> RejectionReason {
        match self {
            Self::MaxLevelReached { .. } => RejectionReason::MaxLevelReached,
            Self::World(inner) => inner.reason(),
            Self::Ledger(inner) => inner.reason(),
            Self::ConstructNotFound(_)
            | Self::NotOwner { .. }
            | Self::InvalidTransition { .. }
            | Self::WrongStatus { .. }
            | Self::InstallationNotFound(_)
            | Self::InstallationInFlight(_)
            | Self::InvalidRoll(_)
            | Self::ArithmeticOverflow => RejectionReason::InvalidState,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons_follow_the_wrapped_error() {
        let ledger = ConstructError::from(LedgerError::InsufficientGold {
            player: PlayerId::new(),
            needed: 10,
            available: 0,
        });
        assert_eq!(ledger.reason(), RejectionReason::InsufficientFunds);

        let level = ConstructError::MaxLevelReached {
            construct: ConstructId::new(),
            level: 3,
        };
        assert_eq!(level.reason(), RejectionReason::MaxLevelReached);

        let world = ConstructError::from(WorldError::NotOwner {
            territory: TerritoryId::new(),
            player: PlayerId::new(),
        });
        assert_eq!(world.reason(), RejectionReason::InvalidState);
    }
}
