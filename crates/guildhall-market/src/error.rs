//! Error types for the `guildhall-market` crate.

use guildhall_ledger::LedgerError;
use guildhall_types::{PlayerId, RejectionReason, ResourceKind};

/// Errors raised while creating or settling transactions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettlementError {
    /// Buyer and seller are the same player.
    #[error("player {0} cannot trade with themselves")]
    SelfTrade(PlayerId),

    /// A transaction must move at least one unit.
    #[error("transaction quantity must be positive")]
    ZeroQuantity,

    /// The tax rate is outside `[0, 1]`.
    #[error("tax rate must be between 0 and 1")]
    InvalidTaxRate,

    /// Arithmetic overflow computing a total or tax.
    #[error("arithmetic overflow in settlement: {context}")]
    ArithmeticOverflow {
        /// What was being computed.
        context: &'static str,
    },

    /// The ledger rejected the settlement legs.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl SettlementError {
    /// The rejection reason reported to the command caller.
    pub const fn reason(&self) -> RejectionReason {
        match self {
            Self::Ledger(inner) => inner.reason(),
            Self::SelfTrade(_)
            | Self::ZeroQuantity
            | Self::InvalidTaxRate
            | Self::ArithmeticOverflow { .. } => RejectionReason::InvalidState,
        }
    }
}

/// Errors raised by the auction books.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuctionError {
    /// Positions can only be set while the auction is open.
    #[error("auction is closed; cannot set a {resource} position")]
    BookClosed {
        /// Resource the position was for.
        resource: ResourceKind,
    },

    /// The auction is already open.
    #[error("auction is already open")]
    AlreadyOpen,

    /// A position must carry a positive price.
    #[error("position price must be positive")]
    ZeroPrice,

    /// A matched trade could not be queued for settlement.
    #[error(transparent)]
    Settlement(#[from] SettlementError),
}

impl AuctionError {
    /// The rejection reason reported to the command caller.
    pub const fn reason(&self) -> RejectionReason {
        match self {
            Self::BookClosed { .. } => RejectionReason::PhaseMismatch,
            Self::Settlement(inner) => inner.reason(),
            Self::AlreadyOpen | Self::ZeroPrice => RejectionReason::InvalidState,
        }
    }
}
