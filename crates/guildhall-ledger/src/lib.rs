//! Player balances and double-entry bookkeeping for the Guildhall core.
//!
//! Every gold coin and resource unit held by a player is tracked through the
//! [`ResourceLedger`]. Balances are unsigned and every mutation uses checked
//! arithmetic, so a balance can never go negative and an operation that would
//! overflow or underflow is rejected before anything changes.
//!
//! # Architecture
//!
//! - [`journal`] -- The append-only [`Journal`] and the validating [`EntryBuilder`].
//! - [`ledger`] -- The [`ResourceLedger`]: accounts, guild revenue, trade settlement.
//! - [`conservation`] -- Journal replay audit and anomaly reporting.
//!
//! # Journal flows
//!
//! | Type | From | To |
//! |------|------|----|
//! | Endowment | World | Player |
//! | Grant | World | Player |
//! | Production | World | Player |
//! | Spend | Player | Void |
//! | Decay | Player | Void |
//! | Trade | Player | Player |
//! | `GuildTax` | Player | Guild |
//!
//! Replaying the journal from empty accounts reproduces every live balance
//! and the guild revenue counter. A mismatch produces a [`LedgerAnomaly`].

pub mod conservation;
pub mod journal;
pub mod ledger;

pub use conservation::{ConservationResult, Imbalance};
pub use journal::{EntryBuilder, Journal};
pub use ledger::{Account, ResourceLedger, TradeLegs, TradeReceipt};

use guildhall_types::{Asset, LedgerEntryType, PartyKind, PlayerId, RejectionReason, ResourceKind};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// No account is open for the player.
    #[error("no account for player {0}")]
    UnknownAccount(PlayerId),

    /// An account is already open for the player.
    #[error("account already open for player {0}")]
    AccountExists(PlayerId),

    /// Gold balance is below the requested amount.
    #[error("player {player} has {available} gold, needs {needed}")]
    InsufficientGold {
        /// The account holder.
        player: PlayerId,
        /// Amount requested.
        needed: u64,
        /// Amount held.
        available: u64,
    },

    /// Resource balance is below the requested amount.
    #[error("player {player} has {available} {resource}, needs {needed}")]
    InsufficientResource {
        /// The account holder.
        player: PlayerId,
        /// The resource.
        resource: ResourceKind,
        /// Amount requested.
        needed: u64,
        /// Amount held.
        available: u64,
    },

    /// Both sides of a trade are the same player.
    #[error("player {0} cannot trade with themselves")]
    SelfTrade(PlayerId),

    /// Guild tax exceeds the trade total.
    #[error("guild tax {tax} exceeds trade total {total}")]
    TaxExceedsTotal {
        /// Computed tax.
        tax: u64,
        /// Trade total.
        total: u64,
    },

    /// Journal entries must move a positive quantity.
    #[error("ledger entry quantity must be non-zero")]
    ZeroQuantity,

    /// A required builder field was not set.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Party kinds on a journal entry do not match its type.
    #[error("invalid {side} party for {entry_type:?}: expected {expected:?}, got {actual:?}")]
    InvalidParty {
        /// Entry type being validated.
        entry_type: LedgerEntryType,
        /// `"from"` or `"to"`.
        side: &'static str,
        /// Expected party kind.
        expected: PartyKind,
        /// Actual party kind.
        actual: PartyKind,
    },

    /// An internal error that should not occur in normal operation.
    #[error("internal ledger error: {0}")]
    InternalError(&'static str),

    /// A balance or counter would overflow.
    #[error("arithmetic overflow updating {asset:?}")]
    Overflow {
        /// Asset being updated.
        asset: Asset,
    },
}

impl LedgerError {
    /// The rejection reason reported to the command caller.
    pub const fn reason(&self) -> RejectionReason {
        match self {
            Self::InsufficientGold { .. } | Self::InsufficientResource { .. } => {
                RejectionReason::InsufficientFunds
            }
            Self::UnknownAccount(_)
            | Self::AccountExists(_)
            | Self::SelfTrade(_)
            | Self::TaxExceedsTotal { .. }
            | Self::ZeroQuantity
            | Self::MissingField(_)
            | Self::InvalidParty { .. }
            | Self::InternalError(_)
            | Self::Overflow { .. } => RejectionReason::InvalidState,
        }
    }
}

// ---------------------------------------------------------------------------
// Anomaly type
// ---------------------------------------------------------------------------

/// A conservation failure found by replaying the journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerAnomaly {
    /// Every balance whose replayed value differs from the live value.
    pub imbalances: Vec<Imbalance>,
    /// Human-readable description.
    pub message: String,
}

impl core::fmt::Display for LedgerAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}
