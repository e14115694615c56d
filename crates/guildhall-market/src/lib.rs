//! The Guildhall marketplace: taxed trade settlement, the auction books and
//! the market events that move displayed prices.
//!
//! Matching and settlement are separate steps. The [`AuctionMatcher`] pairs
//! crossing positions and queues each pair as a pending transaction; the
//! [`TransactionSettlement`] queue later moves gold and resources through
//! the ledger in FIFO order, withholding the guild tax.
//!
//! # Modules
//!
//! - [`auction`] -- Per-resource books, scans and reference prices.
//! - [`error`] -- [`SettlementError`] and [`AuctionError`].
//! - [`events`] -- The weighted market event table.
//! - [`settlement`] -- The pending queue and batch settlement.

pub mod auction;
pub mod error;
pub mod events;
pub mod settlement;

pub use auction::{
    AuctionMatch, AuctionMatcher, DEFAULT_AUCTION_SECS, DEFAULT_SCAN_INTERVAL_MS, PositionRequest,
};
pub use error::{AuctionError, SettlementError};
pub use events::{MarketEventTable, MarketEventTemplate};
pub use settlement::{BatchReport, DEFAULT_TAX_RATE, TransactionSettlement};
