//! Shared type definitions for the Guildhall territory and economy core.
//!
//! This crate is the single source of truth for the entities every other
//! crate in the workspace passes around. Types flow to `TypeScript` via
//! `ts-rs` for UI collaborators.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`enums`] -- Resources, terrain, construct lifecycle, phases, rejections
//! - [`structs`] -- Entity structs (players, territories, constructs, claims, trades)

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{
    Asset, ClaimStatus, ConstructStatus, ConstructType, LedgerEntryType, OutcomeTier, PartyKind,
    Phase, PositionMode, RejectionReason, ResourceKind, Terrain, TransactionStatus,
};
pub use ids::{ConstructId, InstallationId, LedgerEntryId, PlayerId, TerritoryId, TransactionId};
pub use structs::{
    AuctionPosition, AxialCoord, Claim, Construct, Installation, LedgerEntry, MarketEvent, Player,
    PlayerSnapshot, Standing, Territory, Transaction,
};
