//! Territories, claims, production and decay for the Guildhall core.
//!
//! The world is a fixed hexagon of territories. Players claim unowned
//! territories during the selection phase; the claims are held and resolved
//! in one batch when the phase ends. Owned territories carry at most one
//! construct, and active constructs produce resources each production phase.
//! Stored resources above a protected floor decay once per cycle.
//!
//! # Modules
//!
//! - [`error`] -- [`WorldError`] and its rejection mapping.
//! - [`registry`] -- [`TerritoryRegistry`]: lookups, claims, the construct slot.
//! - [`resolution`] -- Deterministic tie-break for contested claims.
//! - [`production`] -- [`ProductionCalculator`] and the [`ConstructLookup`] seam.
//! - [`decay`] -- [`DecayPolicy`] for stored resources.
//! - [`map`] -- Seeded hex map generation.

pub mod decay;
pub mod error;
pub mod map;
pub mod production;
pub mod registry;
pub mod resolution;

pub use decay::{DecayPolicy, DecayReport};
pub use error::WorldError;
pub use map::{build_hex_map, favoured_resource, hex_coords};
pub use production::{ConstructLookup, ProductionCalculator, ProductionReport, ProductionYield};
pub use registry::{ClaimContext, ResolutionReport, TerritoryRegistry};
pub use resolution::{pick_winner, tie_break_seed};
