//! Constructs for the Guildhall core: what they cost, how they are bought
//! and upgraded, and how they are installed onto territories with a d6 roll.
//!
//! # Modules
//!
//! - [`catalog`] -- Prices, upgrade costs, the outcome table and the
//!   advisory success estimate.
//! - [`dice`] -- [`DiceRoller`] with seeded and scripted dice.
//! - [`error`] -- [`ConstructError`] and its rejection mapping.
//! - [`installation`] -- [`InstallationEngine`]: timed placement and rolls.
//! - [`registry`] -- [`ConstructRegistry`]: purchase, upgrade, status graph.

pub mod catalog;
pub mod dice;
pub mod error;
pub mod installation;
pub mod registry;

pub use catalog::{
    ConstructSpec, MAX_LEVEL, spec, success_rate_estimate, tier_efficiency, tier_status,
    upgrade_cost,
};
pub use dice::{DiceRoller, ScriptedDice, SeededDice};
pub use error::ConstructError;
pub use installation::{
    DEFAULT_INSTALLATION_MS, InstallationBatch, InstallationEngine, InstallationOutcome,
};
pub use registry::ConstructRegistry;
