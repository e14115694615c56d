//! Cycle and phase orchestration for the Guildhall core.
//!
//! This crate owns the six-phase cycle that drives a game: territory
//! selection, construct outfitting, auction, resource production, resource
//! decay and end-of-cycle events. It wires the domain crates together behind
//! one command surface.
//!
//! # Modules
//!
//! - [`actions`] -- Typed [`Action`]s, outcomes and [`Rejection`].
//! - [`clock`] -- [`MonotonicClock`] with system and manual implementations.
//! - [`config`] -- Configuration loading from `guildhall-config.yaml` into
//!   strongly-typed structs.
//! - [`cycle`] -- The cycle/phase counter.
//! - [`decision`] -- [`DecisionSource`] trait and the AI stand-ins.
//! - [`orchestrator`] -- [`PhaseCycleOrchestrator`], the state machine and
//!   command entry points.
//! - [`state`] -- [`GameState`], standings and player snapshots.
//! - [`turn`] -- [`TurnSequencer`] with deadlines and timer warnings.
//!
//! [`Action`]: actions::Action
//! [`Rejection`]: actions::Rejection
//! [`MonotonicClock`]: clock::MonotonicClock
//! [`DecisionSource`]: decision::DecisionSource
//! [`PhaseCycleOrchestrator`]: orchestrator::PhaseCycleOrchestrator
//! [`GameState`]: state::GameState
//! [`TurnSequencer`]: turn::TurnSequencer

pub mod actions;
pub mod clock;
pub mod config;
pub mod cycle;
pub mod decision;
pub mod orchestrator;
pub mod state;
pub mod turn;

pub use actions::{Action, ActionKind, ActionOutcome, Rejection};
pub use clock::{ManualClock, MonotonicClock, SystemClock};
pub use config::{ConfigError, GameConfig};
pub use cycle::{CycleError, PhaseCycle, PhaseTransition};
pub use decision::{
    DecisionContext, DecisionError, DecisionSource, PassingDecisionSource, RandomDecisionSource,
};
pub use orchestrator::{OrchestratorError, PhaseCycleOrchestrator, PollReport};
pub use state::{GameState, SetupError};
pub use turn::{TurnAdvance, TurnError, TurnSequencer};
