//! Real-time driver loop.
//!
//! The core never sleeps: every deadline is checked when the host calls
//! `poll`. This loop calls it on a fixed interval, plays AI seats between
//! polls and stops when the game ends or the process is interrupted.

use std::time::Duration;

use guildhall_core::{DecisionSource, PhaseCycleOrchestrator};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::EngineError;

/// Why the driver loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveOutcome {
    /// `game.ended` was emitted.
    Finished,
    /// Ctrl-C arrived first.
    Interrupted,
}

/// One pass of the loop: play any AI turn, submit AI auction positions
/// once per auction, then poll. Returns whether the game is over.
pub fn step(
    orchestrator: &mut PhaseCycleOrchestrator,
    source: &mut dyn DecisionSource,
) -> Result<bool, EngineError> {
    if orchestrator.is_over() {
        return Ok(true);
    }
    if let Some(player) = orchestrator.run_ai_turn(source)? {
        debug!(?player, "AI turn played");
    }
    let positions = orchestrator.submit_ai_positions(source)?;
    if positions > 0 {
        info!(cycle = orchestrator.cycle(), positions, "AI auction positions submitted");
    }

    let report = orchestrator.poll()?;
    if report.turn_timed_out {
        debug!(now_ms = report.now_ms, "Turn timed out");
    }
    Ok(orchestrator.is_over())
}

/// Drive `orchestrator` until the game ends or Ctrl-C.
pub async fn run(
    orchestrator: &mut PhaseCycleOrchestrator,
    source: &mut dyn DecisionSource,
    poll_interval: Duration,
) -> Result<DriveOutcome, EngineError> {
    let mut interval = tokio::time::interval(poll_interval.max(Duration::from_millis(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        poll_interval_ms = poll_interval.as_millis(),
        "Entering driver loop"
    );
    loop {
        tokio::select! {
            signal = &mut shutdown => {
                signal.map_err(|source| EngineError::Signal { source })?;
                warn!(
                    cycle = orchestrator.cycle(),
                    phase = ?orchestrator.phase(),
                    "Interrupted, stopping before the game ended"
                );
                return Ok(DriveOutcome::Interrupted);
            }
            _ = interval.tick() => {
                if step(orchestrator, source)? {
                    return Ok(DriveOutcome::Finished);
                }
            }
        }
    }
}
