//! Cycle and phase position of a running game.
//!
//! A game runs `total_cycles` cycles of the six phases in [`Phase::ORDER`].
//! The counter only moves forward through [`PhaseCycle::advance`], which
//! reports whether the step stayed inside the cycle, wrapped to the next
//! one, or ended the game.

use guildhall_types::Phase;

/// Number of phases in one cycle.
const PHASE_COUNT: usize = Phase::ORDER.len();

/// Errors raised by the cycle counter. All of them are fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CycleError {
    /// A game needs at least one cycle.
    #[error("total_cycles must be at least 1")]
    ZeroCycles,

    /// The phase index points outside the phase order.
    #[error("corrupted phase index {0}")]
    CorruptedPhaseIndex(usize),

    /// The cycle counter would overflow.
    #[error("cycle counter overflow")]
    CycleOverflow,

    /// The game already ended.
    #[error("game is over after {cycles} cycles")]
    GameOver {
        /// Cycles played.
        cycles: u32,
    },
}

/// What one call to [`PhaseCycle::advance`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseTransition {
    /// Moved to the next phase of the same cycle.
    NextPhase {
        /// Phase that ended.
        from: Phase,
        /// Phase that starts.
        to: Phase,
    },
    /// Wrapped from the last phase into the first phase of a new cycle.
    NextCycle {
        /// Phase that ended.
        from: Phase,
        /// The new cycle number.
        cycle: u32,
    },
    /// The last phase of the last cycle ended.
    GameOver {
        /// Cycles played.
        cycles: u32,
    },
}

/// Current cycle and phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseCycle {
    cycle: u32,
    phase_index: usize,
    total_cycles: u32,
    finished: bool,
}

impl PhaseCycle {
    /// Start at cycle 1, `territory_selection`.
    pub const fn new(total_cycles: u32) -> Result<Self, CycleError> {
        if total_cycles == 0 {
            return Err(CycleError::ZeroCycles);
        }
        Ok(Self {
            cycle: 1,
            phase_index: 0,
            total_cycles,
            finished: false,
        })
    }

    /// A counter stuck at an arbitrary phase index.
    #[cfg(test)]
    pub(crate) const fn at_index(total_cycles: u32, phase_index: usize) -> Self {
        Self {
            cycle: 1,
            phase_index,
            total_cycles,
            finished: false,
        }
    }

    /// Current cycle, 1-based.
    pub const fn cycle(&self) -> u32 {
        self.cycle
    }

    /// Configured game length.
    pub const fn total_cycles(&self) -> u32 {
        self.total_cycles
    }

    /// Whether the final phase of the final cycle has ended.
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Current phase.
    pub fn phase(&self) -> Result<Phase, CycleError> {
        Phase::ORDER
            .get(self.phase_index)
            .copied()
            .ok_or(CycleError::CorruptedPhaseIndex(self.phase_index))
    }

    /// Step to the next phase.
    pub fn advance(&mut self) -> Result<PhaseTransition, CycleError> {
        if self.finished {
            return Err(CycleError::GameOver {
                cycles: self.total_cycles,
            });
        }
        let from = self.phase()?;
        let next_index = self
            .phase_index
            .checked_add(1)
            .ok_or(CycleError::CorruptedPhaseIndex(self.phase_index))?;

        if next_index < PHASE_COUNT {
            self.phase_index = next_index;
            return Ok(PhaseTransition::NextPhase {
                from,
                to: self.phase()?,
            });
        }

        if self.cycle >= self.total_cycles {
            self.finished = true;
            return Ok(PhaseTransition::GameOver {
                cycles: self.cycle,
            });
        }
        self.cycle = self.cycle.checked_add(1).ok_or(CycleError::CycleOverflow)?;
        self.phase_index = 0;
        Ok(PhaseTransition::NextCycle {
            from,
            cycle: self.cycle,
        })
    }
}
