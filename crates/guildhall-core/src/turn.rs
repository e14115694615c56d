//! One-player-at-a-time turns inside a turn-sequenced phase.
//!
//! The sequencer walks the seat order once per phase. Each turn has a
//! deadline of `start + time limit` on the host clock. [`TurnSequencer::poll`]
//! fires `timer.warning` once per configured mark (marks above the limit are
//! skipped) and, at the deadline, `timer.expired` followed by a forced end of
//! the turn. That forced end is the only automatic advance.

use std::collections::VecDeque;

use tracing::{debug, info};

use guildhall_events::{EventBus, GameEvent, TimerExpired, TimerWarning, TurnEnded, TurnStarted};
use guildhall_types::{Phase, PlayerId, RejectionReason};

/// Errors raised by turn validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TurnError {
    /// Someone other than the current player tried to act.
    #[error("it is not {player}'s turn")]
    NotCurrentPlayer {
        /// The player who tried to act.
        player: PlayerId,
        /// Whose turn it is, if anyone's.
        current: Option<PlayerId>,
    },

    /// No turn sequence is running in this phase.
    #[error("no turn sequence is running")]
    NoActiveSequence,
}

impl TurnError {
    /// The rejection reason reported to the command caller.
    pub const fn reason(&self) -> RejectionReason {
        match self {
            Self::NotCurrentPlayer { .. } => RejectionReason::NotCurrentPlayer,
            Self::NoActiveSequence => RejectionReason::PhaseMismatch,
        }
    }
}

/// Where the sequence stands after a turn ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnAdvance {
    /// The next player's turn started.
    Next(PlayerId),
    /// Every player has had their turn.
    Exhausted,
}

/// Turn order, pointer and deadline for the current phase.
#[derive(Debug, Clone, Default)]
pub struct TurnSequencer {
    cycle: u32,
    phase: Option<Phase>,
    order: Vec<PlayerId>,
    position: usize,
    limit_ms: u64,
    turn_started_ms: u64,
    warning_marks_secs: Vec<u64>,
    pending_marks: VecDeque<u64>,
}

impl TurnSequencer {
    /// Create an idle sequencer with the given warning marks, in seconds
    /// remaining.
    pub fn new(mut warning_marks_secs: Vec<u64>) -> Self {
        warning_marks_secs.sort_unstable_by(|a, b| b.cmp(a));
        warning_marks_secs.dedup();
        Self {
            warning_marks_secs,
            ..Self::default()
        }
    }

    /// Start a pass over `order` and open the first player's turn.
    ///
    /// Returns the first player, or `None` when `order` is empty (the
    /// sequence is then immediately exhausted).
    pub fn begin(
        &mut self,
        cycle: u32,
        phase: Phase,
        order: Vec<PlayerId>,
        time_limit_secs: u64,
        now_ms: u64,
        bus: &mut EventBus,
    ) -> Option<PlayerId> {
        self.cycle = cycle;
        self.phase = Some(phase);
        self.order = order;
        self.position = 0;
        self.limit_ms = time_limit_secs.saturating_mul(1_000);
        let first = self.current_player()?;
        self.start_turn(first, now_ms, bus);
        Some(first)
    }

    /// Stop sequencing. [`Self::current_player`] is `None` afterwards.
    pub fn reset(&mut self) {
        self.phase = None;
        self.order.clear();
        self.position = 0;
        self.pending_marks.clear();
    }

    /// The phase being sequenced, if any.
    pub const fn phase(&self) -> Option<Phase> {
        self.phase
    }

    /// Whose turn it is. `None` before the sequence starts and after the
    /// last player's turn.
    pub fn current_player(&self) -> Option<PlayerId> {
        self.phase?;
        self.order.get(self.position).copied()
    }

    /// Whether a sequence ran and every player has had their turn.
    pub fn is_exhausted(&self) -> bool {
        self.phase.is_some() && self.position >= self.order.len()
    }

    /// Host time at which the current turn is force-ended.
    pub fn deadline_ms(&self) -> Option<u64> {
        self.current_player()
            .map(|_| self.turn_started_ms.saturating_add(self.limit_ms))
    }

    /// Time left in the current turn.
    pub fn remaining_ms(&self, now_ms: u64) -> Option<u64> {
        self.deadline_ms().map(|d| d.saturating_sub(now_ms))
    }

    /// Check that `player` may act now.
    pub fn ensure_current(&self, player: PlayerId) -> Result<(), TurnError> {
        if self.phase.is_none() {
            return Err(TurnError::NoActiveSequence);
        }
        let current = self.current_player();
        if current == Some(player) {
            Ok(())
        } else {
            Err(TurnError::NotCurrentPlayer { player, current })
        }
    }

    /// End `player`'s turn at their request.
    pub fn end_turn(
        &mut self,
        player: PlayerId,
        now_ms: u64,
        bus: &mut EventBus,
    ) -> Result<TurnAdvance, TurnError> {
        self.ensure_current(player)?;
        Ok(self.finish_turn(player, false, now_ms, bus))
    }

    /// Fire due timer warnings and force-end the turn at its deadline.
    ///
    /// Returns the advance when the turn was force-ended.
    pub fn poll(&mut self, now_ms: u64, bus: &mut EventBus) -> Option<TurnAdvance> {
        let player = self.current_player()?;
        let phase = self.phase?;
        let remaining_ms = self.remaining_ms(now_ms)?;

        while let Some(&mark) = self.pending_marks.front() {
            if remaining_ms > mark.saturating_mul(1_000) {
                break;
            }
            self.pending_marks.pop_front();
            debug!(?player, %phase, remaining_secs = mark, "Turn timer warning");
            bus.publish(GameEvent::TimerWarning(TimerWarning {
                phase,
                player,
                remaining_secs: mark,
            }));
        }

        if remaining_ms > 0 {
            return None;
        }
        info!(?player, %phase, "Turn timer expired");
        bus.publish(GameEvent::TimerExpired(TimerExpired { phase, player }));
        Some(self.finish_turn(player, true, now_ms, bus))
    }

    fn start_turn(&mut self, player: PlayerId, now_ms: u64, bus: &mut EventBus) {
        let Some(phase) = self.phase else {
            return;
        };
        self.turn_started_ms = now_ms;
        let limit_ms = self.limit_ms;
        self.pending_marks = self
            .warning_marks_secs
            .iter()
            .copied()
            .filter(|mark| mark.saturating_mul(1_000) <= limit_ms)
            .collect();

        let deadline_ms = now_ms.saturating_add(limit_ms);
        debug!(?player, %phase, deadline_ms, "Turn started");
        bus.publish(GameEvent::TurnStarted(TurnStarted {
            cycle: self.cycle,
            phase,
            player,
            deadline_ms,
        }));
    }

    fn finish_turn(
        &mut self,
        player: PlayerId,
        timed_out: bool,
        now_ms: u64,
        bus: &mut EventBus,
    ) -> TurnAdvance {
        if let Some(phase) = self.phase {
            debug!(?player, %phase, timed_out, "Turn ended");
            bus.publish(GameEvent::TurnEnded(TurnEnded {
                cycle: self.cycle,
                phase,
                player,
                timed_out,
            }));
        }
        self.position = self.position.saturating_add(1);
        self.pending_marks.clear();
        match self.current_player() {
            Some(next) => {
                self.start_turn(next, now_ms, bus);
                TurnAdvance::Next(next)
            }
            None => TurnAdvance::Exhausted,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use guildhall_events::EventKind;

    use super::*;

    fn seated(n: usize) -> Vec<PlayerId> {
        let mut players: Vec<PlayerId> = (0..n).map(|_| PlayerId::new()).collect();
        players.sort();
        players
    }

    #[test]
    fn idle_sequencer_has_no_current_player() {
        let turns = TurnSequencer::new(vec![30, 15]);
        assert_eq!(turns.current_player(), None);
        assert!(!turns.is_exhausted());
        assert_eq!(
            turns.ensure_current(PlayerId::new()),
            Err(TurnError::NoActiveSequence)
        );
    }

    #[test]
    fn walks_the_seat_order_once() {
        let players = seated(3);
        let mut bus = EventBus::new();
        let mut turns = TurnSequencer::new(vec![30, 15]);

        let first = turns.begin(1, Phase::TerritorySelection, players.clone(), 120, 0, &mut bus);
        assert_eq!(first, players.first().copied());

        let [a, b, c] = [players[0], players[1], players[2]];
        assert_eq!(turns.end_turn(a, 10, &mut bus), Ok(TurnAdvance::Next(b)));
        assert_eq!(turns.end_turn(b, 20, &mut bus), Ok(TurnAdvance::Next(c)));
        assert_eq!(turns.end_turn(c, 30, &mut bus), Ok(TurnAdvance::Exhausted));

        assert_eq!(turns.current_player(), None);
        assert!(turns.is_exhausted());
        assert_eq!(bus.count_of(EventKind::TurnStarted), 3);
        assert_eq!(bus.count_of(EventKind::TurnEnded), 3);
    }

    #[test]
    fn only_the_current_player_may_end_the_turn() {
        let players = seated(2);
        let mut bus = EventBus::new();
        let mut turns = TurnSequencer::new(vec![]);
        turns.begin(1, Phase::ConstructOutfitting, players.clone(), 60, 0, &mut bus);

        let err = turns.end_turn(players[1], 5, &mut bus).unwrap_err();
        assert_eq!(err.reason(), RejectionReason::NotCurrentPlayer);
        assert_eq!(turns.current_player(), Some(players[0]));
    }

    #[test]
    fn warnings_fire_once_then_expiry_force_ends() {
        let players = seated(2);
        let mut bus = EventBus::new();
        let mut turns = TurnSequencer::new(vec![15, 30]);
        turns.begin(1, Phase::TerritorySelection, players.clone(), 120, 1_000, &mut bus);

        assert_eq!(turns.poll(60_000, &mut bus), None);
        assert_eq!(bus.count_of(EventKind::TimerWarning), 0);

        // 30 s remaining at 91 s.
        assert_eq!(turns.poll(91_000, &mut bus), None);
        assert_eq!(turns.poll(95_000, &mut bus), None);
        assert_eq!(bus.count_of(EventKind::TimerWarning), 1);

        // 15 s remaining at 106 s.
        assert_eq!(turns.poll(106_000, &mut bus), None);
        assert_eq!(bus.count_of(EventKind::TimerWarning), 2);

        let advance = turns.poll(121_000, &mut bus);
        assert_eq!(advance, Some(TurnAdvance::Next(players[1])));
        assert_eq!(bus.count_of(EventKind::TimerExpired), 1);
        let ended: Vec<bool> = bus
            .history_of(EventKind::TurnEnded)
            .filter_map(|e| match e {
                GameEvent::TurnEnded(t) => Some(t.timed_out),
                _ => None,
            })
            .collect();
        assert_eq!(ended, vec![true]);
        assert_eq!(turns.deadline_ms(), Some(241_000));
    }

    #[test]
    fn marks_above_the_limit_are_skipped() {
        let players = seated(1);
        let mut bus = EventBus::new();
        let mut turns = TurnSequencer::new(vec![30, 15]);
        turns.begin(1, Phase::TerritorySelection, players, 20, 0, &mut bus);

        // A jump past the deadline still fires the 15 s warning first.
        assert_eq!(turns.poll(25_000, &mut bus), Some(TurnAdvance::Exhausted));
        let marks: Vec<u64> = bus
            .history_of(EventKind::TimerWarning)
            .filter_map(|e| match e {
                GameEvent::TimerWarning(w) => Some(w.remaining_secs),
                _ => None,
            })
            .collect();
        assert_eq!(marks, vec![15]);
    }

    #[test]
    fn empty_order_is_exhausted_at_once() {
        let mut bus = EventBus::new();
        let mut turns = TurnSequencer::new(vec![30]);
        assert_eq!(
            turns.begin(2, Phase::ConstructOutfitting, Vec::new(), 120, 0, &mut bus),
            None
        );
        assert!(turns.is_exhausted());
        assert_eq!(bus.published(), 0);
    }
}
