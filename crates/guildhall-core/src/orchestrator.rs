//! The phase/cycle state machine and the command surface of the core.
//!
//! [`PhaseCycleOrchestrator`] owns the [`GameState`], the [`PhaseCycle`]
//! counter, the [`TurnSequencer`], the dice and the host clock. Phases change
//! in three ways:
//!
//! - the last turn of a turn-sequenced phase ends (by request or timeout)
//! - the auction window runs out, seen by [`PhaseCycleOrchestrator::poll`]
//! - an automatic phase (production, decay, end-of-cycle events) finishes its
//!   work and advances on its own
//!
//! Every phase end settles pending transactions. Selection resolves its
//! claims first and the auction closes its books first.
//!
//! Handler failures are logged and the phase still advances. Only a broken
//! cycle counter is fatal; it is kept and returned from every later
//! [`PhaseCycleOrchestrator::poll`].

use tracing::{debug, info, warn};

use guildhall_constructs::{DiceRoller, InstallationOutcome};
use guildhall_events::{
    CycleEnded, CycleStarted, EventBus, GameEnded, GameEvent, MarketEventRolled, PhaseEnded,
    PhaseStarted,
};
use guildhall_market::{AuctionMatch, PositionRequest};
use guildhall_types::{
    ConstructId, InstallationId, Phase, PlayerId, RejectionReason, ResourceKind, TerritoryId,
};
use guildhall_world::{ClaimContext, ProductionCalculator};

use crate::actions::{Action, ActionOutcome, Rejection};
use crate::clock::MonotonicClock;
use crate::config::{GameConfig, PhasesConfig};
use crate::cycle::{CycleError, PhaseCycle, PhaseTransition};
use crate::decision::{DecisionContext, DecisionError, DecisionSource};
use crate::state::{GameState, SetupError};
use crate::turn::{TurnAdvance, TurnSequencer};

/// Upper bound on actions one AI turn may take before it is ended.
const MAX_AI_ACTIONS_PER_TURN: u32 = 8;

/// Errors surfaced to the host. Command rejections are not errors; they
/// come back as [`Rejection`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrchestratorError {
    /// The game could not be assembled from configuration.
    #[error("setup failed: {source}")]
    Setup {
        /// The underlying setup error.
        #[from]
        source: SetupError,
    },

    /// The cycle counter is broken.
    #[error("cycle error: {source}")]
    Cycle {
        /// The underlying cycle error.
        #[from]
        source: CycleError,
    },

    /// [`PhaseCycleOrchestrator::start`] was called twice.
    #[error("game already started")]
    AlreadyStarted,
}

/// What one call to [`PhaseCycleOrchestrator::poll`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollReport {
    /// Host time the poll ran at.
    pub now_ms: u64,
    /// Installations rolled because their duration elapsed.
    pub installations: Vec<InstallationOutcome>,
    /// Whether the current turn was force-ended by its timer.
    pub turn_timed_out: bool,
    /// Auction crosses executed by the periodic or closing scan.
    pub matches: Vec<AuctionMatch>,
    /// Phases that ended during this poll, counting automatic ones.
    pub phases_ended: u32,
}

/// Drives a game from the first claim to the final standings.
#[derive(Debug)]
pub struct PhaseCycleOrchestrator {
    state: GameState,
    cycle: PhaseCycle,
    turns: TurnSequencer,
    phases: PhasesConfig,
    auction_duration_ms: u64,
    dice: Box<dyn DiceRoller>,
    clock: Box<dyn MonotonicClock>,
    started: bool,
    phases_ended: u32,
    ai_positions_cycle: Option<u32>,
    fatal: Option<OrchestratorError>,
}

impl PhaseCycleOrchestrator {
    /// Assemble a game. Nothing happens until [`Self::start`].
    pub fn new(
        config: &GameConfig,
        clock: Box<dyn MonotonicClock>,
        dice: Box<dyn DiceRoller>,
    ) -> Result<Self, OrchestratorError> {
        let state = GameState::from_config(config)?;
        let cycle = PhaseCycle::new(config.game.total_cycles)?;
        Ok(Self {
            state,
            cycle,
            turns: TurnSequencer::new(config.phases.warning_marks_secs.clone()),
            phases: config.phases.clone(),
            auction_duration_ms: config.auction.duration_ms(),
            dice,
            clock,
            started: false,
            phases_ended: 0,
            ai_positions_cycle: None,
            fatal: None,
        })
    }

    // -------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------

    /// Read-only game state.
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// The event bus, for subscribing collaborators.
    pub const fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.state.bus
    }

    /// Current cycle, 1-based.
    pub const fn cycle(&self) -> u32 {
        self.cycle.cycle()
    }

    /// Current phase. `None` once the game is over.
    pub fn phase(&self) -> Option<Phase> {
        if self.cycle.is_finished() {
            return None;
        }
        self.cycle.phase().ok()
    }

    /// Whose turn it is.
    pub fn current_player(&self) -> Option<PlayerId> {
        self.turns.current_player()
    }

    /// When the current turn is force-ended.
    pub fn turn_deadline_ms(&self) -> Option<u64> {
        self.turns.deadline_ms()
    }

    /// Whether [`Self::start`] ran.
    pub const fn is_started(&self) -> bool {
        self.started
    }

    /// Whether `game.ended` was emitted.
    pub const fn is_over(&self) -> bool {
        self.cycle.is_finished()
    }

    /// Host time.
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// What a decision source sees for `player` right now.
    pub fn decision_context(&self, player: PlayerId) -> Option<DecisionContext<'_>> {
        Some(DecisionContext {
            cycle: self.cycle.cycle(),
            phase: self.phase()?,
            player,
            state: &self.state,
        })
    }

    // -------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------

    /// Emit `cycle.started` and `phase.started` for cycle 1 and enter
    /// territory selection.
    pub fn start(&mut self) -> Result<(), OrchestratorError> {
        if self.started {
            return Err(OrchestratorError::AlreadyStarted);
        }
        self.started = true;
        let cycle = self.cycle.cycle();
        let phase = self.cycle.phase()?;
        info!(
            cycle,
            total_cycles = self.cycle.total_cycles(),
            players = self.state.players.len(),
            "Game started"
        );
        self.state
            .bus
            .publish(GameEvent::CycleStarted(CycleStarted { cycle }));
        self.state
            .bus
            .publish(GameEvent::PhaseStarted(PhaseStarted { cycle, phase }));
        self.run_phases()
    }

    /// Advance every deadline to the clock's current time.
    ///
    /// Rolls due installations, fires turn warnings and timeouts, scans the
    /// auction books and closes the auction when its window ends.
    ///
    /// An error from here is fatal: it is kept and returned again by every
    /// later poll.
    pub fn poll(&mut self) -> Result<PollReport, OrchestratorError> {
        if let Some(err) = &self.fatal {
            return Err(err.clone());
        }
        self.poll_deadlines().map_err(|err| self.latch(err))
    }

    fn poll_deadlines(&mut self) -> Result<PollReport, OrchestratorError> {
        let now_ms = self.clock.now_ms();
        let mut report = PollReport {
            now_ms,
            ..PollReport::default()
        };
        if !self.started || self.cycle.is_finished() {
            return Ok(report);
        }
        let ended_before = self.phases_ended;

        let batch = self.state.installations.process_due(
            now_ms,
            &mut *self.dice,
            &mut self.state.constructs,
            &mut self.state.territories,
            &mut self.state.bus,
        );
        for (installation, err) in &batch.failures {
            warn!(?installation, %err, "Installation abandoned");
        }
        report.installations = batch.completed;

        match self.cycle.phase()? {
            phase if phase.is_turn_sequenced() => {
                if let Some(advance) = self.turns.poll(now_ms, &mut self.state.bus) {
                    report.turn_timed_out = true;
                    if advance == TurnAdvance::Exhausted {
                        self.finish_phase()?;
                    }
                }
            }
            Phase::AuctionPhase => {
                if self.state.auction.is_expired(now_ms) {
                    report.matches = self.state.auction.close(
                        now_ms,
                        &mut self.state.settlement,
                        &mut self.state.bus,
                    );
                    self.finish_phase()?;
                } else {
                    report.matches = self.state.auction.poll(
                        now_ms,
                        &mut self.state.settlement,
                        &mut self.state.bus,
                    );
                }
            }
            _ => {}
        }

        report.phases_ended = self.phases_ended.saturating_sub(ended_before);
        Ok(report)
    }

    /// End the current phase, then enter phases until one waits for input
    /// or the game ends.
    fn finish_phase(&mut self) -> Result<(), OrchestratorError> {
        self.end_phase()?;
        self.run_phases()
    }

    fn run_phases(&mut self) -> Result<(), OrchestratorError> {
        while !self.cycle.is_finished() {
            if !self.enter_phase()? {
                return Ok(());
            }
            self.end_phase()?;
        }
        Ok(())
    }

    /// Run the entry work of the current phase. Returns `true` when the
    /// phase is already complete and should advance.
    fn enter_phase(&mut self) -> Result<bool, OrchestratorError> {
        let cycle = self.cycle.cycle();
        let phase = self.cycle.phase()?;
        let now_ms = self.clock.now_ms();

        match phase {
            Phase::TerritorySelection | Phase::ConstructOutfitting => {
                let first = self.turns.begin(
                    cycle,
                    phase,
                    self.state.seat_order(),
                    self.phases.time_limit_secs(phase),
                    now_ms,
                    &mut self.state.bus,
                );
                Ok(first.is_none())
            }
            Phase::AuctionPhase => {
                match self.state.auction.open(
                    cycle,
                    now_ms,
                    self.auction_duration_ms,
                    &mut self.state.bus,
                ) {
                    Ok(()) => Ok(false),
                    Err(err) => {
                        warn!(cycle, %err, "Auction could not open");
                        Ok(true)
                    }
                }
            }
            Phase::ResourceProduction => {
                let report = ProductionCalculator::run(
                    cycle,
                    &self.state.territories,
                    &self.state.constructs,
                    &mut self.state.ledger,
                    &mut self.state.bus,
                );
                for err in &report.failures {
                    warn!(cycle, %err, "Production failed for a construct");
                }
                info!(cycle, units = report.total_units(), "Production complete");
                Ok(true)
            }
            Phase::ResourceDecay => {
                let report = self
                    .state
                    .decay
                    .run(cycle, &mut self.state.ledger, &mut self.state.bus);
                for err in &report.failures {
                    warn!(cycle, %err, "Decay failed for a balance");
                }
                info!(cycle, units_lost = report.units_lost, "Decay complete");
                Ok(true)
            }
            Phase::EndCycleEvents => {
                self.roll_market_event(cycle);
                let standings = self.state.standings();
                self.state
                    .bus
                    .publish(GameEvent::CycleEnded(CycleEnded { cycle, standings }));
                Ok(true)
            }
        }
    }

    fn roll_market_event(&mut self, cycle: u32) {
        if let Some(expired) = self.state.auction.clear_market_event() {
            debug!(cycle, name = %expired.name, "Market event expired");
        }
        if let Some(event) = self.state.market_events.roll(self.state.seed, cycle) {
            info!(cycle, name = %event.name, "Market event rolled");
            self.state.auction.apply_market_event(event.clone());
            self.state
                .bus
                .publish(GameEvent::MarketEvent(MarketEventRolled { event }));
        }
    }

    /// Close out the current phase and step the counter.
    fn end_phase(&mut self) -> Result<(), OrchestratorError> {
        let cycle = self.cycle.cycle();
        let phase = self.cycle.phase()?;
        let now_ms = self.clock.now_ms();

        match phase {
            Phase::TerritorySelection => {
                let report = self.state.territories.resolve_claims(
                    cycle,
                    self.state.seed,
                    &mut self.state.bus,
                );
                for err in &report.failures {
                    warn!(cycle, %err, "Claim could not be resolved");
                }
                info!(
                    cycle,
                    awarded = report.awarded.len(),
                    rejected = report.rejected.len(),
                    "Claims resolved"
                );
            }
            Phase::AuctionPhase => {
                self.state.auction.close(
                    now_ms,
                    &mut self.state.settlement,
                    &mut self.state.bus,
                );
            }
            _ => {}
        }

        let batch = self
            .state
            .settlement
            .process_pending_transactions(&mut self.state.ledger, &mut self.state.bus);
        for (transaction, err) in &batch.errors {
            warn!(?transaction, %err, "Transaction failed at settlement");
        }
        if !batch.succeeded.is_empty() || !batch.failed.is_empty() {
            info!(
                cycle,
                %phase,
                succeeded = batch.succeeded.len(),
                failed = batch.failed.len(),
                "Pending transactions settled"
            );
        }

        self.turns.reset();
        self.state
            .bus
            .publish(GameEvent::PhaseEnded(PhaseEnded { cycle, phase }));
        self.phases_ended = self.phases_ended.saturating_add(1);
        info!(cycle, %phase, "Phase ended");

        match self.cycle.advance()? {
            PhaseTransition::NextPhase { to, .. } => {
                self.state.bus.publish(GameEvent::PhaseStarted(PhaseStarted {
                    cycle,
                    phase: to,
                }));
            }
            PhaseTransition::NextCycle { cycle, .. } => {
                info!(cycle, "Cycle started");
                self.state
                    .bus
                    .publish(GameEvent::CycleStarted(CycleStarted { cycle }));
                self.state.bus.publish(GameEvent::PhaseStarted(PhaseStarted {
                    cycle,
                    phase: self.cycle.phase()?,
                }));
            }
            PhaseTransition::GameOver { cycles } => {
                let standings = self.state.standings();
                if let Some(leader) = standings.first() {
                    info!(
                        cycles,
                        winner = %leader.name,
                        net_worth = leader.net_worth,
                        "Game ended"
                    );
                }
                self.state
                    .bus
                    .publish(GameEvent::GameEnded(GameEnded { cycles, standings }));
            }
        }
        Ok(())
    }

    /// Keep a fatal error for later polls and commands.
    fn latch(&mut self, err: OrchestratorError) -> OrchestratorError {
        warn!(%err, "Orchestrator failed");
        self.fatal = Some(err.clone());
        err
    }

    /// Latch a fatal error and turn it into a rejection for the command
    /// that hit it.
    fn record_fatal(&mut self, err: OrchestratorError) -> Rejection {
        let err = self.latch(err);
        Rejection::new(RejectionReason::InvalidState, err.to_string())
    }

    // -------------------------------------------------------------------
    // Commands
    // -------------------------------------------------------------------

    fn ensure_running(&self) -> Result<Phase, Rejection> {
        if !self.started {
            return Err(Rejection::new(
                RejectionReason::InvalidState,
                "game has not started",
            ));
        }
        if self.cycle.is_finished() || self.fatal.is_some() {
            return Err(Rejection::new(RejectionReason::InvalidState, "game is over"));
        }
        self.cycle
            .phase()
            .map_err(|err| Rejection::new(RejectionReason::InvalidState, err.to_string()))
    }

    fn ensure_player(&self, player: PlayerId) -> Result<(), Rejection> {
        if self.state.player(player).is_none() {
            return Err(Rejection::new(
                RejectionReason::InvalidState,
                format!("unknown player {player}"),
            ));
        }
        Ok(())
    }

    /// Claim `territory` for `player` during their selection turn.
    pub fn attempt_claim(
        &mut self,
        player: PlayerId,
        territory: TerritoryId,
    ) -> Result<ActionOutcome, Rejection> {
        self.execute_player_action(player, Action::ClaimTerritory { territory })
    }

    /// Start installing `construct` on `territory` during `player`'s
    /// outfitting turn.
    pub fn initiate_installation(
        &mut self,
        player: PlayerId,
        construct: ConstructId,
        territory: TerritoryId,
    ) -> Result<ActionOutcome, Rejection> {
        self.execute_player_action(
            player,
            Action::InstallConstruct {
                construct,
                territory,
            },
        )
    }

    /// Validate and apply one turn action.
    ///
    /// The phase must be turn-sequenced, `player` must be the current player
    /// and the phase must permit the action's kind. [`Action::Pass`] ends the
    /// turn.
    pub fn execute_player_action(
        &mut self,
        player: PlayerId,
        action: Action,
    ) -> Result<ActionOutcome, Rejection> {
        let result = self.apply_action(player, action);
        if let Err(rejection) = &result {
            debug!(
                ?player,
                ?action,
                reason = ?rejection.reason,
                message = %rejection.message,
                "Action rejected"
            );
        }
        result
    }

    fn apply_action(
        &mut self,
        player: PlayerId,
        action: Action,
    ) -> Result<ActionOutcome, Rejection> {
        let phase = self.ensure_running()?;
        self.ensure_player(player)?;
        if !phase.is_turn_sequenced() {
            return Err(Rejection::new(
                RejectionReason::PhaseMismatch,
                format!("{phase} does not take turns"),
            ));
        }
        self.turns.ensure_current(player)?;
        if !action.kind().permitted_in(phase) {
            return Err(Rejection::new(
                RejectionReason::PhaseMismatch,
                format!("{:?} is not allowed during {phase}", action.kind()),
            ));
        }

        let now_ms = self.clock.now_ms();
        let state = &mut self.state;
        match action {
            Action::ClaimTerritory { territory } => {
                let ctx = ClaimContext {
                    cycle: self.cycle.cycle(),
                    phase,
                    now_ms,
                };
                let status = state
                    .territories
                    .attempt_claim(player, territory, ctx, &mut state.bus)?;
                Ok(ActionOutcome::Claimed(status))
            }
            Action::PurchaseConstruct { construct_type } => {
                let id = state.constructs.purchase(
                    player,
                    construct_type,
                    &mut state.ledger,
                    &mut state.bus,
                )?;
                Ok(ActionOutcome::Purchased(id))
            }
            Action::InstallConstruct {
                construct,
                territory,
            } => {
                let id = state.installations.initiate(
                    construct,
                    territory,
                    player,
                    now_ms,
                    &mut state.constructs,
                    &state.territories,
                    &mut state.bus,
                )?;
                Ok(ActionOutcome::InstallationStarted(id))
            }
            Action::UpgradeConstruct { construct } => {
                let level =
                    state
                        .constructs
                        .upgrade(player, construct, &mut state.ledger, &mut state.bus)?;
                Ok(ActionOutcome::Upgraded { construct, level })
            }
            Action::Pass => self.end_player_turn(player),
        }
    }

    /// End `player`'s turn. Ending the last turn of the phase ends the phase.
    pub fn end_player_turn(&mut self, player: PlayerId) -> Result<ActionOutcome, Rejection> {
        let phase = self.ensure_running()?;
        self.ensure_player(player)?;
        if !phase.is_turn_sequenced() {
            return Err(Rejection::new(
                RejectionReason::PhaseMismatch,
                format!("{phase} does not take turns"),
            ));
        }
        let now_ms = self.clock.now_ms();
        let advance = self.turns.end_turn(player, now_ms, &mut self.state.bus)?;
        if advance == TurnAdvance::Exhausted {
            if let Err(err) = self.finish_phase() {
                return Err(self.record_fatal(err));
            }
        }
        Ok(ActionOutcome::TurnEnded)
    }

    /// Roll an in-flight installation now, without waiting for its
    /// duration.
    pub fn process_installation(
        &mut self,
        installation: InstallationId,
    ) -> Result<ActionOutcome, Rejection> {
        self.ensure_running()?;
        let outcome = self.state.installations.process(
            installation,
            &mut *self.dice,
            &mut self.state.constructs,
            &mut self.state.territories,
            &mut self.state.bus,
        )?;
        Ok(ActionOutcome::Installed(outcome))
    }

    /// Abandon an in-flight installation. Only its owner may cancel; the
    /// construct is lost.
    pub fn cancel_installation(
        &mut self,
        player: PlayerId,
        installation: InstallationId,
    ) -> Result<ActionOutcome, Rejection> {
        self.ensure_running()?;
        self.ensure_player(player)?;
        let construct = self.state.installations.cancel(
            installation,
            player,
            &mut self.state.constructs,
            &mut self.state.bus,
        )?;
        Ok(ActionOutcome::InstallationCancelled(construct))
    }

    /// Queue a direct trade. It settles at the next phase end.
    pub fn create_transaction(
        &mut self,
        buyer: PlayerId,
        seller: PlayerId,
        resource: ResourceKind,
        unit_price: u64,
        quantity: u64,
    ) -> Result<ActionOutcome, Rejection> {
        self.ensure_running()?;
        self.ensure_player(buyer)?;
        self.ensure_player(seller)?;
        let now_ms = self.clock.now_ms();
        let id = self.state.settlement.create_transaction(
            buyer,
            seller,
            resource,
            unit_price,
            quantity,
            now_ms,
            &mut self.state.bus,
        )?;
        Ok(ActionOutcome::TransactionCreated(id))
    }

    /// Set, replace or withdraw `player`'s auction position while the
    /// books are open.
    pub fn update_player_position(
        &mut self,
        player: PlayerId,
        request: PositionRequest,
    ) -> Result<ActionOutcome, Rejection> {
        self.ensure_running()?;
        self.ensure_player(player)?;
        let now_ms = self.clock.now_ms();
        self.state
            .auction
            .update_player_position(player, request, now_ms, &mut self.state.bus)?;
        Ok(ActionOutcome::PositionUpdated)
    }

    /// Choose the resource matched by periodic auction scans. The closing
    /// sweep still covers every resource.
    pub fn set_active_resource(
        &mut self,
        resource: ResourceKind,
    ) -> Result<ActionOutcome, Rejection> {
        self.ensure_running()?;
        self.state.auction.set_active_resource(resource);
        debug!(%resource, "Active auction resource set");
        Ok(ActionOutcome::ActiveResourceSet(resource))
    }

    // -------------------------------------------------------------------
    // AI seats
    // -------------------------------------------------------------------

    /// Play the current turn if it belongs to an AI seat. Returns the player
    /// whose turn was played.
    ///
    /// A rejected action ends the turn, as does reaching the per-turn
    /// action cap.
    pub fn run_ai_turn(
        &mut self,
        source: &mut dyn DecisionSource,
    ) -> Result<Option<PlayerId>, DecisionError> {
        let Some(player) = self.turns.current_player() else {
            return Ok(None);
        };
        if !self.state.player(player).is_some_and(|p| p.is_ai) {
            return Ok(None);
        }

        let mut taken = 0u32;
        while self.turns.current_player() == Some(player) && taken < MAX_AI_ACTIONS_PER_TURN {
            let Some(ctx) = self.decision_context(player) else {
                return Ok(Some(player));
            };
            let action = source.next_action(&ctx)?;
            taken = taken.saturating_add(1);
            if action == Action::Pass {
                break;
            }
            if self.execute_player_action(player, action).is_err() {
                break;
            }
        }
        if self.turns.current_player() == Some(player) {
            if let Err(rejection) = self.end_player_turn(player) {
                debug!(?player, message = %rejection.message, "AI turn could not be ended");
            }
        }
        Ok(Some(player))
    }

    /// Submit auction positions for every AI seat, once per auction.
    /// Returns the number of positions accepted.
    pub fn submit_ai_positions(
        &mut self,
        source: &mut dyn DecisionSource,
    ) -> Result<usize, DecisionError> {
        let cycle = self.cycle.cycle();
        if !self.state.auction.is_open() || self.ai_positions_cycle == Some(cycle) {
            return Ok(0);
        }
        self.ai_positions_cycle = Some(cycle);

        let seats: Vec<PlayerId> = self
            .state
            .players
            .iter()
            .filter(|p| p.is_ai)
            .map(|p| p.id)
            .collect();
        let mut accepted = 0usize;
        for player in seats {
            let Some(ctx) = self.decision_context(player) else {
                break;
            };
            let requests = source.auction_positions(&ctx)?;
            for request in requests {
                match self.update_player_position(player, request) {
                    Ok(_) => accepted = accepted.saturating_add(1),
                    Err(rejection) => {
                        debug!(?player, message = %rejection.message, "AI position rejected");
                    }
                }
            }
        }
        Ok(accepted)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use guildhall_constructs::ScriptedDice;
    use guildhall_events::EventKind;
    use guildhall_types::{ClaimStatus, ConstructType, PositionMode};

    use super::*;
    use crate::clock::ManualClock;

    fn orchestrator(total_cycles: u32) -> (PhaseCycleOrchestrator, ManualClock) {
        let mut config = GameConfig::default();
        config.game.map_radius = 1;
        config.game.total_cycles = total_cycles;
        let clock = ManualClock::new(0);
        let orch = PhaseCycleOrchestrator::new(
            &config,
            Box::new(clock.clone()),
            Box::new(ScriptedDice::new(std::iter::empty()).with_fallback(6)),
        )
        .unwrap();
        (orch, clock)
    }

    fn seats(orch: &PhaseCycleOrchestrator) -> Vec<PlayerId> {
        orch.state().seat_order()
    }

    /// Pass every turn of the current phase.
    fn pass_all(orch: &mut PhaseCycleOrchestrator) {
        let phase = orch.phase();
        while let Some(player) = orch.current_player() {
            if orch.phase() != phase {
                break;
            }
            orch.end_player_turn(player).unwrap();
        }
    }

    #[test]
    fn commands_before_start_are_rejected() {
        let (mut orch, _) = orchestrator(1);
        let player = seats(&orch)[0];
        let err = orch.end_player_turn(player).unwrap_err();
        assert_eq!(err.reason, RejectionReason::InvalidState);
    }

    #[test]
    fn start_opens_the_first_turn() {
        let (mut orch, _) = orchestrator(1);
        orch.start().unwrap();
        assert_eq!(orch.phase(), Some(Phase::TerritorySelection));
        assert_eq!(orch.current_player(), seats(&orch).first().copied());
        assert_eq!(orch.turn_deadline_ms(), Some(120_000));
        assert_eq!(orch.start(), Err(OrchestratorError::AlreadyStarted));
    }

    #[test]
    fn only_the_current_player_acts() {
        let (mut orch, _) = orchestrator(1);
        orch.start().unwrap();
        let players = seats(&orch);
        let territory = orch.state().territories.unowned()[0];

        let err = orch.attempt_claim(players[1], territory).unwrap_err();
        assert_eq!(err.reason, RejectionReason::NotCurrentPlayer);

        let err = orch
            .execute_player_action(
                players[0],
                Action::PurchaseConstruct {
                    construct_type: ConstructType::Farm,
                },
            )
            .unwrap_err();
        assert_eq!(err.reason, RejectionReason::PhaseMismatch);

        let outcome = orch.attempt_claim(players[0], territory).unwrap();
        assert_eq!(outcome, ActionOutcome::Claimed(ClaimStatus::Pending));
    }

    #[test]
    fn unknown_players_are_invalid() {
        let (mut orch, _) = orchestrator(1);
        orch.start().unwrap();
        let err = orch.end_player_turn(PlayerId::new()).unwrap_err();
        assert_eq!(err.reason, RejectionReason::InvalidState);
    }

    #[test]
    fn passing_through_turn_phases_reaches_the_auction() {
        let (mut orch, _) = orchestrator(1);
        orch.start().unwrap();
        pass_all(&mut orch);
        assert_eq!(orch.phase(), Some(Phase::ConstructOutfitting));
        pass_all(&mut orch);
        assert_eq!(orch.phase(), Some(Phase::AuctionPhase));
        assert!(orch.state().auction.is_open());
        assert_eq!(orch.current_player(), None);
    }

    #[test]
    fn auction_expiry_runs_the_rest_of_the_cycle() {
        let (mut orch, clock) = orchestrator(1);
        orch.start().unwrap();
        pass_all(&mut orch);
        pass_all(&mut orch);

        clock.advance(59_999);
        let report = orch.poll().unwrap();
        assert_eq!(report.phases_ended, 0);

        clock.advance(1);
        let report = orch.poll().unwrap();
        // Auction, production, decay and end-of-cycle events.
        assert_eq!(report.phases_ended, 4);
        assert!(orch.is_over());
        assert_eq!(orch.phase(), None);
        assert_eq!(orch.state().bus.count_of(EventKind::GameEnded), 1);
        assert_eq!(orch.state().bus.count_of(EventKind::CycleEnded), 1);
    }

    #[test]
    fn positions_require_an_open_auction() {
        let (mut orch, _) = orchestrator(1);
        orch.start().unwrap();
        let player = seats(&orch)[0];
        let request = PositionRequest {
            resource: ResourceKind::Food,
            price: 5,
            quantity: 2,
            mode: PositionMode::Sell,
        };
        assert!(orch.update_player_position(player, request).is_err());

        pass_all(&mut orch);
        pass_all(&mut orch);
        assert_eq!(
            orch.update_player_position(player, request),
            Ok(ActionOutcome::PositionUpdated)
        );
    }

    #[test]
    fn periodic_scans_match_only_the_active_resource() {
        let (mut orch, clock) = orchestrator(1);
        orch.start().unwrap();
        let players = seats(&orch);
        pass_all(&mut orch);
        pass_all(&mut orch);
        assert_eq!(
            orch.set_active_resource(ResourceKind::Wood),
            Ok(ActionOutcome::ActiveResourceSet(ResourceKind::Wood))
        );

        for resource in [ResourceKind::Food, ResourceKind::Wood] {
            let sell = PositionRequest {
                resource,
                price: 5,
                quantity: 2,
                mode: PositionMode::Sell,
            };
            let buy = PositionRequest {
                mode: PositionMode::Buy,
                ..sell
            };
            orch.update_player_position(players[0], sell).unwrap();
            orch.update_player_position(players[1], buy).unwrap();
        }

        clock.advance(1_000);
        let report = orch.poll().unwrap();
        assert_eq!(report.phases_ended, 0);
        assert_eq!(report.matches.len(), 1);
        assert_eq!(report.matches.first().unwrap().resource, ResourceKind::Wood);
        assert_eq!(orch.state().auction.book(ResourceKind::Food).len(), 2);
    }

    #[test]
    fn active_resource_needs_a_running_game() {
        let (mut orch, _) = orchestrator(1);
        let err = orch.set_active_resource(ResourceKind::Ore).unwrap_err();
        assert_eq!(err.reason, RejectionReason::InvalidState);
    }

    #[test]
    fn a_cycle_error_during_poll_is_kept() {
        let (mut orch, _) = orchestrator(1);
        orch.start().unwrap();
        let player = seats(&orch)[0];
        orch.cycle = PhaseCycle::at_index(1, 99);

        let expected = OrchestratorError::Cycle {
            source: CycleError::CorruptedPhaseIndex(99),
        };
        assert_eq!(orch.poll().unwrap_err(), expected);

        // A healthy counter does not clear the failure.
        orch.cycle = PhaseCycle::new(1).unwrap();
        assert_eq!(orch.poll().unwrap_err(), expected);
        let err = orch.end_player_turn(player).unwrap_err();
        assert_eq!(err.reason, RejectionReason::InvalidState);
    }

    #[test]
    fn trades_settle_at_the_phase_end() {
        let (mut orch, _) = orchestrator(1);
        orch.start().unwrap();
        let players = seats(&orch);
        orch.create_transaction(players[0], players[1], ResourceKind::Wood, 10, 10)
            .unwrap();
        assert_eq!(orch.state().settlement.pending_len(), 1);

        pass_all(&mut orch);
        assert_eq!(orch.state().settlement.pending_len(), 0);
        assert_eq!(orch.state().ledger.gold(players[0]), Some(400));
        // 100 less 5% tax.
        assert_eq!(orch.state().ledger.gold(players[1]), Some(595));
        assert_eq!(orch.state().ledger.guild_revenue(), 5);
    }
}
