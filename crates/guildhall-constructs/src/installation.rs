//! Timed d6 installation of constructs onto owned territories.
//!
//! An installation moves a construct from inventory to `placing` and holds
//! the territory until the outcome is rolled, either when the host clock
//! passes the due time in [`InstallationEngine::process_due`] or on an
//! explicit [`InstallationEngine::process`]. Each installation completes
//! exactly once. Cancelling loses the construct.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use guildhall_events::{
    EventBus, GameEvent, InstallationCancelled, InstallationCompleted, InstallationStarted,
};
use guildhall_types::{
    ConstructId, ConstructStatus, Installation, InstallationId, OutcomeTier, PlayerId, TerritoryId,
};
use guildhall_world::TerritoryRegistry;

use crate::catalog::{tier_efficiency, tier_status};
use crate::dice::DiceRoller;
use crate::error::ConstructError;
use crate::registry::ConstructRegistry;

/// Default time between starting and rolling an installation.
pub const DEFAULT_INSTALLATION_MS: u64 = 3_000;

/// Result of one rolled installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallationOutcome {
    /// The installation.
    pub installation: InstallationId,
    /// Construct placed.
    pub construct: ConstructId,
    /// Target territory.
    pub territory: TerritoryId,
    /// Owner.
    pub player: PlayerId,
    /// Die face.
    pub roll: u8,
    /// Tier for the face.
    pub tier: OutcomeTier,
    /// Status the construct ended in.
    pub status: ConstructStatus,
    /// Efficiency granted.
    pub efficiency: Decimal,
}

/// Installations resolved by one call to [`InstallationEngine::process_due`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallationBatch {
    /// Rolled installations, in due order.
    pub completed: Vec<InstallationOutcome>,
    /// Installations abandoned because they could not be applied.
    pub failures: Vec<(InstallationId, ConstructError)>,
}

/// In-flight installations.
#[derive(Debug, Clone)]
pub struct InstallationEngine {
    pending: BTreeMap<InstallationId, Installation>,
    duration_ms: u64,
}

impl Default for InstallationEngine {
    fn default() -> Self {
        Self::new(DEFAULT_INSTALLATION_MS)
    }
}

impl InstallationEngine {
    /// Create an engine whose installations take `duration_ms`.
    pub const fn new(duration_ms: u64) -> Self {
        Self {
            pending: BTreeMap::new(),
            duration_ms,
        }
    }

    /// Installation duration.
    pub const fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// An in-flight installation.
    pub fn get(&self, id: InstallationId) -> Option<&Installation> {
        self.pending.get(&id)
    }

    /// Every in-flight installation.
    pub fn pending(&self) -> impl Iterator<Item = &Installation> {
        self.pending.values()
    }

    /// Whether `territory` has an installation in flight.
    pub fn is_in_flight(&self, territory: TerritoryId) -> bool {
        self.pending.values().any(|i| i.territory == territory)
    }

    /// Earliest due time among in-flight installations.
    pub fn next_due_at(&self) -> Option<u64> {
        self.pending.values().map(Installation::due_at_ms).min()
    }

    /// Start placing `construct` on `territory`, emitting
    /// `installation.started`.
    ///
    /// The construct must be `player`'s and in inventory; the territory must
    /// be `player`'s, empty, and not already receiving a construct.
    #[allow(clippy::too_many_arguments)]
    pub fn initiate(
        &mut self,
        construct: ConstructId,
        territory: TerritoryId,
        player: PlayerId,
        now_ms: u64,
        constructs: &mut ConstructRegistry,
        territories: &TerritoryRegistry,
        bus: &mut EventBus,
    ) -> Result<InstallationId, ConstructError> {
        let owned = constructs.owned(construct, player)?;
        if owned.status != ConstructStatus::Inventory {
            return Err(ConstructError::WrongStatus {
                construct,
                status: owned.status,
                expected: ConstructStatus::Inventory,
            });
        }
        territories.check_installable(territory, player)?;
        if self.is_in_flight(territory) {
            return Err(ConstructError::InstallationInFlight(territory));
        }

        constructs.transition(construct, ConstructStatus::Placing)?;
        let installation = Installation {
            id: InstallationId::new(),
            construct,
            territory,
            player,
            started_at_ms: now_ms,
            duration_ms: self.duration_ms,
        };
        let id = installation.id;
        let due_at_ms = installation.due_at_ms();
        self.pending.insert(id, installation);

        info!(?player, ?construct, ?territory, due_at_ms, "Installation started");
        bus.publish(GameEvent::InstallationStarted(InstallationStarted {
            installation: id,
            construct,
            territory,
            player,
            due_at_ms,
        }));
        Ok(id)
    }

    /// Roll the outcome of an in-flight installation now, emitting
    /// `installation.completed`.
    pub fn process(
        &mut self,
        id: InstallationId,
        dice: &mut dyn DiceRoller,
        constructs: &mut ConstructRegistry,
        territories: &mut TerritoryRegistry,
        bus: &mut EventBus,
    ) -> Result<InstallationOutcome, ConstructError> {
        let installation = self
            .pending
            .get(&id)
            .cloned()
            .ok_or(ConstructError::InstallationNotFound(id))?;
        let placing = constructs
            .get(installation.construct)
            .ok_or(ConstructError::ConstructNotFound(installation.construct))?;
        if placing.status != ConstructStatus::Placing {
            return Err(ConstructError::WrongStatus {
                construct: installation.construct,
                status: placing.status,
                expected: ConstructStatus::Placing,
            });
        }

        let roll = dice.roll_d6();
        let tier = OutcomeTier::from_roll(roll).ok_or(ConstructError::InvalidRoll(roll))?;
        let status = tier_status(tier);
        let efficiency = tier_efficiency(tier);

        if tier.is_success() {
            territories.attach_construct(
                installation.territory,
                installation.player,
                installation.construct,
            )?;
            constructs.settle_placement(
                installation.construct,
                status,
                efficiency,
                Some(installation.territory),
            )?;
        } else {
            constructs.settle_placement(installation.construct, status, Decimal::ZERO, None)?;
        }
        self.pending.remove(&id);

        info!(
            construct = ?installation.construct,
            territory = ?installation.territory,
            roll,
            tier = tier.label(),
            %efficiency,
            "Installation completed"
        );
        bus.publish(GameEvent::InstallationCompleted(InstallationCompleted {
            installation: id,
            construct: installation.construct,
            territory: installation.territory,
            player: installation.player,
            roll,
            tier,
            success: tier.is_success(),
            efficiency,
        }));

        Ok(InstallationOutcome {
            installation: id,
            construct: installation.construct,
            territory: installation.territory,
            player: installation.player,
            roll,
            tier,
            status,
            efficiency,
        })
    }

    /// Roll every installation whose due time is at or before `now_ms`,
    /// earliest first.
    pub fn process_due(
        &mut self,
        now_ms: u64,
        dice: &mut dyn DiceRoller,
        constructs: &mut ConstructRegistry,
        territories: &mut TerritoryRegistry,
        bus: &mut EventBus,
    ) -> InstallationBatch {
        let mut due: Vec<(u64, InstallationId)> = self
            .pending
            .values()
            .filter(|i| i.due_at_ms() <= now_ms)
            .map(|i| (i.due_at_ms(), i.id))
            .collect();
        due.sort_unstable();

        let mut batch = InstallationBatch::default();
        for (_, id) in due {
            match self.process(id, dice, constructs, territories, bus) {
                Ok(outcome) => batch.completed.push(outcome),
                Err(err) => {
                    warn!(installation = ?id, error = %err, "Installation abandoned");
                    self.abandon(id, constructs, bus);
                    batch.failures.push((id, err));
                }
            }
        }
        batch
    }

    /// Cancel an in-flight installation. The construct is lost
    /// unconditionally. Emits `installation.cancelled`.
    pub fn cancel(
        &mut self,
        id: InstallationId,
        player: PlayerId,
        constructs: &mut ConstructRegistry,
        bus: &mut EventBus,
    ) -> Result<ConstructId, ConstructError> {
        let installation = self
            .pending
            .get(&id)
            .ok_or(ConstructError::InstallationNotFound(id))?;
        let construct = installation.construct;
        if installation.player != player {
            return Err(ConstructError::NotOwner { construct, player });
        }

        constructs.settle_placement(construct, ConstructStatus::Lost, Decimal::ZERO, None)?;
        self.pending.remove(&id);

        info!(?player, ?construct, "Installation cancelled");
        bus.publish(GameEvent::InstallationCancelled(InstallationCancelled {
            installation: id,
            construct,
            player,
        }));
        Ok(construct)
    }

    /// Drop an installation that could not be rolled. The construct is lost
    /// and `installation.cancelled` tells collaborators it is gone.
    fn abandon(
        &mut self,
        id: InstallationId,
        constructs: &mut ConstructRegistry,
        bus: &mut EventBus,
    ) {
        let Some(installation) = self.pending.remove(&id) else {
            return;
        };
        if let Err(err) = constructs.transition(installation.construct, ConstructStatus::Lost) {
            debug!(construct = ?installation.construct, error = %err, "Abandoned construct left as is");
        }
        bus.publish(GameEvent::InstallationCancelled(InstallationCancelled {
            installation: id,
            construct: installation.construct,
            player: installation.player,
        }));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use guildhall_events::EventKind;
    use guildhall_ledger::ResourceLedger;
    use guildhall_types::{
        AxialCoord, ClaimStatus, ConstructType, Phase, RejectionReason, Terrain, Territory,
    };
    use guildhall_world::ClaimContext;

    use super::*;
    use crate::dice::ScriptedDice;

    struct Table {
        engine: InstallationEngine,
        constructs: ConstructRegistry,
        territories: TerritoryRegistry,
        ledger: ResourceLedger,
        bus: EventBus,
        player: PlayerId,
        territory: TerritoryId,
    }

    fn table() -> Table {
        let player = PlayerId::new();
        let territory = TerritoryId::new();
        let mut territories = TerritoryRegistry::new();
        territories
            .add_territory(Territory {
                id: territory,
                coord: AxialCoord::new(0, 0),
                terrain: Terrain::Plains,
                owner: None,
                base_modifiers: BTreeMap::new(),
                construct: None,
            })
            .unwrap();
        let mut bus = EventBus::new();
        let ctx = ClaimContext {
            cycle: 1,
            phase: Phase::TerritorySelection,
            now_ms: 0,
        };
        assert_eq!(
            territories.attempt_claim(player, territory, ctx, &mut bus).unwrap(),
            ClaimStatus::Pending
        );
        territories.resolve_claims(1, 0, &mut bus);

        let mut ledger = ResourceLedger::new();
        ledger.open_account(player, 500, &BTreeMap::new()).unwrap();
        Table {
            engine: InstallationEngine::default(),
            constructs: ConstructRegistry::new(),
            territories,
            ledger,
            bus,
            player,
            territory,
        }
    }

    fn start(t: &mut Table) -> (ConstructId, InstallationId) {
        let construct = t
            .constructs
            .purchase(t.player, ConstructType::Farm, &mut t.ledger, &mut t.bus)
            .unwrap();
        let id = t
            .engine
            .initiate(
                construct,
                t.territory,
                t.player,
                1_000,
                &mut t.constructs,
                &t.territories,
                &mut t.bus,
            )
            .unwrap();
        (construct, id)
    }

    #[test]
    fn critical_failure_loses_the_construct() {
        let mut t = table();
        let (construct, id) = start(&mut t);
        let mut dice = ScriptedDice::new([1]);

        let outcome = t
            .engine
            .process(id, &mut dice, &mut t.constructs, &mut t.territories, &mut t.bus)
            .unwrap();

        assert_eq!(outcome.status, ConstructStatus::Lost);
        assert_eq!(t.constructs.get(construct).unwrap().status, ConstructStatus::Lost);
        assert!(t.territories.get(t.territory).unwrap().construct.is_none());
        let completed: Vec<_> = t.bus.history_of(EventKind::InstallationCompleted).collect();
        assert_eq!(completed.len(), 1);
        assert!(matches!(
            completed.first(),
            Some(GameEvent::InstallationCompleted(InstallationCompleted { success: false, .. }))
        ));
    }

    #[test]
    fn success_binds_construct_to_territory() {
        let mut t = table();
        let (construct, id) = start(&mut t);
        let mut dice = ScriptedDice::new([5]);

        t.engine
            .process(id, &mut dice, &mut t.constructs, &mut t.territories, &mut t.bus)
            .unwrap();

        let placed = t.constructs.get(construct).unwrap();
        assert_eq!(placed.status, ConstructStatus::Active);
        assert_eq!(placed.efficiency, Decimal::new(12, 1));
        assert_eq!(placed.territory, Some(t.territory));
        assert_eq!(t.territories.get(t.territory).unwrap().construct, Some(construct));
    }

    #[test]
    fn processing_twice_is_rejected() {
        let mut t = table();
        let (_, id) = start(&mut t);
        let mut dice = ScriptedDice::new([4, 4]);

        t.engine
            .process(id, &mut dice, &mut t.constructs, &mut t.territories, &mut t.bus)
            .unwrap();
        let again = t
            .engine
            .process(id, &mut dice, &mut t.constructs, &mut t.territories, &mut t.bus)
            .unwrap_err();

        assert_eq!(again.reason(), RejectionReason::InvalidState);
        assert_eq!(t.bus.count_of(EventKind::InstallationCompleted), 1);
    }

    #[test]
    fn second_installation_on_busy_territory_fails() {
        let mut t = table();
        start(&mut t);
        let other = t
            .constructs
            .purchase(t.player, ConstructType::Farm, &mut t.ledger, &mut t.bus)
            .unwrap();

        let err = t
            .engine
            .initiate(
                other,
                t.territory,
                t.player,
                1_500,
                &mut t.constructs,
                &t.territories,
                &mut t.bus,
            )
            .unwrap_err();

        assert_eq!(err, ConstructError::InstallationInFlight(t.territory));
        assert_eq!(t.constructs.get(other).unwrap().status, ConstructStatus::Inventory);
    }

    #[test]
    fn due_installations_roll_on_poll() {
        let mut t = table();
        let (_, id) = start(&mut t);
        let mut dice = ScriptedDice::new([3]);

        let early = t.engine.process_due(
            3_999,
            &mut dice,
            &mut t.constructs,
            &mut t.territories,
            &mut t.bus,
        );
        assert!(early.completed.is_empty());
        assert_eq!(t.engine.next_due_at(), Some(4_000));

        let due = t.engine.process_due(
            4_000,
            &mut dice,
            &mut t.constructs,
            &mut t.territories,
            &mut t.bus,
        );
        assert_eq!(due.completed.len(), 1);
        assert!(t.engine.get(id).is_none());
    }

    #[test]
    fn unrollable_installation_is_abandoned_with_an_event() {
        let mut t = table();
        let (construct, id) = start(&mut t);
        let mut dice = ScriptedDice::new([7]);

        let batch = t.engine.process_due(
            4_000,
            &mut dice,
            &mut t.constructs,
            &mut t.territories,
            &mut t.bus,
        );

        assert!(batch.completed.is_empty());
        assert!(matches!(
            batch.failures.first(),
            Some((failed, ConstructError::InvalidRoll(7))) if *failed == id
        ));
        assert!(t.engine.get(id).is_none());
        assert_eq!(t.constructs.get(construct).unwrap().status, ConstructStatus::Lost);
        let cancelled: Vec<_> = t.bus.history_of(EventKind::InstallationCancelled).collect();
        assert_eq!(cancelled.len(), 1);
        assert!(matches!(
            cancelled.first(),
            Some(GameEvent::InstallationCancelled(InstallationCancelled { construct: c, .. }))
                if *c == construct
        ));
        assert_eq!(t.bus.count_of(EventKind::InstallationCompleted), 0);
    }

    #[test]
    fn cancel_is_owner_only_and_loses_construct() {
        let mut t = table();
        let (construct, id) = start(&mut t);

        let stranger = t
            .engine
            .cancel(id, PlayerId::new(), &mut t.constructs, &mut t.bus)
            .unwrap_err();
        assert!(matches!(stranger, ConstructError::NotOwner { .. }));

        t.engine
            .cancel(id, t.player, &mut t.constructs, &mut t.bus)
            .unwrap();
        assert_eq!(t.constructs.get(construct).unwrap().status, ConstructStatus::Lost);
        assert!(!t.engine.is_in_flight(t.territory));
        assert_eq!(t.bus.count_of(EventKind::InstallationCancelled), 1);
    }
}
