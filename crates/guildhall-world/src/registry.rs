//! The territory registry: ownership, claims and the one-construct slot.
//!
//! Territories are created by the map builder and never destroyed. Ownership
//! changes only through [`TerritoryRegistry::resolve_claims`]. Claims made
//! during a selection phase are held until the phase ends and are then
//! resolved in one batch.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use guildhall_events::{
    EventBus, GameEvent, TerritoriesResolved, TerritoryClaimRejected, TerritoryClaimed,
    TerritoryOwnershipChanged,
};
use guildhall_types::{
    AxialCoord, Claim, ClaimStatus, ConstructId, Phase, PlayerId, Territory, TerritoryId,
};

use crate::error::WorldError;
use crate::resolution::pick_winner;

/// The six axial neighbour offsets.
const HEX_DIRECTIONS: [(i32, i32); 6] = [(1, 0), (1, -1), (0, -1), (-1, 0), (-1, 1), (0, 1)];

/// Outcome of resolving one batch of claims.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionReport {
    /// Territories that gained an owner, with the winner.
    pub awarded: Vec<(TerritoryId, PlayerId)>,
    /// Claims that lost, or that could not be applied.
    pub rejected: Vec<Claim>,
    /// Per-territory failures. One failure never aborts the batch.
    pub failures: Vec<WorldError>,
}

/// Who a claim came from and when, as passed to
/// [`TerritoryRegistry::attempt_claim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimContext {
    /// Current cycle.
    pub cycle: u32,
    /// Current phase.
    pub phase: Phase,
    /// Host monotonic time, in milliseconds.
    pub now_ms: u64,
}

/// Every territory on the map, plus the claims of the current phase.
#[derive(Debug, Default)]
pub struct TerritoryRegistry {
    territories: BTreeMap<TerritoryId, Territory>,
    by_coord: BTreeMap<AxialCoord, TerritoryId>,
    claims: Vec<Claim>,
    claim_seq: u64,
}

impl TerritoryRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            territories: BTreeMap::new(),
            by_coord: BTreeMap::new(),
            claims: Vec::new(),
            claim_seq: 0,
        }
    }

    // -------------------------------------------------------------------
    // Territories
    // -------------------------------------------------------------------

    /// Add a territory.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateTerritory`] or
    /// [`WorldError::DuplicateCoord`] if the id or coordinate is taken.
    pub fn add_territory(&mut self, territory: Territory) -> Result<(), WorldError> {
        if self.territories.contains_key(&territory.id) {
            return Err(WorldError::DuplicateTerritory(territory.id));
        }
        if self.by_coord.contains_key(&territory.coord) {
            return Err(WorldError::DuplicateCoord(territory.coord));
        }
        self.by_coord.insert(territory.coord, territory.id);
        self.territories.insert(territory.id, territory);
        Ok(())
    }

    /// Territory lookup.
    pub fn get(&self, id: TerritoryId) -> Option<&Territory> {
        self.territories.get(&id)
    }

    /// Territory lookup by coordinate.
    pub fn at(&self, coord: AxialCoord) -> Option<&Territory> {
        self.by_coord
            .get(&coord)
            .and_then(|id| self.territories.get(id))
    }

    /// Every territory, in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Territory> {
        self.territories.values()
    }

    /// Number of territories.
    pub fn len(&self) -> usize {
        self.territories.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.territories.is_empty()
    }

    /// Territories owned by `player`.
    pub fn owned_by(&self, player: PlayerId) -> Vec<TerritoryId> {
        self.territories
            .values()
            .filter(|t| t.owner == Some(player))
            .map(|t| t.id)
            .collect()
    }

    /// Territories with no owner.
    pub fn unowned(&self) -> Vec<TerritoryId> {
        self.territories
            .values()
            .filter(|t| t.owner.is_none())
            .map(|t| t.id)
            .collect()
    }

    /// Existing territories adjacent to `id`.
    pub fn neighbours(&self, id: TerritoryId) -> Vec<TerritoryId> {
        let Some(territory) = self.territories.get(&id) else {
            return Vec::new();
        };
        let AxialCoord { q, r } = territory.coord;
        HEX_DIRECTIONS
            .iter()
            .filter_map(|&(dq, dr)| {
                let coord = AxialCoord::new(q.checked_add(dq)?, r.checked_add(dr)?);
                self.by_coord.get(&coord).copied()
            })
            .collect()
    }

    // -------------------------------------------------------------------
    // Claims
    // -------------------------------------------------------------------

    /// Record a claim on `territory` by `player`, emitting
    /// `territory.claimed`.
    ///
    /// Returns [`ClaimStatus::Pending`] for the first claim on the territory
    /// this phase and [`ClaimStatus::Disputed`] when an earlier claim exists.
    ///
    /// # Errors
    ///
    /// - [`WorldError::TerritoryNotFound`] if the territory does not exist.
    /// - [`WorldError::AlreadyOwned`] if it already has an owner.
    /// - [`WorldError::DuplicateClaim`] if `player` already claimed it.
    pub fn attempt_claim(
        &mut self,
        player: PlayerId,
        territory: TerritoryId,
        ctx: ClaimContext,
        bus: &mut EventBus,
    ) -> Result<ClaimStatus, WorldError> {
        let target = self
            .territories
            .get(&territory)
            .ok_or(WorldError::TerritoryNotFound(territory))?;
        if let Some(owner) = target.owner {
            return Err(WorldError::AlreadyOwned { territory, owner });
        }
        let mut prior = self.claims.iter().filter(|c| c.territory == territory);
        if prior.clone().any(|c| c.player == player) {
            return Err(WorldError::DuplicateClaim { territory, player });
        }
        let status = if prior.next().is_some() {
            ClaimStatus::Disputed
        } else {
            ClaimStatus::Pending
        };

        let seq = self.claim_seq;
        self.claim_seq = self.claim_seq.saturating_add(1);
        self.claims.push(Claim {
            territory,
            player,
            cycle: ctx.cycle,
            phase: ctx.phase,
            seq,
            claimed_at_ms: ctx.now_ms,
        });

        debug!(?player, ?territory, ?status, "Territory claimed");
        bus.publish(GameEvent::TerritoryClaimed(TerritoryClaimed {
            territory,
            player,
            status,
        }));
        Ok(status)
    }

    /// Current standing of `player`'s claim on `territory`, if one exists.
    pub fn claim_status(&self, player: PlayerId, territory: TerritoryId) -> Option<ClaimStatus> {
        let mut on_territory = self.claims.iter().filter(|c| c.territory == territory);
        if !on_territory.clone().any(|c| c.player == player) {
            return None;
        }
        if on_territory.nth(1).is_some() {
            Some(ClaimStatus::Disputed)
        } else {
            Some(ClaimStatus::Pending)
        }
    }

    /// Claims recorded and not yet resolved, in submission order.
    pub fn pending_claims(&self) -> &[Claim] {
        &self.claims
    }

    /// Resolve every recorded claim. Each claimed territory goes to exactly
    /// one claimant; every other claimant receives
    /// `territory.claim_rejected`. Emits `territories.resolved` once.
    pub fn resolve_claims(
        &mut self,
        cycle: u32,
        game_seed: u64,
        bus: &mut EventBus,
    ) -> ResolutionReport {
        let claims = std::mem::take(&mut self.claims);
        self.claim_seq = 0;

        let mut grouped: BTreeMap<TerritoryId, Vec<Claim>> = BTreeMap::new();
        for claim in claims {
            grouped.entry(claim.territory).or_default().push(claim);
        }

        let mut report = ResolutionReport::default();
        for (territory_id, contenders) in grouped {
            match self.award(territory_id, &contenders, cycle, game_seed, bus) {
                Ok(winner) => {
                    report.awarded.push((territory_id, winner));
                    for claim in contenders {
                        if claim.player == winner {
                            continue;
                        }
                        bus.publish(GameEvent::TerritoryClaimRejected(TerritoryClaimRejected {
                            territory: territory_id,
                            player: claim.player,
                            winner,
                        }));
                        report.rejected.push(claim);
                    }
                }
                Err(err) => {
                    warn!(?territory_id, error = %err, "Claim resolution failed for territory");
                    report.failures.push(err);
                    report.rejected.extend(contenders);
                }
            }
        }

        let awarded = u32::try_from(report.awarded.len()).unwrap_or(u32::MAX);
        let rejected = u32::try_from(report.rejected.len()).unwrap_or(u32::MAX);
        info!(cycle, awarded, rejected, "Territory claims resolved");
        bus.publish(GameEvent::TerritoriesResolved(TerritoriesResolved {
            cycle,
            awarded,
            rejected,
        }));
        report
    }

    fn award(
        &mut self,
        territory_id: TerritoryId,
        contenders: &[Claim],
        cycle: u32,
        game_seed: u64,
        bus: &mut EventBus,
    ) -> Result<PlayerId, WorldError> {
        let territory = self
            .territories
            .get_mut(&territory_id)
            .ok_or(WorldError::TerritoryNotFound(territory_id))?;
        if let Some(owner) = territory.owner {
            return Err(WorldError::AlreadyOwned {
                territory: territory_id,
                owner,
            });
        }
        let winner = pick_winner(contenders, game_seed, cycle, territory_id)
            .map(|c| c.player)
            .ok_or(WorldError::TerritoryNotFound(territory_id))?;

        let previous = territory.owner.replace(winner);
        debug!(?territory_id, ?winner, contenders = contenders.len(), "Territory awarded");
        bus.publish(GameEvent::TerritoryOwnershipChanged(
            TerritoryOwnershipChanged {
                territory: territory_id,
                previous,
                owner: winner,
            },
        ));
        Ok(winner)
    }

    // -------------------------------------------------------------------
    // Construct slot
    // -------------------------------------------------------------------

    /// Check that `player` owns `territory` and its construct slot is free.
    pub fn check_installable(
        &self,
        territory: TerritoryId,
        player: PlayerId,
    ) -> Result<&Territory, WorldError> {
        let target = self
            .territories
            .get(&territory)
            .ok_or(WorldError::TerritoryNotFound(territory))?;
        if target.owner != Some(player) {
            return Err(WorldError::NotOwner { territory, player });
        }
        if let Some(construct) = target.construct {
            return Err(WorldError::SlotOccupied {
                territory,
                construct,
            });
        }
        Ok(target)
    }

    /// Bind `construct` into the territory's single slot.
    pub fn attach_construct(
        &mut self,
        territory: TerritoryId,
        player: PlayerId,
        construct: ConstructId,
    ) -> Result<(), WorldError> {
        self.check_installable(territory, player)?;
        let target = self
            .territories
            .get_mut(&territory)
            .ok_or(WorldError::TerritoryNotFound(territory))?;
        target.construct = Some(construct);
        Ok(())
    }

    /// Free the slot held by `construct`.
    pub fn detach_construct(
        &mut self,
        territory: TerritoryId,
        construct: ConstructId,
    ) -> Result<(), WorldError> {
        let target = self
            .territories
            .get_mut(&territory)
            .ok_or(WorldError::TerritoryNotFound(territory))?;
        if target.construct != Some(construct) {
            return Err(WorldError::ConstructNotInstalled {
                territory,
                construct,
            });
        }
        target.construct = None;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use guildhall_events::EventKind;
    use guildhall_types::{RejectionReason, Terrain};

    use super::*;

    fn territory(q: i32, r: i32) -> Territory {
        Territory {
            id: TerritoryId::new(),
            coord: AxialCoord::new(q, r),
            terrain: Terrain::Plains,
            owner: None,
            base_modifiers: BTreeMap::new(),
            construct: None,
        }
    }

    fn ctx(now_ms: u64) -> ClaimContext {
        ClaimContext {
            cycle: 1,
            phase: Phase::TerritorySelection,
            now_ms,
        }
    }

    #[test]
    fn rejects_duplicate_coordinates() {
        let mut registry = TerritoryRegistry::new();
        registry.add_territory(territory(0, 0)).unwrap();
        let err = registry.add_territory(territory(0, 0)).unwrap_err();
        assert!(matches!(err, WorldError::DuplicateCoord(_)));
    }

    #[test]
    fn neighbours_only_include_existing_hexes() {
        let mut registry = TerritoryRegistry::new();
        let centre = territory(0, 0);
        let centre_id = centre.id;
        registry.add_territory(centre).unwrap();
        registry.add_territory(territory(1, 0)).unwrap();
        registry.add_territory(territory(0, 1)).unwrap();
        registry.add_territory(territory(5, 5)).unwrap();
        assert_eq!(registry.neighbours(centre_id).len(), 2);
    }

    #[test]
    fn single_claim_is_pending_then_owned() {
        let mut registry = TerritoryRegistry::new();
        let mut bus = EventBus::new();
        let t = territory(0, 0);
        let tid = t.id;
        registry.add_territory(t).unwrap();
        let player = PlayerId::new();

        let status = registry.attempt_claim(player, tid, ctx(5), &mut bus).unwrap();
        assert_eq!(status, ClaimStatus::Pending);
        assert_eq!(registry.claim_status(player, tid), Some(ClaimStatus::Pending));

        let report = registry.resolve_claims(1, 99, &mut bus);
        assert_eq!(report.awarded, vec![(tid, player)]);
        assert_eq!(registry.get(tid).unwrap().owner, Some(player));
        assert!(registry.pending_claims().is_empty());
        assert_eq!(bus.count_of(EventKind::TerritoriesResolved), 1);
    }

    #[test]
    fn owned_territory_rejects_claims() {
        let mut registry = TerritoryRegistry::new();
        let mut bus = EventBus::new();
        let t = territory(0, 0);
        let tid = t.id;
        registry.add_territory(t).unwrap();
        registry
            .attempt_claim(PlayerId::new(), tid, ctx(0), &mut bus)
            .unwrap();
        registry.resolve_claims(1, 0, &mut bus);

        let err = registry
            .attempt_claim(PlayerId::new(), tid, ctx(1), &mut bus)
            .unwrap_err();
        assert_eq!(err.reason(), RejectionReason::AlreadyOwned);
    }

    #[test]
    fn same_player_cannot_claim_twice() {
        let mut registry = TerritoryRegistry::new();
        let mut bus = EventBus::new();
        let t = territory(0, 0);
        let tid = t.id;
        registry.add_territory(t).unwrap();
        let player = PlayerId::new();
        registry.attempt_claim(player, tid, ctx(0), &mut bus).unwrap();
        let err = registry
            .attempt_claim(player, tid, ctx(1), &mut bus)
            .unwrap_err();
        assert_eq!(err.reason(), RejectionReason::InvalidState);
    }

    #[test]
    fn unknown_territory_is_invalid_state() {
        let mut registry = TerritoryRegistry::new();
        let mut bus = EventBus::new();
        let err = registry
            .attempt_claim(PlayerId::new(), TerritoryId::new(), ctx(0), &mut bus)
            .unwrap_err();
        assert_eq!(err.reason(), RejectionReason::InvalidState);
    }

    #[test]
    fn construct_slot_holds_one() {
        let mut registry = TerritoryRegistry::new();
        let mut bus = EventBus::new();
        let t = territory(0, 0);
        let tid = t.id;
        registry.add_territory(t).unwrap();
        let player = PlayerId::new();
        registry.attempt_claim(player, tid, ctx(0), &mut bus).unwrap();
        registry.resolve_claims(1, 0, &mut bus);

        let first = ConstructId::new();
        registry.attach_construct(tid, player, first).unwrap();
        let err = registry
            .attach_construct(tid, player, ConstructId::new())
            .unwrap_err();
        assert!(matches!(err, WorldError::SlotOccupied { .. }));

        registry.detach_construct(tid, first).unwrap();
        assert!(registry.get(tid).unwrap().construct.is_none());
    }
}
