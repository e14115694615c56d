//! Every construct in the game, with purchase, upgrade and status changes.
//!
//! Constructs are created in inventory by [`ConstructRegistry::purchase`] and
//! never removed. Status only moves along the lifecycle graph enforced by
//! [`ConstructRegistry::transition`].

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::{debug, info};

use guildhall_events::{ConstructPurchased, ConstructUpgraded, EventBus, GameEvent};
use guildhall_ledger::ResourceLedger;
use guildhall_types::{Construct, ConstructId, ConstructStatus, ConstructType, PlayerId, TerritoryId};
use guildhall_world::ConstructLookup;

use crate::catalog::{self, MAX_LEVEL};
use crate::error::ConstructError;

/// All constructs, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ConstructRegistry {
    constructs: BTreeMap<ConstructId, Construct>,
}

impl ConstructRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            constructs: BTreeMap::new(),
        }
    }

    /// Construct by id.
    pub fn get(&self, id: ConstructId) -> Option<&Construct> {
        self.constructs.get(&id)
    }

    /// Every construct in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Construct> {
        self.constructs.values()
    }

    /// Number of constructs ever purchased.
    pub fn len(&self) -> usize {
        self.constructs.len()
    }

    /// Whether nothing has been purchased yet.
    pub fn is_empty(&self) -> bool {
        self.constructs.is_empty()
    }

    /// Ids of constructs owned by `player`, in id order.
    pub fn owned_by(&self, player: PlayerId) -> Vec<ConstructId> {
        self.constructs
            .values()
            .filter(|c| c.owner == player)
            .map(|c| c.id)
            .collect()
    }

    /// Constructs owned by `player` that are still in inventory.
    pub fn inventory_of(&self, player: PlayerId) -> Vec<ConstructId> {
        self.constructs
            .values()
            .filter(|c| c.owner == player && c.status == ConstructStatus::Inventory)
            .map(|c| c.id)
            .collect()
    }

    /// Look up a construct and check that `player` owns it.
    pub fn owned(&self, id: ConstructId, player: PlayerId) -> Result<&Construct, ConstructError> {
        let construct = self
            .constructs
            .get(&id)
            .ok_or(ConstructError::ConstructNotFound(id))?;
        if construct.owner != player {
            return Err(ConstructError::NotOwner {
                construct: id,
                player,
            });
        }
        Ok(construct)
    }

    /// Buy a construct into `player`'s inventory, emitting
    /// `construct.purchased` after the gold debit.
    ///
    /// Fails with insufficient funds without creating anything.
    pub fn purchase(
        &mut self,
        player: PlayerId,
        construct_type: ConstructType,
        ledger: &mut ResourceLedger,
        bus: &mut EventBus,
    ) -> Result<ConstructId, ConstructError> {
        let price = catalog::spec(construct_type).price;
        let id = ConstructId::new();
        ledger.deduct_gold(player, price, "construct_purchase", Some(id.into_inner()), bus)?;

        self.constructs.insert(
            id,
            Construct {
                id,
                construct_type,
                level: 1,
                owner: player,
                status: ConstructStatus::Inventory,
                efficiency: Decimal::ZERO,
                territory: None,
            },
        );

        info!(?player, construct = ?id, ?construct_type, price, "Construct purchased");
        bus.publish(GameEvent::ConstructPurchased(ConstructPurchased {
            construct: id,
            player,
            construct_type,
            price,
        }));
        Ok(id)
    }

    /// Raise an active construct one level, emitting `construct.upgraded`.
    /// Returns the new level.
    pub fn upgrade(
        &mut self,
        player: PlayerId,
        id: ConstructId,
        ledger: &mut ResourceLedger,
        bus: &mut EventBus,
    ) -> Result<u8, ConstructError> {
        let construct = self.owned(id, player)?;
        if construct.status != ConstructStatus::Active {
            return Err(ConstructError::WrongStatus {
                construct: id,
                status: construct.status,
                expected: ConstructStatus::Active,
            });
        }
        let level = construct.level;
        let cost = catalog::upgrade_cost(construct.construct_type, level)
            .ok_or(ConstructError::MaxLevelReached { construct: id, level })?;
        let next = level
            .checked_add(1)
            .filter(|next| *next <= MAX_LEVEL)
            .ok_or(ConstructError::MaxLevelReached { construct: id, level })?;

        ledger.deduct_gold(player, cost, "construct_upgrade", Some(id.into_inner()), bus)?;
        let construct = self
            .constructs
            .get_mut(&id)
            .ok_or(ConstructError::ConstructNotFound(id))?;
        construct.level = next;

        info!(?player, construct = ?id, level = next, cost, "Construct upgraded");
        bus.publish(GameEvent::ConstructUpgraded(ConstructUpgraded {
            construct: id,
            player,
            level: next,
            cost,
        }));
        Ok(next)
    }

    /// Move a construct along the lifecycle graph.
    pub fn transition(
        &mut self,
        id: ConstructId,
        next: ConstructStatus,
    ) -> Result<&Construct, ConstructError> {
        let construct = self
            .constructs
            .get_mut(&id)
            .ok_or(ConstructError::ConstructNotFound(id))?;
        if !construct.status.can_transition_to(next) {
            return Err(ConstructError::InvalidTransition {
                construct: id,
                from: construct.status,
                to: next,
            });
        }
        debug!(construct = ?id, from = ?construct.status, to = ?next, "Construct status changed");
        construct.status = next;
        Ok(construct)
    }

    /// Record the outcome of an installation on a placing construct.
    pub(crate) fn settle_placement(
        &mut self,
        id: ConstructId,
        next: ConstructStatus,
        efficiency: Decimal,
        territory: Option<TerritoryId>,
    ) -> Result<(), ConstructError> {
        self.transition(id, next)?;
        let construct = self
            .constructs
            .get_mut(&id)
            .ok_or(ConstructError::ConstructNotFound(id))?;
        construct.efficiency = efficiency;
        construct.territory = territory;
        Ok(())
    }
}

impl ConstructLookup for ConstructRegistry {
    fn construct(&self, id: ConstructId) -> Option<&Construct> {
        self.constructs.get(&id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use guildhall_events::EventKind;
    use guildhall_types::RejectionReason;

    use super::*;

    fn setup(gold: u64) -> (ConstructRegistry, ResourceLedger, EventBus, PlayerId) {
        let player = PlayerId::new();
        let mut ledger = ResourceLedger::new();
        ledger.open_account(player, gold, &BTreeMap::new()).unwrap();
        (ConstructRegistry::new(), ledger, EventBus::new(), player)
    }

    #[test]
    fn purchase_debits_price_into_inventory() {
        let (mut registry, mut ledger, mut bus, player) = setup(100);

        let id = registry
            .purchase(player, ConstructType::Farm, &mut ledger, &mut bus)
            .unwrap();

        assert_eq!(ledger.gold(player), Some(50));
        let construct = registry.get(id).unwrap();
        assert_eq!(construct.status, ConstructStatus::Inventory);
        assert_eq!(construct.level, 1);
        assert_eq!(registry.inventory_of(player), vec![id]);
        assert_eq!(bus.count_of(EventKind::GoldDeducted), 1);
        assert_eq!(bus.count_of(EventKind::ConstructPurchased), 1);
    }

    #[test]
    fn purchase_without_gold_creates_nothing() {
        let (mut registry, mut ledger, mut bus, player) = setup(10);

        let err = registry
            .purchase(player, ConstructType::Mine, &mut ledger, &mut bus)
            .unwrap_err();

        assert_eq!(err.reason(), RejectionReason::InsufficientFunds);
        assert!(registry.is_empty());
        assert_eq!(ledger.gold(player), Some(10));
        assert_eq!(bus.count_of(EventKind::ConstructPurchased), 0);
    }

    #[test]
    fn upgrade_requires_active_and_stops_at_three() {
        let (mut registry, mut ledger, mut bus, player) = setup(1_000);
        let id = registry
            .purchase(player, ConstructType::Farm, &mut ledger, &mut bus)
            .unwrap();

        let early = registry.upgrade(player, id, &mut ledger, &mut bus).unwrap_err();
        assert_eq!(early.reason(), RejectionReason::InvalidState);

        registry.transition(id, ConstructStatus::Placing).unwrap();
        registry
            .settle_placement(id, ConstructStatus::Active, Decimal::ONE, None)
            .unwrap();

        assert_eq!(registry.upgrade(player, id, &mut ledger, &mut bus).unwrap(), 2);
        assert_eq!(registry.upgrade(player, id, &mut ledger, &mut bus).unwrap(), 3);
        let maxed = registry.upgrade(player, id, &mut ledger, &mut bus).unwrap_err();
        assert_eq!(maxed.reason(), RejectionReason::MaxLevelReached);
        // 1000 - 50 - 40 - 80
        assert_eq!(ledger.gold(player), Some(830));
    }

    #[test]
    fn status_graph_is_enforced() {
        let (mut registry, mut ledger, mut bus, player) = setup(100);
        let id = registry
            .purchase(player, ConstructType::Quarry, &mut ledger, &mut bus)
            .unwrap();

        assert!(registry.transition(id, ConstructStatus::Active).is_err());
        registry.transition(id, ConstructStatus::Placing).unwrap();
        registry.transition(id, ConstructStatus::Lost).unwrap();
        assert!(registry.transition(id, ConstructStatus::Inventory).is_err());
        assert!(registry.transition(id, ConstructStatus::Active).is_err());
    }

    #[test]
    fn other_players_cannot_upgrade() {
        let (mut registry, mut ledger, mut bus, player) = setup(100);
        let id = registry
            .purchase(player, ConstructType::Farm, &mut ledger, &mut bus)
            .unwrap();
        let err = registry
            .upgrade(PlayerId::new(), id, &mut ledger, &mut bus)
            .unwrap_err();
        assert!(matches!(err, ConstructError::NotOwner { .. }));
    }
}
