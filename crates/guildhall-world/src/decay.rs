//! Stored resource decay.
//!
//! Each decay phase removes `floor((stored - protected_floor) * rate)` units
//! of every resource a player holds above the floor. Balances never go
//! negative and the floor is never touched.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use guildhall_events::{DecayCompleted, DecayProcessing, EventBus, GameEvent};
use guildhall_ledger::ResourceLedger;
use guildhall_types::{PlayerId, ResourceKind};

use crate::error::WorldError;

/// Per-resource decay fractions and the protected floor.
///
/// Deserializing goes through [`DecayPolicy::new`], so every rate is
/// checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDecayPolicy")]
pub struct DecayPolicy {
    rates: BTreeMap<ResourceKind, Decimal>,
    protected_floor: u64,
}

#[derive(Deserialize)]
struct RawDecayPolicy {
    rates: BTreeMap<ResourceKind, Decimal>,
    protected_floor: u64,
}

impl TryFrom<RawDecayPolicy> for DecayPolicy {
    type Error = WorldError;

    fn try_from(raw: RawDecayPolicy) -> Result<Self, Self::Error> {
        Self::new(raw.rates, raw.protected_floor)
    }
}

impl DecayPolicy {
    /// Build a policy, rejecting rates outside `[0, 1]`.
    pub fn new(
        rates: BTreeMap<ResourceKind, Decimal>,
        protected_floor: u64,
    ) -> Result<Self, WorldError> {
        if rates
            .values()
            .any(|rate| rate.is_sign_negative() || *rate > Decimal::ONE)
        {
            return Err(WorldError::InvalidDecayRate);
        }
        Ok(Self {
            rates,
            protected_floor,
        })
    }

    /// Decay fraction for `resource`; zero when unset.
    pub fn rate(&self, resource: ResourceKind) -> Decimal {
        self.rates.get(&resource).copied().unwrap_or(Decimal::ZERO)
    }

    /// Units below which nothing decays.
    pub const fn protected_floor(&self) -> u64 {
        self.protected_floor
    }

    /// Units lost from a balance of `stored`.
    pub fn decay_amount(&self, resource: ResourceKind, stored: u64) -> Result<u64, WorldError> {
        let exposed = stored.saturating_sub(self.protected_floor);
        if exposed == 0 {
            return Ok(0);
        }
        let lost = Decimal::from(exposed)
            .checked_mul(self.rate(resource))
            .ok_or(WorldError::ArithmeticOverflow)?
            .floor()
            .to_u64()
            .ok_or(WorldError::ArithmeticOverflow)?;
        Ok(lost.min(exposed))
    }

    /// Apply decay to every account. Emits `resource_decay.processing` and
    /// `resource_decay.completed`. Returns the total units removed.
    pub fn run(
        &self,
        cycle: u32,
        ledger: &mut ResourceLedger,
        bus: &mut EventBus,
    ) -> DecayReport {
        bus.publish(GameEvent::DecayProcessing(DecayProcessing { cycle }));

        let holdings: Vec<(PlayerId, ResourceKind, u64)> = ledger
            .accounts()
            .flat_map(|(player, account)| {
                account
                    .resources()
                    .iter()
                    .map(move |(kind, amount)| (player, *kind, *amount))
            })
            .collect();

        let mut report = DecayReport::default();
        for (player, kind, stored) in holdings {
            let result = self
                .decay_amount(kind, stored)
                .and_then(|amount| ledger.apply_decay(player, kind, amount).map_err(WorldError::from));
            match result {
                Ok(0) => {}
                Ok(removed) => {
                    debug!(?player, %kind, removed, "Resource decayed");
                    report.units_lost = report.units_lost.saturating_add(removed);
                }
                Err(err) => {
                    warn!(?player, %kind, error = %err, "Decay failed for balance");
                    report.failures.push(err);
                }
            }
        }

        info!(cycle, units_lost = report.units_lost, "Resource decay complete");
        bus.publish(GameEvent::DecayCompleted(DecayCompleted {
            cycle,
            units_lost: report.units_lost,
        }));
        report
    }
}

impl Default for DecayPolicy {
    fn default() -> Self {
        let rates = BTreeMap::from([
            (ResourceKind::Food, Decimal::new(20, 2)),
            (ResourceKind::Wood, Decimal::new(10, 2)),
            (ResourceKind::Stone, Decimal::new(5, 2)),
            (ResourceKind::Ore, Decimal::new(5, 2)),
        ]);
        Self {
            rates,
            protected_floor: 10,
        }
    }
}

/// Summary of a decay phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecayReport {
    /// Units removed across all players.
    pub units_lost: u64,
    /// Per-balance failures.
    pub failures: Vec<WorldError>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use guildhall_events::EventKind;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn floor_is_protected() {
        let policy = DecayPolicy::new(BTreeMap::from([(ResourceKind::Food, dec!(0.5))]), 10).unwrap();
        assert_eq!(policy.decay_amount(ResourceKind::Food, 10).unwrap(), 0);
        assert_eq!(policy.decay_amount(ResourceKind::Food, 8).unwrap(), 0);
        // (31 - 10) * 0.5 = 10.5 -> 10
        assert_eq!(policy.decay_amount(ResourceKind::Food, 31).unwrap(), 10);
    }

    #[test]
    fn full_rate_stops_at_floor() {
        let policy = DecayPolicy::new(BTreeMap::from([(ResourceKind::Ore, Decimal::ONE)]), 3).unwrap();
        assert_eq!(policy.decay_amount(ResourceKind::Ore, 20).unwrap(), 17);
    }

    #[test]
    fn rejects_rates_above_one() {
        let result = DecayPolicy::new(BTreeMap::from([(ResourceKind::Ore, dec!(1.5))]), 0);
        assert_eq!(result, Err(WorldError::InvalidDecayRate));
    }

    #[test]
    fn deserializing_checks_rates() {
        let bad = r#"{"rates":{"food":"1.5"},"protected_floor":0}"#;
        assert!(serde_json::from_str::<DecayPolicy>(bad).is_err());

        let good = r#"{"rates":{"food":"0.25"},"protected_floor":4}"#;
        let policy: DecayPolicy = serde_json::from_str(good).unwrap();
        assert_eq!(policy.rate(ResourceKind::Food), dec!(0.25));
        assert_eq!(policy.protected_floor(), 4);
    }

    #[test]
    fn run_debits_every_account() {
        let mut ledger = ResourceLedger::new();
        let mut bus = EventBus::new();
        let a = PlayerId::new();
        let b = PlayerId::new();
        ledger
            .open_account(a, 0, &BTreeMap::from([(ResourceKind::Food, 30)]))
            .unwrap();
        ledger
            .open_account(b, 0, &BTreeMap::from([(ResourceKind::Wood, 5)]))
            .unwrap();

        let report = DecayPolicy::default().run(1, &mut ledger, &mut bus);

        // Food: (30 - 10) * 0.2 = 4. Wood below floor.
        assert_eq!(report.units_lost, 4);
        assert_eq!(ledger.resource(a, ResourceKind::Food), Some(26));
        assert_eq!(ledger.resource(b, ResourceKind::Wood), Some(5));
        assert_eq!(bus.count_of(EventKind::DecayProcessing), 1);
        assert_eq!(bus.count_of(EventKind::DecayCompleted), 1);
    }
}
