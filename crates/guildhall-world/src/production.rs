//! Resource production from active constructs.
//!
//! Per active construct, once per production phase:
//!
//! ```text
//! base  = 10 + (5 if ideal terrain) + 5 * (level - 1)
//! yield = floor(base * efficiency)
//! ```
//!
//! The yield is credited to the construct owner's matching resource.
//! Territory modifiers are display data and do not enter the formula.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::{debug, info, warn};

use guildhall_events::{EventBus, GameEvent, ProductionCompleted, ProductionStarted};
use guildhall_ledger::ResourceLedger;
use guildhall_types::{
    Construct, ConstructId, ConstructStatus, PlayerId, ResourceKind, Territory, TerritoryId,
};

use crate::error::WorldError;
use crate::registry::TerritoryRegistry;

/// Base units produced by any active construct.
pub const BASE_YIELD: u64 = 10;

/// Bonus units when the construct sits on its ideal terrain.
pub const TERRAIN_BONUS: u64 = 5;

/// Bonus units per level above 1.
pub const LEVEL_BONUS: u64 = 5;

/// Read access to constructs, implemented by the construct registry.
pub trait ConstructLookup {
    /// Construct by id.
    fn construct(&self, id: ConstructId) -> Option<&Construct>;
}

/// One construct's output for the phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductionYield {
    /// Producing construct.
    pub construct: ConstructId,
    /// Territory it sits on.
    pub territory: TerritoryId,
    /// Owner credited.
    pub owner: PlayerId,
    /// Resource produced.
    pub resource: ResourceKind,
    /// Units credited.
    pub units: u64,
}

/// Summary of a production phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductionReport {
    /// Every credited yield.
    pub yields: Vec<ProductionYield>,
    /// Per-construct failures; the rest of the phase still runs.
    pub failures: Vec<WorldError>,
}

impl ProductionReport {
    /// Total units credited.
    pub fn total_units(&self) -> u64 {
        self.yields
            .iter()
            .fold(0u64, |acc, y| acc.saturating_add(y.units))
    }
}

/// Computes and credits construct output.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductionCalculator;

impl ProductionCalculator {
    /// Units an active construct yields on `territory`, before crediting.
    ///
    /// Inactive constructs yield nothing.
    pub fn yield_for(construct: &Construct, territory: &Territory) -> Result<u64, WorldError> {
        if construct.status != ConstructStatus::Active {
            return Ok(0);
        }
        let terrain_bonus = if construct.construct_type.ideal_terrain() == territory.terrain {
            TERRAIN_BONUS
        } else {
            0
        };
        let level_bonus = LEVEL_BONUS
            .checked_mul(u64::from(construct.level.saturating_sub(1)))
            .ok_or(WorldError::ArithmeticOverflow)?;
        let base = BASE_YIELD
            .checked_add(terrain_bonus)
            .and_then(|b| b.checked_add(level_bonus))
            .ok_or(WorldError::ArithmeticOverflow)?;

        let scaled = Decimal::from(base)
            .checked_mul(construct.efficiency)
            .ok_or(WorldError::ArithmeticOverflow)?;
        if scaled.is_sign_negative() {
            return Ok(0);
        }
        scaled.floor().to_u64().ok_or(WorldError::ArithmeticOverflow)
    }

    /// Credit every active construct's output to its owner. Emits
    /// `resource_production.started` and `resource_production.completed`.
    pub fn run(
        cycle: u32,
        territories: &TerritoryRegistry,
        constructs: &impl ConstructLookup,
        ledger: &mut ResourceLedger,
        bus: &mut EventBus,
    ) -> ProductionReport {
        bus.publish(GameEvent::ProductionStarted(ProductionStarted { cycle }));

        let mut report = ProductionReport::default();
        for territory in territories.iter() {
            let Some(construct) = territory.construct.and_then(|id| constructs.construct(id))
            else {
                continue;
            };
            if construct.status != ConstructStatus::Active {
                continue;
            }
            match Self::credit(construct, territory, ledger) {
                Ok(Some(produced)) => report.yields.push(produced),
                Ok(None) => {}
                Err(err) => {
                    warn!(construct = ?construct.id, error = %err, "Production failed for construct");
                    report.failures.push(err);
                }
            }
        }

        let units = report.total_units();
        let producing = u32::try_from(report.yields.len()).unwrap_or(u32::MAX);
        info!(cycle, constructs = producing, units, "Resource production complete");
        bus.publish(GameEvent::ProductionCompleted(ProductionCompleted {
            cycle,
            constructs: producing,
            units,
        }));
        report
    }

    fn credit(
        construct: &Construct,
        territory: &Territory,
        ledger: &mut ResourceLedger,
    ) -> Result<Option<ProductionYield>, WorldError> {
        let units = Self::yield_for(construct, territory)?;
        if units == 0 {
            return Ok(None);
        }
        let resource = construct.construct_type.produces();
        ledger.credit_resource(
            construct.owner,
            resource,
            units,
            "production",
            Some(construct.id.into_inner()),
        )?;
        debug!(construct = ?construct.id, %resource, units, "Construct produced");
        Ok(Some(ProductionYield {
            construct: construct.id,
            territory: territory.id,
            owner: construct.owner,
            resource,
            units,
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use guildhall_types::{AxialCoord, ConstructType, Terrain};
    use rust_decimal_macros::dec;

    use super::*;

    fn construct(construct_type: ConstructType, level: u8, efficiency: Decimal) -> Construct {
        Construct {
            id: ConstructId::new(),
            construct_type,
            level,
            owner: PlayerId::new(),
            status: ConstructStatus::Active,
            efficiency,
            territory: None,
        }
    }

    fn territory(terrain: Terrain) -> Territory {
        Territory {
            id: TerritoryId::new(),
            coord: AxialCoord::new(0, 0),
            terrain,
            owner: None,
            base_modifiers: BTreeMap::new(),
            construct: None,
        }
    }

    #[test]
    fn base_yield_off_terrain() {
        let farm = construct(ConstructType::Farm, 1, Decimal::ONE);
        let desert = territory(Terrain::Desert);
        assert_eq!(ProductionCalculator::yield_for(&farm, &desert).unwrap(), 10);
    }

    #[test]
    fn terrain_and_level_bonuses_stack() {
        let mine = construct(ConstructType::Mine, 3, Decimal::ONE);
        let mountains = territory(Terrain::Mountains);
        // 10 + 5 + 5 * 2
        assert_eq!(ProductionCalculator::yield_for(&mine, &mountains).unwrap(), 25);
    }

    #[test]
    fn efficiency_floors_the_result() {
        let quarry = construct(ConstructType::Quarry, 1, dec!(0.7));
        // 15 * 0.7 = 10.5
        assert_eq!(
            ProductionCalculator::yield_for(&quarry, &territory(Terrain::Hills)).unwrap(),
            10
        );
        let mine = construct(ConstructType::Mine, 2, dec!(1.5));
        // 15 * 1.5 = 22.5
        assert_eq!(
            ProductionCalculator::yield_for(&mine, &territory(Terrain::Hills)).unwrap(),
            22
        );
    }

    #[test]
    fn territory_modifier_does_not_change_yield() {
        let quarry = construct(ConstructType::Quarry, 1, Decimal::ONE);
        let mut hills = territory(Terrain::Hills);
        hills.base_modifiers.insert(ResourceKind::Stone, dec!(1.3));
        assert_eq!(ProductionCalculator::yield_for(&quarry, &hills).unwrap(), 15);
    }

    #[test]
    fn every_plains_tile_yields_the_same_for_a_farm() {
        let map = crate::map::build_hex_map(3, 5).unwrap();
        let farm = construct(ConstructType::Farm, 1, Decimal::ONE);
        let plains: Vec<&Territory> = map
            .iter()
            .filter(|t| t.terrain == Terrain::Plains)
            .collect();
        assert!(!plains.is_empty());
        for tile in plains {
            assert_eq!(ProductionCalculator::yield_for(&farm, tile).unwrap(), 15);
        }
    }

    #[test]
    fn inactive_constructs_yield_nothing() {
        let mut mill = construct(ConstructType::LumberMill, 2, Decimal::ONE);
        mill.status = ConstructStatus::Damaged;
        assert_eq!(
            ProductionCalculator::yield_for(&mill, &territory(Terrain::Forest)).unwrap(),
            0
        );
    }
}
