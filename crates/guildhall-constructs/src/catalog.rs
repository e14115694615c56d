//! Construct catalog: prices, upgrade costs and outcome efficiencies.
//!
//! | Type | Price | Produces | Ideal terrain | Upgrade to 2 | Upgrade to 3 |
//! |------|-------|----------|---------------|--------------|--------------|
//! | Farm | 50 | Food | Plains | 40 | 80 |
//! | Lumber mill | 60 | Wood | Forest | 50 | 100 |
//! | Quarry | 70 | Stone | Hills | 60 | 120 |
//! | Mine | 80 | Ore | Mountains | 70 | 140 |
//!
//! Installation outcome by die face:
//!
//! | Roll | Tier | Efficiency |
//! |------|------|------------|
//! | 1 | Critical Failure | 0 (lost) |
//! | 2 | Failure | 0 (damaged) |
//! | 3 | Partial Success | 0.7 |
//! | 4 | Success | 1.0 |
//! | 5 | Great Success | 1.2 |
//! | 6 | Critical Success | 1.5 |

use rust_decimal::Decimal;

use guildhall_types::{ConstructStatus, ConstructType, OutcomeTier, ResourceKind, Terrain};

/// Highest level a construct can reach.
pub const MAX_LEVEL: u8 = 3;

/// Static catalog entry for one construct type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstructSpec {
    /// The type described.
    pub construct_type: ConstructType,
    /// Purchase price in gold.
    pub price: u64,
    /// Resource it produces when active.
    pub produces: ResourceKind,
    /// Terrain that grants the production bonus.
    pub ideal_terrain: Terrain,
    /// Gold to reach level 2 and level 3.
    pub upgrade_costs: [u64; 2],
}

/// Catalog entry for `construct_type`.
pub const fn spec(construct_type: ConstructType) -> ConstructSpec {
    let (price, upgrade_costs) = match construct_type {
        ConstructType::Farm => (50, [40, 80]),
        ConstructType::LumberMill => (60, [50, 100]),
        ConstructType::Quarry => (70, [60, 120]),
        ConstructType::Mine => (80, [70, 140]),
    };
    ConstructSpec {
        construct_type,
        price,
        produces: construct_type.produces(),
        ideal_terrain: construct_type.ideal_terrain(),
        upgrade_costs,
    }
}

/// Gold needed to raise a construct from `current_level` to the next.
///
/// `None` at or above [`MAX_LEVEL`].
pub const fn upgrade_cost(construct_type: ConstructType, current_level: u8) -> Option<u64> {
    let [to_two, to_three] = spec(construct_type).upgrade_costs;
    match current_level {
        1 => Some(to_two),
        2 => Some(to_three),
        _ => None,
    }
}

/// Efficiency granted by an outcome tier.
pub const fn tier_efficiency(tier: OutcomeTier) -> Decimal {
    match tier {
        OutcomeTier::CriticalFailure | OutcomeTier::Failure => Decimal::ZERO,
        OutcomeTier::PartialSuccess => Decimal::from_parts(7, 0, 0, false, 1),
        OutcomeTier::Success => Decimal::ONE,
        OutcomeTier::GreatSuccess => Decimal::from_parts(12, 0, 0, false, 1),
        OutcomeTier::CriticalSuccess => Decimal::from_parts(15, 0, 0, false, 1),
    }
}

/// Status a construct ends in after rolling `tier`.
pub const fn tier_status(tier: OutcomeTier) -> ConstructStatus {
    match tier {
        OutcomeTier::CriticalFailure => ConstructStatus::Lost,
        OutcomeTier::Failure => ConstructStatus::Damaged,
        OutcomeTier::PartialSuccess
        | OutcomeTier::Success
        | OutcomeTier::GreatSuccess
        | OutcomeTier::CriticalSuccess => ConstructStatus::Active,
    }
}

/// Advisory success estimate shown before an installation is committed.
///
/// The die itself ignores terrain; this figure only hints at how well the
/// construct will produce there. Four of six faces succeed, nudged up on
/// ideal terrain and down on desert, clamped to `[0, 1]`.
pub fn success_rate_estimate(construct_type: ConstructType, terrain: Terrain) -> Decimal {
    let base = Decimal::new(4, 0)
        .checked_div(Decimal::new(6, 0))
        .unwrap_or(Decimal::ZERO);
    let adjusted = if construct_type.ideal_terrain() == terrain {
        base.checked_add(Decimal::new(10, 2))
    } else if terrain == Terrain::Desert {
        base.checked_sub(Decimal::new(15, 2))
    } else {
        Some(base)
    };
    adjusted
        .unwrap_or(base)
        .clamp(Decimal::ZERO, Decimal::ONE)
        .round_dp(2)
}
