//! Market events rolled at the end of each cycle.
//!
//! An event multiplies the displayed reference price of some resources for
//! the next cycle. Events never touch matching prices. The roll is drawn
//! from a weighted table with a generator seeded from `(game seed, cycle)`,
//! so a replay with the same seed sees the same headlines.

use std::collections::BTreeMap;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use guildhall_types::{MarketEvent, ResourceKind};

/// One row of the market event table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketEventTemplate {
    /// Headline.
    pub name: String,
    /// Relative likelihood. Zero disables the row.
    pub weight: u32,
    /// Reference price multipliers.
    #[serde(default)]
    pub modifiers: BTreeMap<ResourceKind, Decimal>,
}

/// Weighted table of market events.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketEventTable {
    entries: Vec<MarketEventTemplate>,
}

impl MarketEventTable {
    /// Build a table from its rows.
    pub const fn new(entries: Vec<MarketEventTemplate>) -> Self {
        Self { entries }
    }

    /// The rows, in table order.
    pub fn entries(&self) -> &[MarketEventTemplate] {
        &self.entries
    }

    fn total_weight(&self) -> u32 {
        self.entries
            .iter()
            .fold(0, |acc, e| acc.saturating_add(e.weight))
    }

    /// Roll the event for `cycle`. `None` when the table is empty or every
    /// weight is zero.
    pub fn roll(&self, game_seed: u64, cycle: u32) -> Option<MarketEvent> {
        let total = self.total_weight();
        if total == 0 {
            return None;
        }
        let mut rng = SmallRng::seed_from_u64(game_seed ^ u64::from(cycle).rotate_left(17));
        let pick = rng.random_range(0..total);

        let mut cumulative: u32 = 0;
        let template = self.entries.iter().find(|e| {
            cumulative = cumulative.saturating_add(e.weight);
            pick < cumulative
        })?;
        Some(MarketEvent {
            name: template.name.clone(),
            cycle,
            modifiers: template.modifiers.clone(),
        })
    }

    /// The built-in table used when configuration supplies none.
    pub fn standard() -> Self {
        let row = |name: &str, weight: u32, modifiers: &[(ResourceKind, Decimal)]| {
            MarketEventTemplate {
                name: name.to_owned(),
                weight,
                modifiers: modifiers.iter().copied().collect(),
            }
        };
        Self::new(vec![
            row("Quiet Markets", 40, &[]),
            row("Bountiful Harvest", 15, &[(ResourceKind::Food, Decimal::new(80, 2))]),
            row("Famine", 10, &[(ResourceKind::Food, Decimal::new(150, 2))]),
            row("Timber Shortage", 10, &[(ResourceKind::Wood, Decimal::new(130, 2))]),
            row("Building Boom", 10, &[
                (ResourceKind::Stone, Decimal::new(125, 2)),
                (ResourceKind::Wood, Decimal::new(115, 2)),
            ]),
            row("Rich Vein Found", 10, &[(ResourceKind::Ore, Decimal::new(75, 2))]),
            row("War Levy", 5, &[(ResourceKind::Ore, Decimal::new(140, 2))]),
        ])
    }
}
