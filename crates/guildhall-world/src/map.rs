//! Hex map generation.
//!
//! Builds a hexagon of territories around the origin in axial coordinates.
//! Terrain is drawn from a weighted table and each territory gets a bonus
//! modifier for the resource its terrain favours:
//!
//! | Terrain   | Weight | Favours |
//! |-----------|--------|---------|
//! | Plains    | 30     | Food    |
//! | Forest    | 25     | Wood    |
//! | Hills     | 20     | Stone   |
//! | Mountains | 15     | Ore     |
//! | Desert    | 10     | none    |
//!
//! The same `(radius, seed)` always produces the same terrain layout.
//! Territory ids are fresh on every build.

use std::collections::BTreeMap;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

use guildhall_types::{AxialCoord, ResourceKind, Terrain, Territory, TerritoryId};

use crate::error::WorldError;
use crate::registry::TerritoryRegistry;

const TERRAIN_WEIGHTS: [(Terrain, u32); 5] = [
    (Terrain::Plains, 30),
    (Terrain::Forest, 25),
    (Terrain::Hills, 20),
    (Terrain::Mountains, 15),
    (Terrain::Desert, 10),
];

/// Highest bonus, in hundredths, above the nominal modifier of 1.
const MAX_BONUS_HUNDREDTHS: i64 = 30;

/// Resource a terrain favours, if any.
pub const fn favoured_resource(terrain: Terrain) -> Option<ResourceKind> {
    match terrain {
        Terrain::Plains => Some(ResourceKind::Food),
        Terrain::Forest => Some(ResourceKind::Wood),
        Terrain::Hills => Some(ResourceKind::Stone),
        Terrain::Mountains => Some(ResourceKind::Ore),
        Terrain::Desert => None,
    }
}

/// Every coordinate within `radius` steps of the origin, in `(q, r)` order.
pub fn hex_coords(radius: u32) -> Vec<AxialCoord> {
    let r = i32::try_from(radius).unwrap_or(i32::MAX);
    let mut coords = Vec::new();
    for q in r.saturating_neg()..=r {
        let low = r.saturating_neg().max(q.saturating_neg().saturating_sub(r));
        let high = r.min(r.saturating_sub(q));
        for s in low..=high {
            coords.push(AxialCoord::new(q, s));
        }
    }
    coords
}

fn pick_terrain(rng: &mut SmallRng) -> Terrain {
    let total: u32 = TERRAIN_WEIGHTS
        .iter()
        .fold(0, |acc, (_, weight)| acc.saturating_add(*weight));
    let roll = rng.random_range(0..total);
    let mut cumulative: u32 = 0;
    for (terrain, weight) in TERRAIN_WEIGHTS {
        cumulative = cumulative.saturating_add(weight);
        if roll < cumulative {
            return terrain;
        }
    }
    Terrain::Plains
}

/// Generate a hexagonal map of `radius` rings and register every territory.
pub fn build_hex_map(radius: u32, seed: u64) -> Result<TerritoryRegistry, WorldError> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut registry = TerritoryRegistry::new();

    for coord in hex_coords(radius) {
        let terrain = pick_terrain(&mut rng);
        let mut base_modifiers = BTreeMap::new();
        if let Some(resource) = favoured_resource(terrain) {
            let bonus = rng.random_range(0..=MAX_BONUS_HUNDREDTHS);
            let modifier = Decimal::ONE
                .checked_add(Decimal::new(bonus, 2))
                .ok_or(WorldError::ArithmeticOverflow)?;
            base_modifiers.insert(resource, modifier);
        }
        registry.add_territory(Territory {
            id: TerritoryId::new(),
            coord,
            terrain,
            owner: None,
            base_modifiers,
            construct: None,
        })?;
    }
    Ok(registry)
}
