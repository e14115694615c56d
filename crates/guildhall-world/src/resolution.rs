//! Deterministic dispute resolution for contested territory claims.
//!
//! The earliest claim wins: lowest timestamp first, then lowest submission
//! sequence. Turns are sequential, so the sequence always separates claims
//! made in the same millisecond. Only claims that share both keys go to a
//! draw with a [`SmallRng`] seeded from `(game seed, cycle, territory)`, so
//! identical inputs always pick the same winner regardless of the order the
//! claims arrived in.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use guildhall_types::{Claim, TerritoryId};

/// Derive the draw seed for one territory in one cycle.
pub fn tie_break_seed(game_seed: u64, cycle: u32, territory: TerritoryId) -> u64 {
    // splitmix64 finaliser over the combined inputs.
    let mut z = game_seed
        ^ u64::from(cycle).rotate_left(32)
        ^ territory.fold_u64();
    z = (z ^ z.wrapping_shr(30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ z.wrapping_shr(27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ z.wrapping_shr(31)
}

/// Pick the winning claim among `claims` for one territory.
///
/// Returns `None` only when `claims` is empty.
pub fn pick_winner(
    claims: &[Claim],
    game_seed: u64,
    cycle: u32,
    territory: TerritoryId,
) -> Option<&Claim> {
    let earliest = claims.iter().map(|c| (c.claimed_at_ms, c.seq)).min()?;

    // Candidates in player order so arrival order cannot influence the draw.
    let mut candidates: Vec<&Claim> = claims
        .iter()
        .filter(|c| (c.claimed_at_ms, c.seq) == earliest)
        .collect();
    candidates.sort_by_key(|c| c.player);

    if candidates.len() == 1 {
        return candidates.first().copied();
    }

    let mut rng = SmallRng::seed_from_u64(tie_break_seed(game_seed, cycle, territory));
    let index = rng.random_range(0..candidates.len());
    candidates.get(index).copied()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use guildhall_types::{Phase, PlayerId};

    use super::*;

    fn claim(territory: TerritoryId, player: PlayerId, seq: u64, at: u64) -> Claim {
        Claim {
            territory,
            player,
            cycle: 1,
            phase: Phase::TerritorySelection,
            seq,
            claimed_at_ms: at,
        }
    }

    #[test]
    fn earliest_timestamp_wins() {
        let territory = TerritoryId::new();
        let early = PlayerId::new();
        let late = PlayerId::new();
        let claims = vec![claim(territory, late, 0, 500), claim(territory, early, 1, 100)];

        let winner = pick_winner(&claims, 42, 1, territory).unwrap();
        assert_eq!(winner.player, early);
    }

    #[test]
    fn same_millisecond_goes_to_the_first_submission() {
        let territory = TerritoryId::new();
        let first = PlayerId::new();
        let second = PlayerId::new();
        let claims = vec![claim(territory, second, 4, 100), claim(territory, first, 3, 100)];

        for seed in 0..40 {
            let winner = pick_winner(&claims, seed, 1, territory).unwrap();
            assert_eq!(winner.player, first);
        }
    }

    #[test]
    fn empty_claims_have_no_winner() {
        assert!(pick_winner(&[], 42, 1, TerritoryId::new()).is_none());
    }

    #[test]
    fn tied_draw_ignores_arrival_order() {
        let territory = TerritoryId::new();
        let a = PlayerId::new();
        let b = PlayerId::new();
        let c = PlayerId::new();
        let forward = vec![
            claim(territory, a, 0, 10),
            claim(territory, b, 0, 10),
            claim(territory, c, 0, 10),
        ];
        let reversed: Vec<Claim> = forward.iter().rev().cloned().collect();

        let first = pick_winner(&forward, 7, 3, territory).unwrap().player;
        let second = pick_winner(&reversed, 7, 3, territory).unwrap().player;
        assert_eq!(first, second);
    }

    #[test]
    fn seed_depends_on_every_input() {
        let territory = TerritoryId::new();
        let base = tie_break_seed(1, 1, territory);
        assert_ne!(base, tie_break_seed(2, 1, territory));
        assert_ne!(base, tie_break_seed(1, 2, territory));
        assert_ne!(base, tie_break_seed(1, 1, TerritoryId::new()));
    }
}
