//! Six-sided dice for installation outcomes.

use std::collections::VecDeque;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Source of uniform rolls in `1..=6`.
pub trait DiceRoller: core::fmt::Debug {
    /// Roll one die.
    fn roll_d6(&mut self) -> u8;
}

/// Seeded pseudo-random die. Reproducible for a given seed.
#[derive(Debug, Clone)]
pub struct SeededDice {
    rng: SmallRng,
}

impl SeededDice {
    /// Create a die from a seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl DiceRoller for SeededDice {
    fn roll_d6(&mut self) -> u8 {
        self.rng.random_range(1..=6)
    }
}

/// Die that returns a fixed script of faces, then repeats a fallback.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    faces: VecDeque<u8>,
    fallback: u8,
}

impl ScriptedDice {
    /// Script the given faces. Once exhausted, every roll is a 4.
    pub fn new(faces: impl IntoIterator<Item = u8>) -> Self {
        Self {
            faces: faces.into_iter().collect(),
            fallback: 4,
        }
    }

    /// Set the face returned after the script runs out.
    #[must_use]
    pub const fn with_fallback(mut self, face: u8) -> Self {
        self.fallback = face;
        self
    }

    /// Faces not yet rolled.
    pub fn remaining(&self) -> usize {
        self.faces.len()
    }
}

impl DiceRoller for ScriptedDice {
    fn roll_d6(&mut self) -> u8 {
        self.faces.pop_front().unwrap_or(self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_dice_stay_on_the_die() {
        let mut dice = SeededDice::new(17);
        for _ in 0..1_000 {
            let face = dice.roll_d6();
            assert!((1..=6).contains(&face));
        }
    }

    #[test]
    fn same_seed_same_rolls() {
        let mut a = SeededDice::new(3);
        let mut b = SeededDice::new(3);
        let first: Vec<u8> = (0..20).map(|_| a.roll_d6()).collect();
        let second: Vec<u8> = (0..20).map(|_| b.roll_d6()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn script_then_fallback() {
        let mut dice = ScriptedDice::new([1, 6]).with_fallback(2);
        assert_eq!(dice.roll_d6(), 1);
        assert_eq!(dice.remaining(), 1);
        assert_eq!(dice.roll_d6(), 6);
        assert_eq!(dice.roll_d6(), 2);
        assert_eq!(dice.roll_d6(), 2);
    }
}
