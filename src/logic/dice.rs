//! Random sources for dice and opponent selection.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Where dice values and random picks come from. Injected so games can be replayed in tests.
pub trait RandomSource {
    /// One die, 1..=6.
    fn roll_die(&mut self) -> u8;
    /// An index in `0..len`. `len` is never 0.
    fn pick_index(&mut self, len: usize) -> usize;
}

/// `RandomSource` backed by any `rand` generator.
#[derive(Clone, Debug)]
pub struct RngSource<R>(R);

impl RngSource<StdRng> {
    /// OS-seeded generator for real games.
    pub fn from_entropy() -> Self {
        Self(StdRng::from_entropy())
    }

    /// Reproducible generator.
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn roll_die(&mut self) -> u8 {
        self.0.gen_range(1..=6)
    }

    fn pick_index(&mut self, len: usize) -> usize {
        self.0.gen_range(0..len)
    }
}

/// Replays fixed dice and picks; once a queue runs dry it yields 1 (dice) or 0 (picks).
#[derive(Clone, Debug, Default)]
pub struct ScriptedSource {
    dice: VecDeque<u8>,
    picks: VecDeque<usize>,
}

impl ScriptedSource {
    pub fn new(dice: impl IntoIterator<Item = u8>, picks: impl IntoIterator<Item = usize>) -> Self {
        Self {
            dice: dice.into_iter().collect(),
            picks: picks.into_iter().collect(),
        }
    }

    /// Only dice; every pick is 0.
    pub fn dice(dice: impl IntoIterator<Item = u8>) -> Self {
        Self::new(dice, [])
    }
}

impl RandomSource for ScriptedSource {
    fn roll_die(&mut self) -> u8 {
        self.dice.pop_front().unwrap_or(1).clamp(1, 6)
    }

    fn pick_index(&mut self, len: usize) -> usize {
        self.picks.pop_front().unwrap_or(0) % len
    }
}
