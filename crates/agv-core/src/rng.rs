//! Deterministic simulation-level RNG.
//!
//! The simulation draws randomness in exactly two places: picking a free
//! start node when a vehicle is added without one, and generating random
//! tasks in auto-dispatch mode.  Both run on the single simulation thread, so
//! one seeded `SmallRng` is enough and a fixed seed reproduces a run exactly.

use rand::rngs::SmallRng;
use rand::SeedableRng;

/// Simulation-level deterministic RNG.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Choose a random element from a slice.
    /// Returns `None` if the slice is empty.
    #[inline]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.0)
    }
}
