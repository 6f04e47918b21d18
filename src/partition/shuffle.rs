use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Source of the permutations used while splitting.
///
/// The partitioner asks for one source per split step, seeded from the user
/// seed, and feeds it every index slice it needs permuted in a fixed order.
pub trait Shuffle {
    fn shuffle(&mut self, indices: &mut [usize]);
}

/// Fisher-Yates over a ChaCha8 stream; stable across platforms and releases
/// of `rand_chacha`.
pub struct SeededShuffle {
    rng: ChaCha8Rng,
}

impl SeededShuffle {
    pub fn new(seed: i64) -> Self {
        Self {
            // Negative seeds reinterpret their bits
            rng: ChaCha8Rng::seed_from_u64(seed as u64),
        }
    }
}

impl Shuffle for SeededShuffle {
    fn shuffle(&mut self, indices: &mut [usize]) {
        indices.shuffle(&mut self.rng);
    }
}
