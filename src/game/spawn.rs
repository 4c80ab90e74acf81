//! Initial placement for the local avatar

use std::f32::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::Pose2D;

/// Half-width of the square spawn area centered on the origin
pub const SPAWN_HALF_EXTENT: f32 = 25.0;

/// Draws spawn poses uniformly over the spawn square. Collisions between
/// clients are possible and accepted.
pub struct SpawnPointGenerator {
    rng: ChaCha8Rng,
}

impl SpawnPointGenerator {
    /// Seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    /// Deterministic sequence for a given seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn generate(&mut self) -> Pose2D {
        let x = self.rng.gen_range(-SPAWN_HALF_EXTENT..SPAWN_HALF_EXTENT);
        let z = self.rng.gen_range(-SPAWN_HALF_EXTENT..SPAWN_HALF_EXTENT);
        let rotation = self.rng.gen_range(0.0..TAU);
        Pose2D::new(x, z, rotation)
    }
}

impl Default for SpawnPointGenerator {
    fn default() -> Self {
        Self::new()
    }
}
