//! Per-entity deterministic pseudo-randomness (xorshift64).
//! Same entity id and salt give the same sequence in every frame and after reload.

use crate::api::types::EntityId;

/// Salts keep independent random choices of one entity uncorrelated.
pub mod salt {
    pub const RANDOM_ROTATION: u64 = 0x5EED_0001;
    pub const COLLECTION_VARIANT: u64 = 0x5EED_0002;
}

/// Seedable xorshift64 generator. Deterministic, no global state.
#[derive(Debug, Clone)]
pub struct StableRng {
    state: u64,
}

impl StableRng {
    pub fn new(seed: u64) -> Self {
        StableRng {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    /// Generator for one entity; the id is scrambled so neighbouring ids diverge.
    pub fn for_entity(id: EntityId, salt: u64) -> Self {
        Self::new(scramble(id.0 ^ salt))
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform in [0, upper_bound). Returns 0 for an empty range.
    pub fn next_int(&mut self, upper_bound: u32) -> u32 {
        if upper_bound == 0 {
            return 0;
        }
        (self.next_u64() % upper_bound as u64) as u32
    }

    /// Uniform in [0, 1).
    pub fn next_unit(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Uniform in [-extent, extent).
    pub fn next_symmetric(&mut self, extent: f32) -> f32 {
        (self.next_unit() * 2.0 - 1.0) * extent
    }
}

/// splitmix64 finalizer.
fn scramble(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
