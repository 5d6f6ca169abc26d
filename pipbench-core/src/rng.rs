//! Deterministic RNG hierarchy.
//!
//! The run seed is expanded into one sub-seed per `(period, stream)` pair via
//! BLAKE3. Derivation is hash-based, so a period's generator does not depend
//! on which worker picks it up or in what order periods are scheduled.

use crate::domain::PeriodId;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Stream name for the generator handed to a period's predictor.
pub const PREDICTOR_STREAM: &str = "predictor";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RngHierarchy {
    run_seed: u64,
}

impl RngHierarchy {
    pub fn new(run_seed: u64) -> Self {
        Self { run_seed }
    }

    pub fn run_seed(&self) -> u64 {
        self.run_seed
    }

    /// Sub-seed for one named stream of one period.
    pub fn sub_seed(&self, period: PeriodId, stream: &str) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.run_seed.to_le_bytes());
        hasher.update(&(period.0 as u64).to_le_bytes());
        hasher.update(stream.as_bytes());
        let hash = hasher.finalize();
        let mut head = [0u8; 8];
        head.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(head)
    }

    pub fn rng_for(&self, period: PeriodId, stream: &str) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(period, stream))
    }

    pub fn predictor_rng(&self, period: PeriodId) -> StdRng {
        self.rng_for(period, PREDICTOR_STREAM)
    }
}
