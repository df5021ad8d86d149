//! Deterministic random streams.
//!
//! Nothing in a study draws from a thread-local or OS random source. Every
//! trial gets its own `TrialRng`, seeded from the master seed, the scenario
//! index and the trial index. The seed of a trial therefore depends only on
//! its position in the study, never on which worker ran it or in what order.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Random source handed to generators, one per trial
pub type TrialRng = StdRng;

const GOLDEN_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;

/// Derives non-overlapping seeds from a master seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedStream {
    seed: u64,
}

impl SeedStream {
    #[must_use]
    pub fn new(master_seed: u64) -> Self {
        Self { seed: master_seed }
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Sub-stream for one scenario of a sweep
    #[must_use]
    pub fn scenario(&self, scenario_index: usize) -> SeedStream {
        SeedStream {
            seed: derive(self.seed, 0x5343_454e ^ scenario_index as u64),
        }
    }

    /// Seed for one trial within this stream
    #[must_use]
    pub fn trial_seed(&self, trial_index: usize) -> u64 {
        derive(self.seed, trial_index as u64)
    }

    #[must_use]
    pub fn trial_rng(&self, trial_index: usize) -> TrialRng {
        TrialRng::seed_from_u64(self.trial_seed(trial_index))
    }
}

/// Mix an index into a seed with the SplitMix64 finalizer
fn derive(seed: u64, index: u64) -> u64 {
    let mut z = seed ^ index.wrapping_add(1).wrapping_mul(GOLDEN_GAMMA);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
