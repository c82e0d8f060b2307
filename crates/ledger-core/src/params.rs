use serde::{Deserialize, Serialize};

use crate::constants::{
    BLOCK_GENERATION_INTERVAL, DIFFICULTY_ADJUSTMENT_INTERVAL, TIMESTAMP_SKEW_SECS,
};

/// Consensus knobs. Every cooperating node must run with identical values;
/// a mismatch splits the network into incompatible forks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainParams {
    /// Target seconds per block.
    pub block_generation_interval: u64,
    /// Blocks between difficulty recalculations. Must be non-zero.
    pub difficulty_adjustment_interval: u64,
    /// Allowed clock skew in seconds.
    pub timestamp_skew: u64,
    /// Enforce each block's declared difficulty against its hash.
    pub proof_of_work: bool,
}

impl ChainParams {
    /// Expected seconds per adjustment window.
    pub fn expected_window_secs(&self) -> u64 {
        self.block_generation_interval
            .saturating_mul(self.difficulty_adjustment_interval)
    }
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            block_generation_interval: BLOCK_GENERATION_INTERVAL,
            difficulty_adjustment_interval: DIFFICULTY_ADJUSTMENT_INTERVAL,
            timestamp_skew: TIMESTAMP_SKEW_SECS,
            proof_of_work: true,
        }
    }
}
