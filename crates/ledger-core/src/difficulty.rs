//! Difficulty retargeting and chain work.
//!
//! Every `difficulty_adjustment_interval` blocks the time taken by the last
//! window is compared with `block_generation_interval * interval`:
//! - under half the expected time: difficulty + 1
//! - over twice the expected time: difficulty - 1 (floored at 0)
//! - otherwise unchanged
//!
//! The controller only ever steps by one per window. With proof-of-work
//! off, difficulty is pinned at 0 and chains are weighed by length.

use crate::block::Block;
use crate::params::ChainParams;

/// Difficulty required of the block that would follow `chain`'s latest block.
pub fn next_difficulty(chain: &[Block], params: &ChainParams) -> u32 {
    if !params.proof_of_work {
        return 0;
    }
    let Some(latest) = chain.last() else {
        return 0;
    };
    let interval = params.difficulty_adjustment_interval;
    if interval == 0 || latest.index() == 0 || latest.index() % interval != 0 {
        return latest.difficulty();
    }
    adjusted_difficulty(chain, latest, params)
}

fn adjusted_difficulty(chain: &[Block], latest: &Block, params: &ChainParams) -> u32 {
    let window_start = latest.index() - params.difficulty_adjustment_interval;
    let Some(first) = usize::try_from(window_start)
        .ok()
        .and_then(|i| chain.get(i))
    else {
        return latest.difficulty();
    };

    let expected = params.expected_window_secs();
    let actual = latest.timestamp().saturating_sub(first.timestamp());

    if actual < expected / 2 {
        latest.difficulty().saturating_add(1)
    } else if actual > expected.saturating_mul(2) {
        latest.difficulty().saturating_sub(1)
    } else {
        latest.difficulty()
    }
}

/// Work represented by one block: `2^difficulty`.
pub fn block_work(difficulty: u32) -> u128 {
    1u128.checked_shl(difficulty).unwrap_or(u128::MAX)
}

/// Sum of `2^difficulty` over `chain`. This is the fork-choice metric.
pub fn cumulative_work(chain: &[Block]) -> u128 {
    chain
        .iter()
        .fold(0u128, |acc, b| acc.saturating_add(block_work(b.difficulty())))
}

/// Fork-choice weight of `chain`: cumulative work under proof-of-work,
/// block count otherwise.
pub fn chain_weight(chain: &[Block], params: &ChainParams) -> u128 {
    if params.proof_of_work {
        cumulative_work(chain)
    } else {
        chain.len() as u128
    }
}
