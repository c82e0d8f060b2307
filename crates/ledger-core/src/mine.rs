use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

use crate::block::{genesis_block, prefix_bytes, Block};
use crate::constants::{HASH_BITS, MINE_BATCH_SIZE};
use crate::difficulty::next_difficulty;
use crate::error::MineError;
use crate::hash::count_leading_zero_bits;
use crate::params::ChainParams;

/// Everything about the next block except its nonce.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockTemplate {
    pub index: u64,
    pub previous_hash: String,
    pub timestamp: u64,
    pub data: String,
    pub difficulty: u32,
}

impl BlockTemplate {
    /// Template for the block following `chain`'s latest block.
    pub fn next(chain: &[Block], data: impl Into<String>, params: &ChainParams, now: u64) -> Self {
        let latest = chain.last().unwrap_or(genesis_block());
        Self {
            index: latest.index() + 1,
            previous_hash: latest.hash().to_string(),
            timestamp: now,
            data: data.into(),
            difficulty: next_difficulty(chain, params),
        }
    }

    /// Hasher already fed with every field but the nonce.
    fn base_hasher(&self) -> Sha256 {
        let mut hasher = Sha256::new();
        hasher.update(prefix_bytes(
            self.index,
            &self.previous_hash,
            self.timestamp,
            &self.data,
            self.difficulty,
        ));
        hasher
    }

    fn seal(&self, nonce: u64) -> Block {
        Block::new(
            self.index,
            self.previous_hash.clone(),
            self.timestamp,
            self.data.clone(),
            self.difficulty,
            nonce,
        )
    }
}

fn hits_target(base: &Sha256, nonce: u64, difficulty: u32) -> bool {
    let digest = base.clone().chain_update(nonce.to_le_bytes()).finalize();
    count_leading_zero_bits(&digest) >= difficulty
}

/// Mine the block following `chain` by trying nonces 0, 1, 2, ... until the
/// hash has the required leading zero bits.
pub fn mine(
    chain: &[Block],
    data: &str,
    params: &ChainParams,
    now: u64,
) -> Result<Block, MineError> {
    mine_cancellable(chain, data, params, now, &AtomicBool::new(false))
}

/// Like [`mine`], but gives up with [`MineError::Cancelled`] once `cancel` is
/// raised. The flag is polled every [`MINE_BATCH_SIZE`] nonces.
pub fn mine_cancellable(
    chain: &[Block],
    data: &str,
    params: &ChainParams,
    now: u64,
    cancel: &AtomicBool,
) -> Result<Block, MineError> {
    let template = BlockTemplate::next(chain, data, params, now);
    search(&template, cancel)
}

pub fn search(template: &BlockTemplate, cancel: &AtomicBool) -> Result<Block, MineError> {
    let difficulty = template.difficulty;
    if difficulty > HASH_BITS {
        return Err(MineError::NonceSpaceExhausted { difficulty });
    }
    let base = template.base_hasher();

    let mut nonce = 0u64;
    loop {
        if nonce % MINE_BATCH_SIZE == 0 && cancel.load(Ordering::Relaxed) {
            return Err(MineError::Cancelled);
        }
        if hits_target(&base, nonce, difficulty) {
            let block = template.seal(nonce);
            info!("Mined block {} with nonce {} and hash {}", block.index(), nonce, block.hash());
            return Ok(block);
        }
        nonce = nonce
            .checked_add(1)
            .ok_or(MineError::NonceSpaceExhausted { difficulty })?;
    }
}

/// Mines the next block by searching nonces in parallel across the rayon pool.
/// The winning nonce is whichever worker finds one first, not necessarily the
/// smallest.
pub fn mine_parallel(
    chain: &[Block],
    data: &str,
    params: &ChainParams,
    now: u64,
    cancel: &AtomicBool,
) -> Result<Block, MineError> {
    let template = BlockTemplate::next(chain, data, params, now);
    let difficulty = template.difficulty;
    if difficulty > HASH_BITS {
        return Err(MineError::NonceSpaceExhausted { difficulty });
    }
    let base = template.base_hasher();

    // Rayon will split this range across threads.
    let found = (0u64..u64::MAX).into_par_iter().find_map_any(|nonce| {
        if nonce % MINE_BATCH_SIZE == 0 && cancel.load(Ordering::Relaxed) {
            return Some(Err(MineError::Cancelled));
        }
        hits_target(&base, nonce, difficulty).then_some(Ok(nonce))
    });

    let nonce = found.unwrap_or(Err(MineError::NonceSpaceExhausted { difficulty }))?;
    let block = template.seal(nonce);
    info!(
        "Mined block {} with nonce {} and hash {}",
        block.index(),
        nonce,
        block.hash()
    );
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::meets_difficulty;
    use crate::validate::validate_successor;

    const NOW: u64 = 1_700_000_000;

    fn chain_at(difficulty: u32) -> Vec<Block> {
        let g = genesis_block().clone();
        let b1 = Block::new(1, g.hash(), NOW, "seed", difficulty, 0);
        vec![g, b1]
    }

    #[test]
    fn zero_difficulty_takes_first_nonce() {
        let chain = vec![genesis_block().clone()];
        let block = mine(&chain, "hello", &ChainParams::default(), NOW).unwrap();
        assert_eq!(block.nonce(), 0);
        assert_eq!(block.index(), 1);
        assert_eq!(block.previous_hash(), genesis_block().hash());
        assert_eq!(block.timestamp(), NOW);
        assert!(block.has_valid_hash());
    }

    #[test]
    fn mined_block_meets_difficulty_and_validates() {
        let params = ChainParams::default();
        let chain = chain_at(12);
        let block = mine(&chain, "work", &params, NOW).unwrap();
        assert_eq!(block.difficulty(), 12);
        assert!(meets_difficulty(block.hash(), 12));
        assert_eq!(block.compute_hash(), block.hash());
        assert_eq!(validate_successor(&chain[1], &block, &params, NOW), Ok(()));
    }

    #[test]
    fn parallel_miner_agrees_with_validation() {
        let params = ChainParams::default();
        let chain = chain_at(10);
        let block = mine_parallel(&chain, "work", &params, NOW, &AtomicBool::new(false)).unwrap();
        assert!(meets_difficulty(block.hash(), 10));
        assert_eq!(validate_successor(&chain[1], &block, &params, NOW), Ok(()));
    }

    #[test]
    fn raised_flag_cancels_search() {
        let params = ChainParams::default();
        let chain = chain_at(64);
        let cancel = AtomicBool::new(true);
        assert_eq!(
            mine_cancellable(&chain, "never", &params, NOW, &cancel),
            Err(MineError::Cancelled)
        );
        assert_eq!(
            mine_parallel(&chain, "never", &params, NOW, &cancel),
            Err(MineError::Cancelled)
        );
    }

    #[test]
    fn template_ignores_claimed_difficulty_without_proof_of_work() {
        let params = ChainParams {
            proof_of_work: false,
            ..ChainParams::default()
        };
        let chain = chain_at(40);
        let template = BlockTemplate::next(&chain, "cheap", &params, NOW);
        assert_eq!(template.difficulty, 0);
        let block = mine(&chain, "cheap", &params, NOW).unwrap();
        assert_eq!(block.nonce(), 0);
        assert_eq!(validate_successor(&chain[1], &block, &params, NOW), Ok(()));
    }

    #[test]
    fn impossible_difficulty_is_reported() {
        let template = BlockTemplate {
            index: 1,
            previous_hash: genesis_block().hash().to_string(),
            timestamp: NOW,
            data: String::new(),
            difficulty: 300,
        };
        assert_eq!(
            search(&template, &AtomicBool::new(false)),
            Err(MineError::NonceSpaceExhausted { difficulty: 300 })
        );
    }
}
