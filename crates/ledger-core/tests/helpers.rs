#![allow(dead_code)]

use ledger_core::{genesis_block, Block, ChainParams, ChainStore, FixedClock};
use serde_json::Value;
use std::sync::Arc;

pub const NOW: u64 = 1_700_000_000;

pub fn create_store() -> (Arc<FixedClock>, ChainStore) {
    let clock = Arc::new(FixedClock::new(NOW));
    let store = ChainStore::with_clock(ChainParams::default(), clock.clone());
    (clock, store)
}

/// Block following `prev` at difficulty 0.
pub fn next_block(prev: &Block, data: &str) -> Block {
    Block::new(prev.index() + 1, prev.hash(), NOW, data, 0, 0)
}

/// Genesis followed by `len` blocks whose payloads start with `tag`.
pub fn build_chain(len: usize, tag: &str) -> Vec<Block> {
    let mut chain = vec![genesis_block().clone()];
    for i in 1..=len {
        let block = next_block(&chain[i - 1], &format!("{tag}-{i}"));
        chain.push(block);
    }
    chain
}

/// Copy of `block` with one JSON field overwritten and the stored hash kept.
pub fn tamper(block: &Block, field: &str, value: Value) -> Block {
    let mut json = serde_json::to_value(block).expect("block serializes");
    json[field] = value;
    serde_json::from_value(json).expect("tampered block still decodes")
}

pub fn to_values(blocks: &[Block]) -> Vec<Value> {
    blocks
        .iter()
        .map(|b| serde_json::to_value(b).expect("block serializes"))
        .collect()
}
