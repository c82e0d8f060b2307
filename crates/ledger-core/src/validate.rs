//! Single-block and whole-chain validation.
//!
//! Successor checks, in order:
//! 1. structure (hex digests, positive timestamp)
//! 2. index == prev.index + 1
//! 3. previous_hash == prev.hash
//! 4. prev.timestamp - skew <= timestamp <= now + skew
//! 5. hash carries `difficulty` leading zero bits (when proof-of-work is on)
//! 6. hash recomputes from the block's own fields
//!
//! The order only affects which error is reported; all checks must hold.

use crate::block::{genesis_block, Block};
use crate::error::ValidationError;
use crate::hash::{is_hex_digest, meets_difficulty};
use crate::params::ChainParams;

/// Check that `next` may follow `prev`. `now` is the validator's current time.
pub fn validate_successor(
    prev: &Block,
    next: &Block,
    params: &ChainParams,
    now: u64,
) -> Result<(), ValidationError> {
    if !next.is_structurally_valid() {
        return Err(ValidationError::BadStructure {
            index: next.index(),
            reason: structure_fault(next),
        });
    }

    let expected_index = prev.index().saturating_add(1);
    if next.index() != expected_index {
        return Err(ValidationError::BadIndex {
            expected: expected_index,
            actual: next.index(),
        });
    }

    if next.previous_hash() != prev.hash() {
        return Err(ValidationError::BadLink {
            expected: prev.hash().to_string(),
            actual: next.previous_hash().to_string(),
        });
    }

    let earliest = prev.timestamp().saturating_sub(params.timestamp_skew);
    let latest = now.saturating_add(params.timestamp_skew);
    if next.timestamp() < earliest || next.timestamp() > latest {
        return Err(ValidationError::BadTimestamp {
            timestamp: next.timestamp(),
            earliest,
            latest,
        });
    }

    if params.proof_of_work && !meets_difficulty(next.hash(), next.difficulty()) {
        return Err(ValidationError::BadProofOfWork {
            required: next.difficulty(),
            hash: next.hash().to_string(),
        });
    }

    let computed = next.compute_hash();
    if computed != next.hash() {
        return Err(ValidationError::BadHash {
            computed,
            stored: next.hash().to_string(),
        });
    }

    Ok(())
}

/// Validate a whole candidate sequence: genesis first, then every link.
/// Stops at the first failure.
pub fn validate_chain(
    candidate: &[Block],
    params: &ChainParams,
    now: u64,
) -> Result<(), ValidationError> {
    match candidate.first() {
        Some(first) if first == genesis_block() => {}
        _ => return Err(ValidationError::NotGenesis),
    }
    candidate
        .windows(2)
        .try_for_each(|pair| validate_successor(&pair[0], &pair[1], params, now))
}

fn structure_fault(block: &Block) -> &'static str {
    if !is_hex_digest(block.hash()) {
        "hash is not a 64 character hex digest"
    } else if !is_hex_digest(block.previous_hash()) {
        "previous hash is not a 64 character hex digest"
    } else {
        "timestamp must be positive"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_700_000_000;

    fn params() -> ChainParams {
        ChainParams::default()
    }

    fn next_after(prev: &Block, timestamp: u64, data: &str) -> Block {
        Block::new(prev.index() + 1, prev.hash(), timestamp, data, 0, 0)
    }

    #[test]
    fn accepts_valid_successor() {
        let g = genesis_block();
        let b1 = next_after(g, NOW, "one");
        assert_eq!(validate_successor(g, &b1, &params(), NOW), Ok(()));
    }

    #[test]
    fn rejects_bad_structure_first() {
        let g = genesis_block();
        // Wrong index as well, but structure is reported.
        let b = Block::new(5, "xyz", NOW, "one", 0, 0);
        assert!(matches!(
            validate_successor(g, &b, &params(), NOW),
            Err(ValidationError::BadStructure { index: 5, .. })
        ));
    }

    #[test]
    fn rejects_bad_index() {
        let g = genesis_block();
        let b = Block::new(2, g.hash(), NOW, "one", 0, 0);
        assert_eq!(
            validate_successor(g, &b, &params(), NOW),
            Err(ValidationError::BadIndex {
                expected: 1,
                actual: 2
            })
        );
    }

    #[test]
    fn rejects_bad_link() {
        let g = genesis_block();
        let b = Block::new(1, "f".repeat(64), NOW, "one", 0, 0);
        assert!(matches!(
            validate_successor(g, &b, &params(), NOW),
            Err(ValidationError::BadLink { .. })
        ));
    }

    #[test]
    fn timestamp_window_edges() {
        let g = genesis_block();
        let b1 = next_after(g, NOW, "one");
        let p = params();

        let just_early = next_after(&b1, NOW - p.timestamp_skew, "ok");
        assert_eq!(validate_successor(&b1, &just_early, &p, NOW), Ok(()));
        let too_early = next_after(&b1, NOW - p.timestamp_skew - 1, "late");
        assert!(matches!(
            validate_successor(&b1, &too_early, &p, NOW),
            Err(ValidationError::BadTimestamp { .. })
        ));

        let just_future = next_after(&b1, NOW + p.timestamp_skew, "ok");
        assert_eq!(validate_successor(&b1, &just_future, &p, NOW), Ok(()));
        let too_future = next_after(&b1, NOW + p.timestamp_skew + 1, "early");
        assert!(matches!(
            validate_successor(&b1, &too_future, &p, NOW),
            Err(ValidationError::BadTimestamp { .. })
        ));
    }

    #[test]
    fn proof_of_work_toggle() {
        let g = genesis_block();
        // Nonce 0 at difficulty 40 is all but certain to miss the target.
        let b = Block::new(1, g.hash(), NOW, "one", 40, 0);
        assert!(matches!(
            validate_successor(g, &b, &params(), NOW),
            Err(ValidationError::BadProofOfWork { required: 40, .. })
        ));

        let relaxed = ChainParams {
            proof_of_work: false,
            ..params()
        };
        assert_eq!(validate_successor(g, &b, &relaxed, NOW), Ok(()));
    }

    #[test]
    fn rejects_tampered_data() {
        let g = genesis_block();
        let b1 = next_after(g, NOW, "one");
        let mut json = serde_json::to_value(&b1).unwrap();
        json["data"] = serde_json::json!("two");
        let tampered: Block = serde_json::from_value(json).unwrap();
        assert!(matches!(
            validate_successor(g, &tampered, &params(), NOW),
            Err(ValidationError::BadHash { .. })
        ));
    }

    #[test]
    fn chain_must_start_at_genesis() {
        let p = params();
        assert_eq!(validate_chain(&[], &p, NOW), Err(ValidationError::NotGenesis));

        let other = Block::new(0, genesis_block().previous_hash(), 1, "other genesis", 0, 0);
        assert_eq!(
            validate_chain(&[other], &p, NOW),
            Err(ValidationError::NotGenesis)
        );
        assert_eq!(validate_chain(&[genesis_block().clone()], &p, NOW), Ok(()));
    }

    #[test]
    fn chain_short_circuits_on_first_bad_link() {
        let g = genesis_block().clone();
        let b1 = next_after(&g, NOW, "one");
        let b2 = next_after(&b1, NOW, "two");
        let bad = Block::new(2, g.hash(), NOW, "two'", 0, 0);
        let p = params();
        assert_eq!(validate_chain(&[g.clone(), b1.clone(), b2], &p, NOW), Ok(()));
        assert!(matches!(
            validate_chain(&[g, b1, bad], &p, NOW),
            Err(ValidationError::BadLink { .. })
        ));
    }
}
