//! Digests that validators sign and leaves that higher tiers verify.

use tally_crypto::digest;
use tally_store::{ConstituencyResult, RollupBatch};
use tally_types::Hash256;

pub const BATCH_DOMAIN: &[u8] = b"tally-rollup-batch";
pub const CONSTITUENCY_LEAF_DOMAIN: &[u8] = b"tally-constituency-leaf";

/// Commitment to a constituency result inside its division's Merkle tree.
///
/// Covers the vote vector as well as the total, so a division proof binds every
/// per-candidate count it was built from.
pub fn constituency_leaf(result: &ConstituencyResult) -> Hash256 {
    let mut body = Vec::new();
    body.extend_from_slice(&result.id.to_le_bytes());
    body.extend_from_slice(result.merkle_root.as_bytes());
    body.extend_from_slice(&result.total_votes.to_le_bytes());
    body.extend_from_slice(&(result.candidate_ids.len() as u32).to_le_bytes());
    for (candidate, votes) in result.candidate_ids.iter().zip(&result.votes) {
        body.extend_from_slice(&candidate.to_le_bytes());
        body.extend_from_slice(&votes.to_le_bytes());
    }
    digest(CONSTITUENCY_LEAF_DOMAIN, &[&body])
}

/// The digest division validators sign for `batch`.
///
/// `included` must be the batch's results in `constituency_ids` order. The digest covers
/// each result's root, declared total and vote vector, so a signature commits to the
/// tally, not just the ids.
pub fn batch_digest(batch: &RollupBatch, included: &[&ConstituencyResult]) -> Hash256 {
    let mut body = Vec::new();
    body.extend_from_slice(&batch.id.to_le_bytes());
    body.extend_from_slice(&batch.division.to_le_bytes());
    body.extend_from_slice(&(included.len() as u32).to_le_bytes());
    for result in included {
        body.extend_from_slice(&result.id.to_le_bytes());
        body.extend_from_slice(result.merkle_root.as_bytes());
        body.extend_from_slice(&result.total_votes.to_le_bytes());
        for (candidate, votes) in result.candidate_ids.iter().zip(&result.votes) {
            body.extend_from_slice(&candidate.to_le_bytes());
            body.extend_from_slice(&votes.to_le_bytes());
        }
    }
    digest(BATCH_DOMAIN, &[&body])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tally_store::ResultState;
    use tally_types::{AccountId, Timestamp};

    fn result(votes: Vec<u64>) -> ConstituencyResult {
        ConstituencyResult {
            id: 1,
            division: 1,
            merkle_root: Hash256::new([4; 32]),
            total_votes: votes.iter().sum(),
            candidate_ids: (1..=votes.len() as u32).collect(),
            votes,
            state: ResultState::Verified,
            submitter: AccountId::new("s").unwrap(),
            submitted_at: Timestamp::EPOCH,
            verified_at: Some(Timestamp::EPOCH),
            verification: None,
            batch: Some(1),
        }
    }

    fn batch() -> RollupBatch {
        RollupBatch {
            id: 1,
            division: 1,
            constituency_ids: vec![1],
            created_at: Timestamp::EPOCH,
            signatures: Vec::new(),
        }
    }

    proptest! {
        #[test]
        fn digest_commits_to_every_count(
            votes in proptest::collection::vec(0u64..1_000, 1..8),
            index in any::<prop::sample::Index>(),
        ) {
            let original = result(votes.clone());
            let mut shifted = votes;
            let i = index.index(shifted.len());
            shifted[i] += 1;
            let tampered = result(shifted);
            prop_assert_ne!(
                batch_digest(&batch(), &[&original]),
                batch_digest(&batch(), &[&tampered])
            );
        }

        #[test]
        fn leaf_commits_to_vector_not_just_total(
            votes in proptest::collection::vec(1u64..1_000, 2..8),
            index in any::<prop::sample::Index>(),
        ) {
            let original = result(votes.clone());
            let mut moved = votes;
            let from = index.index(moved.len());
            let to = (from + 1) % moved.len();
            moved[from] -= 1;
            moved[to] += 1;
            let tampered = result(moved);
            prop_assert_eq!(original.total_votes, tampered.total_votes);
            prop_assert_ne!(constituency_leaf(&original), constituency_leaf(&tampered));
        }
    }
}
