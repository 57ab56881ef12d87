//! Vote leaves: the unit the constituency Merkle tree is built over.

use crate::hash::digest;
use tally_types::{CandidateId, Hash256, Timestamp, VoterId};

/// Domain tag prepended to every vote leaf.
pub const LEAF_DOMAIN: &[u8] = b"tally-vote-leaf";

/// Deterministic leaf hash of a vote.
///
/// The voter identity is length-prefixed so `("ab", 1)` and `("a", ...)` can never
/// serialize to the same bytes.
pub fn generate_leaf(voter: &VoterId, candidate: CandidateId, timestamp: Timestamp) -> Hash256 {
    let voter_bytes = voter.as_str().as_bytes();
    let len = (voter_bytes.len() as u32).to_le_bytes();
    digest(
        LEAF_DOMAIN,
        &[
            &len,
            voter_bytes,
            &candidate.to_le_bytes(),
            &timestamp.as_secs().to_le_bytes(),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn voter(s: &str) -> VoterId {
        VoterId::new(s).unwrap()
    }

    #[test]
    fn each_field_changes_the_leaf() {
        let base = generate_leaf(&voter("alice"), 1, Timestamp::new(100));
        assert_ne!(base, generate_leaf(&voter("bob"), 1, Timestamp::new(100)));
        assert_ne!(base, generate_leaf(&voter("alice"), 2, Timestamp::new(100)));
        assert_ne!(base, generate_leaf(&voter("alice"), 1, Timestamp::new(101)));
    }

    proptest! {
        #[test]
        fn leaf_is_deterministic(
            name in "[a-z0-9]{1,32}",
            candidate in 1u32..1_000,
            ts in 0u64..u64::MAX,
        ) {
            let v = voter(&name);
            let first = generate_leaf(&v, candidate, Timestamp::new(ts));
            let second = generate_leaf(&v.clone(), candidate, Timestamp::new(ts));
            prop_assert_eq!(first, second);
        }
    }
}
