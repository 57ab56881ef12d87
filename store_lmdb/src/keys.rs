//! Binary key layouts.
//!
//! Composite keys put the owning id first so all records of one owner form a contiguous
//! range that a prefix scan can walk.

use tally_types::{CandidateId, ConstituencyId, ValidatorScope, VoterId};

pub(crate) const NATIONAL_KEY: &[u8] = b"national";

pub(crate) fn u32_key(id: u32) -> [u8; 4] {
    id.to_be_bytes()
}

pub(crate) fn u64_key(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

/// `constituency_be ++ candidate_be`
pub(crate) fn candidate_key(constituency: ConstituencyId, id: CandidateId) -> [u8; 8] {
    let mut key = [0u8; 8];
    key[..4].copy_from_slice(&constituency.to_be_bytes());
    key[4..].copy_from_slice(&id.to_be_bytes());
    key
}

/// `constituency_be ++ voter_utf8`
pub(crate) fn vote_key(constituency: ConstituencyId, voter: &VoterId) -> Vec<u8> {
    let v = voter.as_str().as_bytes();
    let mut key = Vec::with_capacity(4 + v.len());
    key.extend_from_slice(&constituency.to_be_bytes());
    key.extend_from_slice(v);
    key
}

pub(crate) fn scope_key(scope: ValidatorScope) -> [u8; 1] {
    [scope.tag()]
}

/// `scope_tag ++ version_be`
pub(crate) fn validator_history_key(scope: ValidatorScope, version: u64) -> [u8; 9] {
    let mut key = [0u8; 9];
    key[0] = scope.tag();
    key[1..].copy_from_slice(&version.to_be_bytes());
    key
}

/// Turn `prefix` into the smallest key greater than every key starting with it.
///
/// Returns `false` if no such key exists (the prefix is all `0xFF`).
pub(crate) fn increment_prefix(prefix: &mut Vec<u8>) -> bool {
    while let Some(last) = prefix.last_mut() {
        if *last < u8::MAX {
            *last += 1;
            return true;
        }
        prefix.pop();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_carries() {
        let mut p = vec![0x01, 0xFF];
        assert!(increment_prefix(&mut p));
        assert_eq!(p, vec![0x02]);

        let mut all_ff = vec![0xFF, 0xFF];
        assert!(!increment_prefix(&mut all_ff));
    }

    #[test]
    fn candidate_keys_sort_by_constituency_then_id() {
        assert!(candidate_key(1, 300) < candidate_key(2, 1));
        assert!(candidate_key(1, 2) < candidate_key(1, 256));
    }
}
