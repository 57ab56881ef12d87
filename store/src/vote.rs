//! Vote record storage, keyed by (constituency, voter).

use crate::candidate::Candidate;
use crate::StoreError;
use serde::{Deserialize, Serialize};
use tally_types::{CandidateId, ConstituencyId, Hash256, Timestamp, VoterId};

/// One voter's vote. At most one exists per (constituency, voter).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub constituency: ConstituencyId,
    pub voter: VoterId,
    pub candidate: CandidateId,
    pub timestamp: Timestamp,
    /// `generate_leaf(voter, candidate, timestamp)`.
    pub leaf: Hash256,
    /// Cast order within the constituency, from 0. Fixes the Merkle leaf order.
    pub sequence: u64,
}

pub trait VoteStore {
    fn get_vote(
        &self,
        constituency: ConstituencyId,
        voter: &VoterId,
    ) -> Result<Option<VoteRecord>, StoreError>;

    /// All votes of a constituency, ordered by `sequence`.
    fn iter_votes(&self, constituency: ConstituencyId) -> Result<Vec<VoteRecord>, StoreError>;

    fn vote_count(&self, constituency: ConstituencyId) -> Result<u64, StoreError>;

    /// Store a new vote together with the candidate carrying its incremented counter.
    ///
    /// Fails with [`StoreError::Duplicate`] if the voter already has a record; in that
    /// case neither record is written.
    fn record_vote(&self, vote: &VoteRecord, candidate: &Candidate) -> Result<(), StoreError>;
}
