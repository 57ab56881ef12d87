//! Candidate storage, keyed by (constituency, candidate id).

use crate::StoreError;
use serde::{Deserialize, Serialize};
use tally_types::{CandidateId, ConstituencyId, Timestamp};

/// A candidate on one constituency's ballot, with its running vote counter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub party: String,
    /// Only ever increases.
    pub votes: u64,
    /// Inactive candidates reject new votes and are left out of results.
    pub active: bool,
    pub registered_at: Timestamp,
}

pub trait CandidateStore {
    fn put_candidate(
        &self,
        constituency: ConstituencyId,
        candidate: &Candidate,
    ) -> Result<(), StoreError>;

    fn get_candidate(
        &self,
        constituency: ConstituencyId,
        id: CandidateId,
    ) -> Result<Option<Candidate>, StoreError>;

    /// All candidates of a constituency, ordered by id.
    fn iter_candidates(&self, constituency: ConstituencyId) -> Result<Vec<Candidate>, StoreError>;
}
