//! Division results as held by the national finalizer.

use crate::constituency::ResultState;
use crate::StoreError;
use serde::{Deserialize, Serialize};
use tally_types::{AccountId, CandidateId, DivisionId, Hash256, Timestamp};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivisionResult {
    pub id: DivisionId,
    pub merkle_root: Hash256,
    pub total_votes: u64,
    pub candidate_ids: Vec<CandidateId>,
    pub votes: Vec<u64>,
    pub state: ResultState,
    pub submitter: AccountId,
    pub submitted_at: Timestamp,
    pub verified_at: Option<Timestamp>,
}

impl DivisionResult {
    pub fn is_verified(&self) -> bool {
        self.state == ResultState::Verified
    }
}

pub trait DivisionStore {
    fn put_division_result(&self, result: &DivisionResult) -> Result<(), StoreError>;

    fn get_division_result(&self, id: DivisionId) -> Result<Option<DivisionResult>, StoreError>;

    /// Ordered by division id.
    fn iter_division_results(&self) -> Result<Vec<DivisionResult>, StoreError>;
}
