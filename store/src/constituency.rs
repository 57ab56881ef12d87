//! Constituency results as held by a division rollup aggregator.

use crate::StoreError;
use serde::{Deserialize, Serialize};
use tally_types::{AccountId, BatchId, CandidateId, ConstituencyId, DivisionId, Hash256, Timestamp};

/// Lifecycle of a submitted lower-tier result. Only moves forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultState {
    Submitted,
    Verified,
}

/// How a result came to be verified.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationMethod {
    /// A Merkle inclusion proof checked against the submitted root.
    Proof,
    /// The administrative bypass, performed by `admin`.
    Forced { admin: AccountId },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstituencyResult {
    pub id: ConstituencyId,
    pub division: DivisionId,
    pub merkle_root: Hash256,
    pub total_votes: u64,
    pub candidate_ids: Vec<CandidateId>,
    /// Parallel to `candidate_ids`.
    pub votes: Vec<u64>,
    pub state: ResultState,
    pub submitter: AccountId,
    pub submitted_at: Timestamp,
    pub verified_at: Option<Timestamp>,
    pub verification: Option<VerificationMethod>,
    /// The rollup batch this result was included in. A result joins at most one batch.
    pub batch: Option<BatchId>,
}

impl ConstituencyResult {
    pub fn is_verified(&self) -> bool {
        self.state == ResultState::Verified
    }
}

pub trait ConstituencyStore {
    fn put_constituency_result(&self, result: &ConstituencyResult) -> Result<(), StoreError>;

    fn get_constituency_result(
        &self,
        id: ConstituencyId,
    ) -> Result<Option<ConstituencyResult>, StoreError>;

    /// All results submitted to `division`, ordered by constituency id.
    fn iter_constituency_results(
        &self,
        division: DivisionId,
    ) -> Result<Vec<ConstituencyResult>, StoreError>;
}
