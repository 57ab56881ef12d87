//! Serializable snapshot of the node's tiers, for operators and the CLI.

use serde::Serialize;
use tally_types::{BatchId, CandidateId, ConstituencyId, DivisionId, Timestamp};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConstituencyStatus {
    pub id: ConstituencyId,
    pub division: DivisionId,
    pub open: bool,
    pub closed: bool,
    pub total_votes: u64,
    pub merkle_root: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BatchStatus {
    pub id: BatchId,
    pub constituencies: Vec<ConstituencyId>,
    pub signatures: usize,
    pub finalized: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DivisionStatus {
    pub id: DivisionId,
    pub results_submitted: usize,
    pub results_verified: usize,
    pub batches: Vec<BatchStatus>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NationalStatus {
    pub finalized: bool,
    pub finalized_at: Option<Timestamp>,
    pub divisions_counted: u32,
    pub expected_divisions: u32,
    pub candidate_ids: Vec<CandidateId>,
    pub totals: Vec<u64>,
    pub total_votes: u64,
    pub data_hash: String,
    /// Validators whose signature is over `data_hash`.
    pub signers: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NodeStatus {
    pub national: NationalStatus,
    pub divisions: Vec<DivisionStatus>,
    pub constituencies: Vec<ConstituencyStatus>,
}
