use serde::{Deserialize, Serialize};
use tally_crypto::MerkleProof;
use tally_types::{BatchId, CandidateId, ConstituencyId, DivisionId, Hash256};

/// Summed vote vector of one batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchTally {
    pub batch: BatchId,
    pub candidate_ids: Vec<CandidateId>,
    pub votes: Vec<u64>,
    pub total_votes: u64,
}

/// One constituency's place in its division's Merkle tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstituencyInclusion {
    pub constituency: ConstituencyId,
    pub leaf: Hash256,
    pub proof: MerkleProof,
}

/// The division's result as forwarded to the national tier, built from finalized
/// batches only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivisionRollup {
    pub division: DivisionId,
    pub merkle_root: Hash256,
    pub total_votes: u64,
    pub candidate_ids: Vec<CandidateId>,
    pub votes: Vec<u64>,
    pub batches: Vec<BatchId>,
    /// Ordered by constituency id.
    pub constituencies: Vec<ConstituencyInclusion>,
}
