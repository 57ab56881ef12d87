use serde::{Deserialize, Serialize};
use tally_crypto::MerkleProof;
use tally_types::{CandidateId, ConstituencyId, DivisionId, Hash256};

/// What a constituency submits to its division once voting has closed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstituencyReport {
    pub constituency: ConstituencyId,
    pub division: DivisionId,
    pub merkle_root: Hash256,
    pub total_votes: u64,
    pub candidate_ids: Vec<CandidateId>,
    pub votes: Vec<u64>,
}

/// A vote leaf and its inclusion proof under the ledger's Merkle root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafProof {
    pub leaf: Hash256,
    pub proof: MerkleProof,
}
