use serde::{Deserialize, Serialize};
use tally_types::CandidateId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NationalConfig {
    /// Verified divisions required before finalization.
    pub expected_divisions: u32,
    /// Every division vote vector must be over exactly these candidates, in this order.
    pub candidate_ids: Vec<CandidateId>,
}
