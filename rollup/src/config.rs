use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tally_types::{AccountId, CandidateId, DivisionId};

/// Configuration of one division's rollup aggregator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupConfig {
    pub division: DivisionId,
    /// Every submitted vote vector must be over exactly these candidates, in this order.
    pub candidate_ids: Vec<CandidateId>,
    /// Seconds after the latest included verification before a batch may be created.
    pub rollup_window_secs: u64,
    /// Proof-free verification is unavailable unless this is set.
    pub allow_force_verify: bool,
    pub force_verify_admins: BTreeSet<AccountId>,
}
