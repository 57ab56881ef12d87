//! Per-constituency ledger settings.

use crate::StoreError;
use serde::{Deserialize, Serialize};
use tally_types::{ConstituencyId, Timestamp, VotingWindow};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    pub constituency: ConstituencyId,
    pub window: Option<VotingWindow>,
    /// Set when an administrator closed voting before `window.closes_at`.
    pub closed_early_at: Option<Timestamp>,
}

impl LedgerState {
    pub fn new(constituency: ConstituencyId) -> Self {
        Self {
            constituency,
            window: None,
            closed_early_at: None,
        }
    }
}

pub trait LedgerStateStore {
    fn put_ledger_state(&self, state: &LedgerState) -> Result<(), StoreError>;

    fn get_ledger_state(
        &self,
        constituency: ConstituencyId,
    ) -> Result<Option<LedgerState>, StoreError>;
}
