//! Nullable eligibility oracle.

use std::collections::HashSet;
use std::sync::Mutex;
use tally_types::{EligibilityOracle, VoterId};

/// Either admits every voter or only an explicit allow-list.
#[derive(Debug, Default)]
pub struct NullEligibility {
    allow_list: Option<Mutex<HashSet<VoterId>>>,
}

impl NullEligibility {
    /// Every voter is eligible.
    pub fn allow_all() -> Self {
        Self { allow_list: None }
    }

    /// Only the listed voters are eligible.
    pub fn only<I: IntoIterator<Item = VoterId>>(voters: I) -> Self {
        Self {
            allow_list: Some(Mutex::new(voters.into_iter().collect())),
        }
    }

    /// Add a voter to the allow-list. No effect in allow-all mode.
    pub fn admit(&self, voter: VoterId) {
        if let Some(list) = &self.allow_list {
            list.lock().unwrap().insert(voter);
        }
    }
}

impl EligibilityOracle for NullEligibility {
    fn is_eligible(&self, voter: &VoterId) -> bool {
        match &self.allow_list {
            None => true,
            Some(list) => list.lock().unwrap().contains(voter),
        }
    }
}
