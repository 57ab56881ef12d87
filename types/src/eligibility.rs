//! Voter eligibility, decided outside the tally.

use crate::identity::VoterId;

/// Answers whether a voter may cast a vote. Token holdings, rolls and the like are the
/// implementor's concern.
pub trait EligibilityOracle: Send + Sync {
    fn is_eligible(&self, voter: &VoterId) -> bool;
}
