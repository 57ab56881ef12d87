use std::collections::BTreeSet;

use tally_types::{EligibilityOracle, VoterId};

/// Eligibility from the configured voter roll. Without a roll every voter is eligible.
#[derive(Clone, Debug, Default)]
pub struct VoterRoll {
    voters: Option<BTreeSet<VoterId>>,
}

impl VoterRoll {
    pub fn open() -> Self {
        Self { voters: None }
    }

    pub fn from_roll<I: IntoIterator<Item = VoterId>>(voters: I) -> Self {
        Self {
            voters: Some(voters.into_iter().collect()),
        }
    }

    pub fn from_config(roll: Option<&Vec<VoterId>>) -> Self {
        match roll {
            Some(voters) => Self::from_roll(voters.iter().cloned()),
            None => Self::open(),
        }
    }

    pub fn roll_size(&self) -> Option<usize> {
        self.voters.as_ref().map(BTreeSet::len)
    }
}

impl EligibilityOracle for VoterRoll {
    fn is_eligible(&self, voter: &VoterId) -> bool {
        self.voters.as_ref().map_or(true, |roll| roll.contains(voter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voter(s: &str) -> VoterId {
        VoterId::new(s).unwrap()
    }

    #[test]
    fn roll_restricts_eligibility() {
        let roll = VoterRoll::from_roll([voter("alice")]);
        assert!(roll.is_eligible(&voter("alice")));
        assert!(!roll.is_eligible(&voter("mallory")));
        assert_eq!(roll.roll_size(), Some(1));
    }

    #[test]
    fn no_roll_admits_everyone() {
        let roll = VoterRoll::from_config(None);
        assert!(roll.is_eligible(&voter("anyone")));
        assert_eq!(roll.roll_size(), None);
    }
}
