//! Tiers of the aggregation hierarchy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A level in the aggregation hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Constituency,
    Division,
    National,
}

impl Tier {
    /// The validator scope that signs off on this tier's output, if any.
    ///
    /// Constituency ledgers are not validator-signed; their results are checked by
    /// Merkle proof at the division tier.
    pub fn validator_scope(&self) -> Option<ValidatorScope> {
        match self {
            Self::Constituency => None,
            Self::Division => Some(ValidatorScope::Division),
            Self::National => Some(ValidatorScope::National),
        }
    }
}

/// The tiers that carry their own validator set and signature threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidatorScope {
    Division,
    National,
}

impl ValidatorScope {
    pub const ALL: [ValidatorScope; 2] = [ValidatorScope::Division, ValidatorScope::National];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Division => "division",
            Self::National => "national",
        }
    }

    /// Single-byte tag used in storage keys and signed digests.
    pub fn tag(&self) -> u8 {
        match self {
            Self::Division => 1,
            Self::National => 2,
        }
    }
}

impl fmt::Display for ValidatorScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
