//! Error classification shared by every tier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Broad class of a rejected operation.
///
/// No class is fatal: every rejection leaves previously committed state intact and
/// only refuses the requested transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Malformed input (vector/total mismatch, unknown candidate). Resubmit corrected input.
    InputShape,
    /// The caller lacks the rights for this operation. Never retried automatically.
    Authorization,
    /// Expected ordering/state conflicts (already voted, window not open, quorum missing).
    /// Recoverable by retrying later or with different arguments.
    State,
    /// Evidence of tampering or misuse (bad Merkle proof, bad signature).
    Integrity,
    /// The storage backend failed.
    Storage,
}

impl ErrorClass {
    pub fn name(&self) -> &'static str {
        match self {
            Self::InputShape => "input_shape",
            Self::Authorization => "authorization",
            Self::State => "state",
            Self::Integrity => "integrity",
            Self::Storage => "storage",
        }
    }

    /// Whether retrying the same call later can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::State | Self::Storage)
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
