//! Election parameters shared by every tier.

use crate::time::Timestamp;
use serde::{Deserialize, Serialize};

/// The interval during which a constituency ledger accepts votes: `[opens_at, closes_at)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingWindow {
    pub opens_at: Timestamp,
    pub closes_at: Timestamp,
}

impl VotingWindow {
    pub fn new(opens_at: Timestamp, closes_at: Timestamp) -> Self {
        Self { opens_at, closes_at }
    }

    pub fn is_well_formed(&self) -> bool {
        self.closes_at > self.opens_at
    }

    pub fn is_open(&self, now: Timestamp) -> bool {
        now >= self.opens_at && now < self.closes_at
    }

    pub fn has_closed(&self, now: Timestamp) -> bool {
        now >= self.closes_at
    }
}

/// Tunable parameters of the aggregation protocol.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyParams {
    /// Seconds that must elapse after the latest included verification before a
    /// rollup batch may be created.
    #[serde(default = "default_rollup_window_secs")]
    pub rollup_window_secs: u64,

    /// Number of divisions that must be verified before national finalization.
    #[serde(default = "default_expected_divisions")]
    pub expected_divisions: u32,

    /// Initial division-validator signature threshold.
    #[serde(default = "default_threshold")]
    pub division_threshold: u32,

    /// Initial national-validator signature threshold.
    #[serde(default = "default_threshold")]
    pub national_threshold: u32,

    /// Whether the administrative proof-bypass at the division tier is available at all.
    #[serde(default)]
    pub allow_force_verify: bool,
}

fn default_rollup_window_secs() -> u64 {
    3600
}

fn default_expected_divisions() -> u32 {
    1
}

fn default_threshold() -> u32 {
    2
}

impl Default for TallyParams {
    fn default() -> Self {
        Self {
            rollup_window_secs: default_rollup_window_secs(),
            expected_divisions: default_expected_divisions(),
            division_threshold: default_threshold(),
            national_threshold: default_threshold(),
            allow_force_verify: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_half_open() {
        let w = VotingWindow::new(Timestamp::new(10), Timestamp::new(20));
        assert!(!w.is_open(Timestamp::new(9)));
        assert!(w.is_open(Timestamp::new(10)));
        assert!(w.is_open(Timestamp::new(19)));
        assert!(!w.is_open(Timestamp::new(20)));
        assert!(w.has_closed(Timestamp::new(20)));
    }

    #[test]
    fn force_verify_off_by_default() {
        assert!(!TallyParams::default().allow_force_verify);
    }
}
