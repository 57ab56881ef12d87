//! Fundamental types for TierTally.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! voter / validator / administrator identities, entity ids, hashes, timestamps and the
//! injectable clock, election parameters, and the error classification used by every tier.

pub mod eligibility;
pub mod error;
pub mod hash;
pub mod identity;
pub mod keys;
pub mod params;
pub mod tier;
pub mod time;

pub use eligibility::EligibilityOracle;
pub use error::ErrorClass;
pub use hash::Hash256;
pub use identity::{AccountId, ValidatorId, VoterId};
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use params::{TallyParams, VotingWindow};
pub use tier::{Tier, ValidatorScope};
pub use time::{Clock, SystemClock, Timestamp};

/// Sequential candidate id, assigned by a constituency ledger starting at 1.
pub type CandidateId = u32;

/// Unique constituency id.
pub type ConstituencyId = u32;

/// Unique division id.
pub type DivisionId = u32;

/// Monotonic rollup batch id, starting at 1.
pub type BatchId = u64;
