//! National tier of TierTally.
//!
//! Division results are submitted and verified the same way the division tier handles
//! constituencies. Each verification adds the division's vote vector to the running
//! national totals exactly once. National validators sign the digest of the current
//! totals; once every expected division is verified and a quorum has signed the current
//! digest, the result is finalized for good and an audit record is written with it.

pub mod config;
pub mod error;
pub mod finalizer;

pub use config::NationalConfig;
pub use error::NationalError;
pub use finalizer::{national_digest, NationalEvent, NationalFinalizer, NATIONAL_DOMAIN};
