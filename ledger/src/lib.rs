//! Constituency tier of TierTally.
//!
//! A [`VoteLedger`] records at most one vote per eligible voter, keeps a running counter
//! per candidate, and stores a deterministic leaf hash per vote. The leaves, in cast order,
//! form the Merkle tree whose root the constituency submits to its division.

pub mod config;
pub mod error;
pub mod report;
pub mod vote_ledger;

pub use config::LedgerConfig;
pub use error::LedgerError;
pub use report::{ConstituencyReport, LeafProof};
pub use tally_crypto::generate_leaf;
pub use tally_types::EligibilityOracle;
pub use vote_ledger::{verify_leaf, LedgerEvent, VoteLedger};
