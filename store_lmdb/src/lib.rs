//! LMDB storage backend for TierTally.
//!
//! Implements every storage trait from `tally-store` on a single [`LmdbEnvironment`] using
//! the `heed` LMDB bindings. Each record family maps to its own named database. Values are
//! `bincode`-encoded; integer key components are big-endian so range scans come back in
//! id order.

pub mod environment;
pub mod error;
pub mod integrity;
pub mod migration;
pub mod write_batch;

mod batch;
mod candidate;
mod constituency;
mod division;
mod keys;
mod ledger_state;
mod meta;
mod national;
mod validator;
mod vote;

pub use environment::{LmdbEnvironment, DEFAULT_MAP_SIZE};
pub use error::LmdbError;
pub use integrity::{check_integrity, IntegrityReport};
pub use migration::{Migrator, CURRENT_SCHEMA_VERSION};
pub use write_batch::WriteBatch;
