//! Division tier of TierTally.
//!
//! Constituency results arrive in any order and move `Submitted -> Verified`, either by a
//! Merkle proof against the submitted root or by a separately authorized administrative
//! override. Verified results are grouped into rollup batches once the rollup window has
//! elapsed; a batch is only a commitment until enough division validators co-sign its
//! digest. Finalization is derived from the current validator set, never stored.

pub mod aggregator;
pub mod config;
pub mod digest;
pub mod error;
pub mod shape;
pub mod summary;

pub use aggregator::{RollupAggregator, RollupEvent};
pub use config::RollupConfig;
pub use digest::{batch_digest, constituency_leaf, BATCH_DOMAIN, CONSTITUENCY_LEAF_DOMAIN};
pub use error::RollupError;
pub use shape::{check_submission, ShapeError};
pub use summary::{BatchTally, ConstituencyInclusion, DivisionRollup};
