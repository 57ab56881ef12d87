//! TierTally node.
//!
//! The node owns one ledger per configured constituency, one rollup aggregator per
//! division, the national finalizer and the validator authority. All of them sit behind a
//! single lock, so every operation is applied in one global order. Component events are
//! fanned out to subscribers as [`AuditEvent`]s after each committed operation.

pub mod config;
pub mod eligibility;
pub mod error;
pub mod events;
pub mod logging;
pub mod node;
pub mod status;

pub use config::{CandidateConfig, ConstituencyConfig, DivisionConfig, NodeConfig};
pub use eligibility::VoterRoll;
pub use error::NodeError;
pub use events::{AuditEvent, EventBus, Listener};
pub use logging::{init_logging, LogFormat};
pub use node::TallyNode;
pub use status::{BatchStatus, ConstituencyStatus, DivisionStatus, NationalStatus, NodeStatus};
