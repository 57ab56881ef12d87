//! Validator authority for TierTally.
//!
//! Keeps, per [`ValidatorScope`](tally_types::ValidatorScope), the set of administrator-
//! authorized validators and the number of signatures a quorum needs. Every change
//! produces a new persisted version of the set. Quorum is always evaluated against the
//! current version, so a validator revoked after signing stops counting at once.

pub mod authority;
pub mod error;

pub use authority::{AuthorityConfig, AuthorityEvent, ValidatorAuthority};
pub use error::AuthorityError;
