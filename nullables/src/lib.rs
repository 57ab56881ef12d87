//! Nullable infrastructure for deterministic testing.
//!
//! Time, storage and voter eligibility are reached through traits. This crate provides
//! implementations of them that return deterministic values, can be steered from a test,
//! and never touch the filesystem.

pub mod clock;
pub mod eligibility;
pub mod store;

pub use clock::NullClock;
pub use eligibility::NullEligibility;
pub use store::NullStore;
