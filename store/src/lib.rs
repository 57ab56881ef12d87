//! Persisted records and abstract storage traits for TierTally.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these traits. The tier
//! crates depend only on the traits. Operations that touch more than one record take all
//! of them in a single call so a backend can commit them atomically.

pub mod batch;
pub mod candidate;
pub mod constituency;
pub mod division;
pub mod error;
pub mod ledger_state;
pub mod meta;
pub mod national;
pub mod validator;
pub mod vote;

pub use batch::{BatchSignature, BatchStore, RollupBatch};
pub use candidate::{Candidate, CandidateStore};
pub use constituency::{ConstituencyResult, ConstituencyStore, ResultState, VerificationMethod};
pub use division::{DivisionResult, DivisionStore};
pub use error::StoreError;
pub use ledger_state::{LedgerState, LedgerStateStore};
pub use meta::MetaStore;
pub use national::{AuditRecord, NationalResult, NationalSignature, NationalStore};
pub use validator::{ValidatorRecord, ValidatorSet, ValidatorStore};
pub use vote::{VoteRecord, VoteStore};

/// Everything a constituency ledger persists.
pub trait LedgerStore: CandidateStore + VoteStore + LedgerStateStore {}
impl<T: CandidateStore + VoteStore + LedgerStateStore + ?Sized> LedgerStore for T {}

/// Everything a division rollup aggregator persists.
pub trait RollupStore: ConstituencyStore + BatchStore {}
impl<T: ConstituencyStore + BatchStore + ?Sized> RollupStore for T {}

/// Everything the national finalizer persists.
pub trait FinalizerStore: DivisionStore + NationalStore {}
impl<T: DivisionStore + NationalStore + ?Sized> FinalizerStore for T {}

/// A backend that can hold the whole tally.
pub trait TallyStore:
    LedgerStore + RollupStore + FinalizerStore + ValidatorStore + MetaStore + Send + Sync
{
}
impl<T> TallyStore for T where
    T: LedgerStore + RollupStore + FinalizerStore + ValidatorStore + MetaStore + Send + Sync + ?Sized
{
}
