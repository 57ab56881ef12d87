//! The national result and its audit trail.

use crate::division::DivisionResult;
use crate::StoreError;
use serde::{Deserialize, Serialize};
use tally_types::{CandidateId, Hash256, Signature, Timestamp, ValidatorId};

/// A national validator's signature over one version of the result digest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NationalSignature {
    pub validator: ValidatorId,
    /// The digest that was signed. Only signatures over the current digest count.
    pub data_hash: Hash256,
    pub signature: Signature,
    pub set_version: u64,
    pub signed_at: Timestamp,
}

/// Running national totals. Immutable once `finalized` is set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NationalResult {
    pub candidate_ids: Vec<CandidateId>,
    pub totals: Vec<u64>,
    pub total_votes: u64,
    pub divisions_counted: u32,
    pub finalized: bool,
    pub finalized_at: Option<Timestamp>,
    pub signatures: Vec<NationalSignature>,
}

impl NationalResult {
    pub fn new(candidate_ids: Vec<CandidateId>) -> Self {
        let totals = vec![0; candidate_ids.len()];
        Self {
            candidate_ids,
            totals,
            total_votes: 0,
            divisions_counted: 0,
            finalized: false,
            finalized_at: None,
            signatures: Vec::new(),
        }
    }
}

/// An append-only entry describing a finalizing action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub sequence: u64,
    pub action: String,
    pub data_hash: Hash256,
    pub validators: Vec<ValidatorId>,
    pub recorded_at: Timestamp,
}

pub trait NationalStore {
    fn put_national_result(&self, result: &NationalResult) -> Result<(), StoreError>;

    fn get_national_result(&self) -> Result<Option<NationalResult>, StoreError>;

    /// Store a newly verified division and the totals that now include it, atomically.
    fn commit_division_verified(
        &self,
        division: &DivisionResult,
        national: &NationalResult,
    ) -> Result<(), StoreError>;

    /// Store the finalized result and append its audit record, atomically.
    ///
    /// Fails with [`StoreError::Duplicate`] if `record.sequence` is taken.
    fn commit_finalization(
        &self,
        national: &NationalResult,
        record: &AuditRecord,
    ) -> Result<(), StoreError>;

    /// The audit trail in sequence order.
    fn iter_audit(&self) -> Result<Vec<AuditRecord>, StoreError>;
}
