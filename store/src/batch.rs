//! Rollup batch storage.

use crate::constituency::ConstituencyResult;
use crate::StoreError;
use serde::{Deserialize, Serialize};
use tally_types::{BatchId, ConstituencyId, DivisionId, Signature, Timestamp, ValidatorId};

/// A division validator's signature over a batch digest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSignature {
    pub validator: ValidatorId,
    pub signature: Signature,
    /// Validator set version in force when the signature was accepted.
    pub set_version: u64,
    pub signed_at: Timestamp,
}

/// A group of verified constituency results presented for validator sign-off.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupBatch {
    pub id: BatchId,
    pub division: DivisionId,
    /// Sorted and free of duplicates.
    pub constituency_ids: Vec<ConstituencyId>,
    pub created_at: Timestamp,
    /// At most one entry per validator.
    pub signatures: Vec<BatchSignature>,
}

impl RollupBatch {
    pub fn has_signed(&self, validator: &ValidatorId) -> bool {
        self.signatures.iter().any(|s| s.validator == *validator)
    }

    pub fn signers(&self) -> Vec<ValidatorId> {
        self.signatures.iter().map(|s| s.validator).collect()
    }
}

pub trait BatchStore {
    fn put_batch(&self, batch: &RollupBatch) -> Result<(), StoreError>;

    fn get_batch(&self, id: BatchId) -> Result<Option<RollupBatch>, StoreError>;

    /// All batches of `division`, ordered by id.
    fn iter_batches(&self, division: DivisionId) -> Result<Vec<RollupBatch>, StoreError>;

    /// Highest batch id ever stored, across divisions.
    fn last_batch_id(&self) -> Result<Option<BatchId>, StoreError>;

    /// Store a new batch together with the results it marks as included, atomically.
    ///
    /// Fails with [`StoreError::Duplicate`] if the batch id is taken.
    fn create_batch(
        &self,
        batch: &RollupBatch,
        included: &[ConstituencyResult],
    ) -> Result<(), StoreError>;
}
