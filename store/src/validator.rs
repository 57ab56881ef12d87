//! Versioned validator sets.

use crate::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tally_types::{AccountId, Timestamp, ValidatorId, ValidatorScope};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorRecord {
    pub id: ValidatorId,
    pub active: bool,
    pub authorized_at: Timestamp,
    pub revoked_at: Option<Timestamp>,
}

/// One version of a scope's validator set.
///
/// Every mutation produces a new version; old versions stay readable for audit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSet {
    pub scope: ValidatorScope,
    pub version: u64,
    pub validators: BTreeMap<ValidatorId, ValidatorRecord>,
    pub required_signatures: u32,
    pub admins: BTreeSet<AccountId>,
    pub updated_at: Timestamp,
}

impl ValidatorSet {
    /// Version 0: no validators yet.
    pub fn genesis(
        scope: ValidatorScope,
        required_signatures: u32,
        admins: BTreeSet<AccountId>,
        now: Timestamp,
    ) -> Self {
        Self {
            scope,
            version: 0,
            validators: BTreeMap::new(),
            required_signatures,
            admins,
            updated_at: now,
        }
    }

    pub fn is_active(&self, id: &ValidatorId) -> bool {
        self.validators.get(id).is_some_and(|v| v.active)
    }

    pub fn active_count(&self) -> usize {
        self.validators.values().filter(|v| v.active).count()
    }

    pub fn active_validators(&self) -> Vec<ValidatorId> {
        self.validators
            .values()
            .filter(|v| v.active)
            .map(|v| v.id)
            .collect()
    }
}

pub trait ValidatorStore {
    /// Store `set` as both its own version and the latest for its scope.
    fn put_validator_set(&self, set: &ValidatorSet) -> Result<(), StoreError>;

    /// The latest version for `scope`.
    fn get_validator_set(&self, scope: ValidatorScope) -> Result<Option<ValidatorSet>, StoreError>;

    fn get_validator_set_version(
        &self,
        scope: ValidatorScope,
        version: u64,
    ) -> Result<Option<ValidatorSet>, StoreError>;
}
