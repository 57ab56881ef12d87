//! LMDB implementation of ValidatorStore.
//!
//! The latest set per scope lives in `validator_sets` under the scope tag; every version
//! is also kept in `validator_history` under `scope_tag ++ version_be`.

use tally_store::{StoreError, ValidatorSet, ValidatorStore};
use tally_types::ValidatorScope;

use crate::keys::{scope_key, validator_history_key};
use crate::{LmdbEnvironment, LmdbError};

impl ValidatorStore for LmdbEnvironment {
    fn put_validator_set(&self, set: &ValidatorSet) -> Result<(), StoreError> {
        let bytes = bincode::serialize(set).map_err(LmdbError::from)?;
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;
        self.validator_history_db
            .put(
                &mut wtxn,
                &validator_history_key(set.scope, set.version),
                &bytes,
            )
            .map_err(LmdbError::from)?;
        self.validator_sets_db
            .put(&mut wtxn, &scope_key(set.scope), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_validator_set(&self, scope: ValidatorScope) -> Result<Option<ValidatorSet>, StoreError> {
        Ok(self.get_value(self.validator_sets_db, &scope_key(scope))?)
    }

    fn get_validator_set_version(
        &self,
        scope: ValidatorScope,
        version: u64,
    ) -> Result<Option<ValidatorSet>, StoreError> {
        Ok(self.get_value(
            self.validator_history_db,
            &validator_history_key(scope, version),
        )?)
    }
}
