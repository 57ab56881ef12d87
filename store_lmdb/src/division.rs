use tally_store::{DivisionResult, DivisionStore, StoreError};
use tally_types::DivisionId;

use crate::keys::u32_key;
use crate::LmdbEnvironment;

impl DivisionStore for LmdbEnvironment {
    fn put_division_result(&self, result: &DivisionResult) -> Result<(), StoreError> {
        Ok(self.put_value(self.divisions_db, &u32_key(result.id), result)?)
    }

    fn get_division_result(&self, id: DivisionId) -> Result<Option<DivisionResult>, StoreError> {
        Ok(self.get_value(self.divisions_db, &u32_key(id))?)
    }

    fn iter_division_results(&self) -> Result<Vec<DivisionResult>, StoreError> {
        Ok(self.scan_all(self.divisions_db)?)
    }
}
