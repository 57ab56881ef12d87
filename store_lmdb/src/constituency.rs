//! LMDB implementation of ConstituencyStore.

use tally_store::{ConstituencyResult, ConstituencyStore, StoreError};
use tally_types::{ConstituencyId, DivisionId};

use crate::keys::u32_key;
use crate::LmdbEnvironment;

impl ConstituencyStore for LmdbEnvironment {
    fn put_constituency_result(&self, result: &ConstituencyResult) -> Result<(), StoreError> {
        Ok(self.put_value(self.constituency_db, &u32_key(result.id), result)?)
    }

    fn get_constituency_result(
        &self,
        id: ConstituencyId,
    ) -> Result<Option<ConstituencyResult>, StoreError> {
        Ok(self.get_value(self.constituency_db, &u32_key(id))?)
    }

    fn iter_constituency_results(
        &self,
        division: DivisionId,
    ) -> Result<Vec<ConstituencyResult>, StoreError> {
        let all: Vec<ConstituencyResult> = self.scan_all(self.constituency_db)?;
        Ok(all.into_iter().filter(|r| r.division == division).collect())
    }
}
