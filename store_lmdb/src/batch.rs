//! LMDB implementation of BatchStore.

use tally_store::{BatchStore, ConstituencyResult, RollupBatch, StoreError};
use tally_types::{BatchId, DivisionId};

use crate::keys::u64_key;
use crate::{LmdbEnvironment, LmdbError};

impl BatchStore for LmdbEnvironment {
    fn put_batch(&self, batch: &RollupBatch) -> Result<(), StoreError> {
        Ok(self.put_value(self.batches_db, &u64_key(batch.id), batch)?)
    }

    fn get_batch(&self, id: BatchId) -> Result<Option<RollupBatch>, StoreError> {
        Ok(self.get_value(self.batches_db, &u64_key(id))?)
    }

    fn iter_batches(&self, division: DivisionId) -> Result<Vec<RollupBatch>, StoreError> {
        let all: Vec<RollupBatch> = self.scan_all(self.batches_db)?;
        Ok(all.into_iter().filter(|b| b.division == division).collect())
    }

    fn last_batch_id(&self) -> Result<Option<BatchId>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let last = self.batches_db.last(&rtxn).map_err(LmdbError::from)?;
        match last {
            Some((key, _)) => <[u8; 8]>::try_from(key)
                .map(|k| Some(u64::from_be_bytes(k)))
                .map_err(|_| StoreError::Corruption("batch key is not 8 bytes".into())),
            None => Ok(None),
        }
    }

    fn create_batch(
        &self,
        batch: &RollupBatch,
        included: &[ConstituencyResult],
    ) -> Result<(), StoreError> {
        let mut wb = self.write_batch()?;
        if wb.batch_exists(batch.id)? {
            return Err(StoreError::Duplicate(format!("batch {}", batch.id)));
        }
        wb.put_batch(batch)?;
        for result in included {
            wb.put_constituency_result(result)?;
        }
        wb.commit()?;
        Ok(())
    }
}
