//! LMDB implementation of NationalStore.

use tally_store::{AuditRecord, DivisionResult, NationalResult, NationalStore, StoreError};

use crate::keys::NATIONAL_KEY;
use crate::LmdbEnvironment;

impl NationalStore for LmdbEnvironment {
    fn put_national_result(&self, result: &NationalResult) -> Result<(), StoreError> {
        Ok(self.put_value(self.national_db, NATIONAL_KEY, result)?)
    }

    fn get_national_result(&self) -> Result<Option<NationalResult>, StoreError> {
        Ok(self.get_value(self.national_db, NATIONAL_KEY)?)
    }

    fn commit_division_verified(
        &self,
        division: &DivisionResult,
        national: &NationalResult,
    ) -> Result<(), StoreError> {
        let mut wb = self.write_batch()?;
        wb.put_division_result(division)?;
        wb.put_national_result(national)?;
        wb.commit()?;
        Ok(())
    }

    fn commit_finalization(
        &self,
        national: &NationalResult,
        record: &AuditRecord,
    ) -> Result<(), StoreError> {
        let mut wb = self.write_batch()?;
        wb.append_audit(record)?;
        wb.put_national_result(national)?;
        wb.commit()?;
        Ok(())
    }

    fn iter_audit(&self) -> Result<Vec<AuditRecord>, StoreError> {
        Ok(self.scan_all(self.audit_db)?)
    }
}
