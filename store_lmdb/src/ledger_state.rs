use tally_store::{LedgerState, LedgerStateStore, StoreError};
use tally_types::ConstituencyId;

use crate::keys::u32_key;
use crate::LmdbEnvironment;

impl LedgerStateStore for LmdbEnvironment {
    fn put_ledger_state(&self, state: &LedgerState) -> Result<(), StoreError> {
        Ok(self.put_value(self.ledger_state_db, &u32_key(state.constituency), state)?)
    }

    fn get_ledger_state(
        &self,
        constituency: ConstituencyId,
    ) -> Result<Option<LedgerState>, StoreError> {
        Ok(self.get_value(self.ledger_state_db, &u32_key(constituency))?)
    }
}
