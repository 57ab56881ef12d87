//! LMDB implementation of CandidateStore.

use tally_store::{Candidate, CandidateStore, StoreError};
use tally_types::{CandidateId, ConstituencyId};

use crate::keys::{candidate_key, u32_key};
use crate::LmdbEnvironment;

impl CandidateStore for LmdbEnvironment {
    fn put_candidate(
        &self,
        constituency: ConstituencyId,
        candidate: &Candidate,
    ) -> Result<(), StoreError> {
        let key = candidate_key(constituency, candidate.id);
        Ok(self.put_value(self.candidates_db, &key, candidate)?)
    }

    fn get_candidate(
        &self,
        constituency: ConstituencyId,
        id: CandidateId,
    ) -> Result<Option<Candidate>, StoreError> {
        Ok(self.get_value(self.candidates_db, &candidate_key(constituency, id))?)
    }

    fn iter_candidates(&self, constituency: ConstituencyId) -> Result<Vec<Candidate>, StoreError> {
        Ok(self.scan_prefix(self.candidates_db, &u32_key(constituency))?)
    }
}
