//! LMDB implementation of VoteStore.
//!
//! Votes are keyed `constituency_be ++ voter`, so the key itself enforces one vote per
//! voter per constituency.

use tally_store::{Candidate, StoreError, VoteRecord, VoteStore};
use tally_types::{ConstituencyId, VoterId};

use crate::keys::{u32_key, vote_key};
use crate::{LmdbEnvironment, LmdbError};

impl VoteStore for LmdbEnvironment {
    fn get_vote(
        &self,
        constituency: ConstituencyId,
        voter: &VoterId,
    ) -> Result<Option<VoteRecord>, StoreError> {
        Ok(self.get_value(self.votes_db, &vote_key(constituency, voter))?)
    }

    fn iter_votes(&self, constituency: ConstituencyId) -> Result<Vec<VoteRecord>, StoreError> {
        let mut votes: Vec<VoteRecord> = self.scan_prefix(self.votes_db, &u32_key(constituency))?;
        votes.sort_by_key(|v| v.sequence);
        Ok(votes)
    }

    fn vote_count(&self, constituency: ConstituencyId) -> Result<u64, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let prefix = u32_key(constituency);
        let count = self
            .votes_db
            .prefix_iter(&rtxn, &prefix)
            .map_err(LmdbError::from)?
            .count();
        Ok(count as u64)
    }

    fn record_vote(&self, vote: &VoteRecord, candidate: &Candidate) -> Result<(), StoreError> {
        let mut batch = self.write_batch()?;
        if batch.vote_exists(vote.constituency, &vote.voter)? {
            return Err(StoreError::Duplicate(format!(
                "vote of {} in constituency {}",
                vote.voter, vote.constituency
            )));
        }
        batch.put_vote(vote)?;
        batch.put_candidate(vote.constituency, candidate)?;
        batch.commit()?;
        Ok(())
    }
}
