//! Write batching: groups several record writes into a single LMDB write transaction.
//!
//! Every multi-record state transition goes through a batch so it lands atomically.
//!
//! ```ignore
//! let mut batch = env.write_batch()?;
//! batch.put_vote(&vote)?;
//! batch.put_candidate(vote.constituency, &candidate)?;
//! batch.commit()?;
//! ```
//!
//! Dropping a batch without calling [`WriteBatch::commit`] aborts the transaction.

use heed::types::Bytes;
use heed::{Database, RwTxn};
use serde::Serialize;

use tally_store::{
    AuditRecord, Candidate, ConstituencyResult, DivisionResult, NationalResult, RollupBatch,
    VoteRecord,
};
use tally_types::{BatchId, ConstituencyId, VoterId};

use crate::environment::LmdbEnvironment;
use crate::keys::{candidate_key, u32_key, u64_key, vote_key, NATIONAL_KEY};
use crate::LmdbError;

pub struct WriteBatch<'a> {
    txn: RwTxn<'a>,
    env: &'a LmdbEnvironment,
}

impl<'a> WriteBatch<'a> {
    pub(crate) fn new(env: &'a LmdbEnvironment) -> Result<Self, LmdbError> {
        let txn = env.env().write_txn()?;
        Ok(Self { txn, env })
    }

    fn put<T: Serialize>(
        &mut self,
        db: Database<Bytes, Bytes>,
        key: &[u8],
        value: &T,
    ) -> Result<(), LmdbError> {
        let bytes = bincode::serialize(value)?;
        db.put(&mut self.txn, key, &bytes)?;
        Ok(())
    }

    pub fn put_candidate(
        &mut self,
        constituency: ConstituencyId,
        candidate: &Candidate,
    ) -> Result<(), LmdbError> {
        let db = self.env.candidates_db;
        self.put(db, &candidate_key(constituency, candidate.id), candidate)
    }

    pub fn vote_exists(
        &self,
        constituency: ConstituencyId,
        voter: &VoterId,
    ) -> Result<bool, LmdbError> {
        let key = vote_key(constituency, voter);
        Ok(self.env.votes_db.get(&self.txn, &key)?.is_some())
    }

    pub fn put_vote(&mut self, vote: &VoteRecord) -> Result<(), LmdbError> {
        let db = self.env.votes_db;
        self.put(db, &vote_key(vote.constituency, &vote.voter), vote)
    }

    pub fn put_constituency_result(&mut self, result: &ConstituencyResult) -> Result<(), LmdbError> {
        let db = self.env.constituency_db;
        self.put(db, &u32_key(result.id), result)
    }

    pub fn batch_exists(&self, id: BatchId) -> Result<bool, LmdbError> {
        Ok(self.env.batches_db.get(&self.txn, &u64_key(id))?.is_some())
    }

    pub fn put_batch(&mut self, batch: &RollupBatch) -> Result<(), LmdbError> {
        let db = self.env.batches_db;
        self.put(db, &u64_key(batch.id), batch)
    }

    pub fn put_division_result(&mut self, result: &DivisionResult) -> Result<(), LmdbError> {
        let db = self.env.divisions_db;
        self.put(db, &u32_key(result.id), result)
    }

    pub fn put_national_result(&mut self, result: &NationalResult) -> Result<(), LmdbError> {
        let db = self.env.national_db;
        self.put(db, NATIONAL_KEY, result)
    }

    /// Append an audit record. Sequence numbers are never overwritten.
    pub fn append_audit(&mut self, record: &AuditRecord) -> Result<(), LmdbError> {
        let key = u64_key(record.sequence);
        if self.env.audit_db.get(&self.txn, &key)?.is_some() {
            return Err(LmdbError::Duplicate(format!(
                "audit sequence {}",
                record.sequence
            )));
        }
        let db = self.env.audit_db;
        self.put(db, &key, record)
    }

    pub fn commit(self) -> Result<(), LmdbError> {
        self.txn.commit()?;
        Ok(())
    }
}
