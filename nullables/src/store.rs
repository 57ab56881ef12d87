//! Nullable store: thread-safe in-memory storage for testing.
//!
//! All record families live behind one lock, so the multi-record calls are atomic the same
//! way an LMDB write transaction is. [`NullStore::fail_writes`] makes every write fail,
//! which lets tests check that a component leaves its in-memory state untouched when
//! persistence fails.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use tally_store::{
    AuditRecord, BatchStore, Candidate, CandidateStore, ConstituencyResult, ConstituencyStore,
    DivisionResult, DivisionStore, LedgerState, LedgerStateStore, MetaStore, NationalResult,
    NationalStore, RollupBatch, StoreError, ValidatorSet, ValidatorStore, VoteRecord, VoteStore,
};
use tally_types::{BatchId, CandidateId, ConstituencyId, DivisionId, ValidatorScope, VoterId};

#[derive(Default)]
struct State {
    candidates: BTreeMap<(ConstituencyId, CandidateId), Candidate>,
    votes: BTreeMap<(ConstituencyId, VoterId), VoteRecord>,
    ledger_states: BTreeMap<ConstituencyId, LedgerState>,
    constituencies: BTreeMap<ConstituencyId, ConstituencyResult>,
    batches: BTreeMap<BatchId, RollupBatch>,
    divisions: BTreeMap<DivisionId, DivisionResult>,
    national: Option<NationalResult>,
    audit: BTreeMap<u64, AuditRecord>,
    validator_sets: BTreeMap<(ValidatorScope, u64), ValidatorSet>,
    latest_sets: BTreeMap<ValidatorScope, u64>,
    meta: BTreeMap<String, Vec<u8>>,
}

/// An in-memory implementation of every storage trait.
#[derive(Default)]
pub struct NullStore {
    state: Mutex<State>,
    fail_writes: AtomicBool,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with [`StoreError::Backend`] (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn read(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn write(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("writes disabled".into()));
        }
        Ok(self.state.lock().unwrap())
    }
}

impl CandidateStore for NullStore {
    fn put_candidate(
        &self,
        constituency: ConstituencyId,
        candidate: &Candidate,
    ) -> Result<(), StoreError> {
        self.write()?
            .candidates
            .insert((constituency, candidate.id), candidate.clone());
        Ok(())
    }

    fn get_candidate(
        &self,
        constituency: ConstituencyId,
        id: CandidateId,
    ) -> Result<Option<Candidate>, StoreError> {
        Ok(self.read().candidates.get(&(constituency, id)).cloned())
    }

    fn iter_candidates(&self, constituency: ConstituencyId) -> Result<Vec<Candidate>, StoreError> {
        Ok(self
            .read()
            .candidates
            .range((constituency, CandidateId::MIN)..=(constituency, CandidateId::MAX))
            .map(|(_, c)| c.clone())
            .collect())
    }
}

impl VoteStore for NullStore {
    fn get_vote(
        &self,
        constituency: ConstituencyId,
        voter: &VoterId,
    ) -> Result<Option<VoteRecord>, StoreError> {
        Ok(self
            .read()
            .votes
            .get(&(constituency, voter.clone()))
            .cloned())
    }

    fn iter_votes(&self, constituency: ConstituencyId) -> Result<Vec<VoteRecord>, StoreError> {
        let mut votes: Vec<_> = self
            .read()
            .votes
            .values()
            .filter(|v| v.constituency == constituency)
            .cloned()
            .collect();
        votes.sort_by_key(|v| v.sequence);
        Ok(votes)
    }

    fn vote_count(&self, constituency: ConstituencyId) -> Result<u64, StoreError> {
        Ok(self
            .read()
            .votes
            .keys()
            .filter(|(c, _)| *c == constituency)
            .count() as u64)
    }

    fn record_vote(&self, vote: &VoteRecord, candidate: &Candidate) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let key = (vote.constituency, vote.voter.clone());
        if state.votes.contains_key(&key) {
            return Err(StoreError::Duplicate(format!("vote of {}", vote.voter)));
        }
        state.votes.insert(key, vote.clone());
        state
            .candidates
            .insert((vote.constituency, candidate.id), candidate.clone());
        Ok(())
    }
}

impl LedgerStateStore for NullStore {
    fn put_ledger_state(&self, ledger: &LedgerState) -> Result<(), StoreError> {
        self.write()?
            .ledger_states
            .insert(ledger.constituency, ledger.clone());
        Ok(())
    }

    fn get_ledger_state(
        &self,
        constituency: ConstituencyId,
    ) -> Result<Option<LedgerState>, StoreError> {
        Ok(self.read().ledger_states.get(&constituency).cloned())
    }
}

impl ConstituencyStore for NullStore {
    fn put_constituency_result(&self, result: &ConstituencyResult) -> Result<(), StoreError> {
        self.write()?
            .constituencies
            .insert(result.id, result.clone());
        Ok(())
    }

    fn get_constituency_result(
        &self,
        id: ConstituencyId,
    ) -> Result<Option<ConstituencyResult>, StoreError> {
        Ok(self.read().constituencies.get(&id).cloned())
    }

    fn iter_constituency_results(
        &self,
        division: DivisionId,
    ) -> Result<Vec<ConstituencyResult>, StoreError> {
        Ok(self
            .read()
            .constituencies
            .values()
            .filter(|r| r.division == division)
            .cloned()
            .collect())
    }
}

impl BatchStore for NullStore {
    fn put_batch(&self, batch: &RollupBatch) -> Result<(), StoreError> {
        self.write()?.batches.insert(batch.id, batch.clone());
        Ok(())
    }

    fn get_batch(&self, id: BatchId) -> Result<Option<RollupBatch>, StoreError> {
        Ok(self.read().batches.get(&id).cloned())
    }

    fn iter_batches(&self, division: DivisionId) -> Result<Vec<RollupBatch>, StoreError> {
        Ok(self
            .read()
            .batches
            .values()
            .filter(|b| b.division == division)
            .cloned()
            .collect())
    }

    fn last_batch_id(&self) -> Result<Option<BatchId>, StoreError> {
        Ok(self.read().batches.keys().next_back().copied())
    }

    fn create_batch(
        &self,
        batch: &RollupBatch,
        included: &[ConstituencyResult],
    ) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if state.batches.contains_key(&batch.id) {
            return Err(StoreError::Duplicate(format!("batch {}", batch.id)));
        }
        state.batches.insert(batch.id, batch.clone());
        for result in included {
            state.constituencies.insert(result.id, result.clone());
        }
        Ok(())
    }
}

impl DivisionStore for NullStore {
    fn put_division_result(&self, result: &DivisionResult) -> Result<(), StoreError> {
        self.write()?.divisions.insert(result.id, result.clone());
        Ok(())
    }

    fn get_division_result(&self, id: DivisionId) -> Result<Option<DivisionResult>, StoreError> {
        Ok(self.read().divisions.get(&id).cloned())
    }

    fn iter_division_results(&self) -> Result<Vec<DivisionResult>, StoreError> {
        Ok(self.read().divisions.values().cloned().collect())
    }
}

impl NationalStore for NullStore {
    fn put_national_result(&self, result: &NationalResult) -> Result<(), StoreError> {
        self.write()?.national = Some(result.clone());
        Ok(())
    }

    fn get_national_result(&self) -> Result<Option<NationalResult>, StoreError> {
        Ok(self.read().national.clone())
    }

    fn commit_division_verified(
        &self,
        division: &DivisionResult,
        national: &NationalResult,
    ) -> Result<(), StoreError> {
        let mut state = self.write()?;
        state.divisions.insert(division.id, division.clone());
        state.national = Some(national.clone());
        Ok(())
    }

    fn commit_finalization(
        &self,
        national: &NationalResult,
        record: &AuditRecord,
    ) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if state.audit.contains_key(&record.sequence) {
            return Err(StoreError::Duplicate(format!(
                "audit sequence {}",
                record.sequence
            )));
        }
        state.audit.insert(record.sequence, record.clone());
        state.national = Some(national.clone());
        Ok(())
    }

    fn iter_audit(&self) -> Result<Vec<AuditRecord>, StoreError> {
        Ok(self.read().audit.values().cloned().collect())
    }
}

impl ValidatorStore for NullStore {
    fn put_validator_set(&self, set: &ValidatorSet) -> Result<(), StoreError> {
        let mut state = self.write()?;
        state
            .validator_sets
            .insert((set.scope, set.version), set.clone());
        state.latest_sets.insert(set.scope, set.version);
        Ok(())
    }

    fn get_validator_set(&self, scope: ValidatorScope) -> Result<Option<ValidatorSet>, StoreError> {
        let state = self.read();
        let latest = state
            .latest_sets
            .get(&scope)
            .and_then(|version| state.validator_sets.get(&(scope, *version)))
            .cloned();
        Ok(latest)
    }

    fn get_validator_set_version(
        &self,
        scope: ValidatorScope,
        version: u64,
    ) -> Result<Option<ValidatorSet>, StoreError> {
        Ok(self.read().validator_sets.get(&(scope, version)).cloned())
    }
}

impl MetaStore for NullStore {
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.write()?.meta.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.read().meta.get(key).cloned())
    }

    fn get_schema_version(&self) -> Result<u32, StoreError> {
        Ok(self
            .read()
            .meta
            .get("schema_version")
            .and_then(|b| <[u8; 4]>::try_from(b.as_slice()).ok())
            .map(u32::from_le_bytes)
            .unwrap_or(0))
    }

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError> {
        self.put_meta("schema_version", &version.to_le_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_types::{Hash256, Timestamp};

    fn candidate(id: CandidateId) -> Candidate {
        Candidate {
            id,
            name: "n".into(),
            party: "p".into(),
            votes: 0,
            active: true,
            registered_at: Timestamp::EPOCH,
        }
    }

    #[test]
    fn candidates_scoped_by_constituency() {
        let store = NullStore::new();
        store.put_candidate(1, &candidate(2)).unwrap();
        store.put_candidate(1, &candidate(1)).unwrap();
        store.put_candidate(2, &candidate(1)).unwrap();
        let ids: Vec<_> = store.iter_candidates(1).unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn failed_write_leaves_store_untouched() {
        let store = NullStore::new();
        store.fail_writes(true);
        let vote = VoteRecord {
            constituency: 1,
            voter: VoterId::new("v").unwrap(),
            candidate: 1,
            timestamp: Timestamp::EPOCH,
            leaf: Hash256::ZERO,
            sequence: 0,
        };
        assert!(store.record_vote(&vote, &candidate(1)).is_err());
        store.fail_writes(false);
        assert_eq!(store.vote_count(1).unwrap(), 0);
        assert!(store.get_candidate(1, 1).unwrap().is_none());
    }
}
