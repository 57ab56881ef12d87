use std::collections::{BTreeMap, BTreeSet};

use tally_store::{
    AuditRecord, BatchStore, Candidate, CandidateStore, ConstituencyResult, ConstituencyStore,
    DivisionResult, DivisionStore, LedgerState, LedgerStateStore, NationalResult, NationalStore,
    ResultState, RollupBatch, StoreError, ValidatorRecord, ValidatorSet, ValidatorStore,
    VerificationMethod, VoteRecord, VoteStore,
};
use tally_store_lmdb::{LmdbEnvironment, DEFAULT_MAP_SIZE};
use tally_types::{
    AccountId, Hash256, Timestamp, ValidatorId, ValidatorScope, VoterId, VotingWindow,
};

fn candidate(id: u32, votes: u64) -> Candidate {
    Candidate {
        id,
        name: format!("candidate-{id}"),
        party: "independent".into(),
        votes,
        active: true,
        registered_at: Timestamp::new(1),
    }
}

fn vote(constituency: u32, voter: &str, candidate: u32, sequence: u64) -> VoteRecord {
    VoteRecord {
        constituency,
        voter: VoterId::new(voter).unwrap(),
        candidate,
        timestamp: Timestamp::new(100 + sequence),
        leaf: Hash256::new([sequence as u8; 32]),
        sequence,
    }
}

fn result(id: u32, division: u32) -> ConstituencyResult {
    ConstituencyResult {
        id,
        division,
        merkle_root: Hash256::new([id as u8; 32]),
        total_votes: 3,
        candidate_ids: vec![1, 2],
        votes: vec![2, 1],
        state: ResultState::Verified,
        submitter: AccountId::new("submitter").unwrap(),
        submitted_at: Timestamp::new(10),
        verified_at: Some(Timestamp::new(20)),
        verification: Some(VerificationMethod::Proof),
        batch: None,
    }
}

#[test]
fn record_vote_rejects_second_vote_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = LmdbEnvironment::open(dir.path(), DEFAULT_MAP_SIZE).unwrap();

    store.put_candidate(7, &candidate(1, 0)).unwrap();
    store
        .record_vote(&vote(7, "alice", 1, 0), &candidate(1, 1))
        .unwrap();

    let err = store
        .record_vote(&vote(7, "alice", 1, 1), &candidate(1, 2))
        .unwrap_err();
    assert!(matches!(err, StoreError::Duplicate(_)));
    assert_eq!(store.get_candidate(7, 1).unwrap().unwrap().votes, 1);
    assert_eq!(store.vote_count(7).unwrap(), 1);

    // Same voter in another constituency is a different key.
    store.put_candidate(8, &candidate(1, 0)).unwrap();
    store
        .record_vote(&vote(8, "alice", 1, 0), &candidate(1, 1))
        .unwrap();
    assert_eq!(store.vote_count(8).unwrap(), 1);
}

#[test]
fn votes_come_back_in_cast_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = LmdbEnvironment::open(dir.path(), DEFAULT_MAP_SIZE).unwrap();
    for (seq, voter) in ["zoe", "adam", "mia"].iter().enumerate() {
        store
            .record_vote(&vote(1, voter, 1, seq as u64), &candidate(1, seq as u64 + 1))
            .unwrap();
    }
    let voters: Vec<_> = store
        .iter_votes(1)
        .unwrap()
        .into_iter()
        .map(|v| v.voter.to_string())
        .collect();
    assert_eq!(voters, vec!["zoe", "adam", "mia"]);
}

#[test]
fn create_batch_marks_results_atomically() {
    let dir = tempfile::tempdir().unwrap();
    let store = LmdbEnvironment::open(dir.path(), DEFAULT_MAP_SIZE).unwrap();
    store.put_constituency_result(&result(1, 5)).unwrap();
    store.put_constituency_result(&result(2, 5)).unwrap();
    store.put_constituency_result(&result(3, 6)).unwrap();

    let batch = RollupBatch {
        id: 1,
        division: 5,
        constituency_ids: vec![1, 2],
        created_at: Timestamp::new(5000),
        signatures: Vec::new(),
    };
    let included: Vec<_> = [1, 2]
        .iter()
        .map(|&id| ConstituencyResult {
            batch: Some(1),
            ..result(id, 5)
        })
        .collect();
    store.create_batch(&batch, &included).unwrap();

    assert_eq!(store.last_batch_id().unwrap(), Some(1));
    assert_eq!(store.get_constituency_result(2).unwrap().unwrap().batch, Some(1));
    assert_eq!(store.iter_constituency_results(5).unwrap().len(), 2);
    assert_eq!(store.iter_batches(6).unwrap().len(), 0);

    let err = store.create_batch(&batch, &[]).unwrap_err();
    assert!(matches!(err, StoreError::Duplicate(_)));
}

#[test]
fn audit_sequence_is_append_only() {
    let dir = tempfile::tempdir().unwrap();
    let store = LmdbEnvironment::open(dir.path(), DEFAULT_MAP_SIZE).unwrap();
    let mut national = NationalResult::new(vec![1, 2]);
    national.finalized = true;
    let record = AuditRecord {
        sequence: 0,
        action: "national_finalized".into(),
        data_hash: Hash256::new([9; 32]),
        validators: vec![ValidatorId::new([1; 32])],
        recorded_at: Timestamp::new(42),
    };
    store.commit_finalization(&national, &record).unwrap();
    assert!(store.commit_finalization(&national, &record).is_err());
    assert_eq!(store.iter_audit().unwrap(), vec![record]);
}

#[test]
fn reopen_returns_identical_records() {
    let dir = tempfile::tempdir().unwrap();
    let admin = AccountId::new("admin").unwrap();
    let mut validators = BTreeMap::new();
    let v = ValidatorId::new([3; 32]);
    validators.insert(
        v,
        ValidatorRecord {
            id: v,
            active: true,
            authorized_at: Timestamp::new(2),
            revoked_at: None,
        },
    );
    let set = ValidatorSet {
        scope: ValidatorScope::National,
        version: 1,
        validators,
        required_signatures: 1,
        admins: BTreeSet::from([admin.clone()]),
        updated_at: Timestamp::new(2),
    };
    let state = LedgerState {
        constituency: 4,
        window: Some(VotingWindow::new(Timestamp::new(0), Timestamp::new(100))),
        closed_early_at: None,
    };
    let division = DivisionResult {
        id: 1,
        merkle_root: Hash256::new([5; 32]),
        total_votes: 9,
        candidate_ids: vec![1, 2],
        votes: vec![5, 4],
        state: ResultState::Verified,
        submitter: admin,
        submitted_at: Timestamp::new(3),
        verified_at: Some(Timestamp::new(4)),
    };
    let mut national = NationalResult::new(vec![1, 2]);
    national.totals = vec![5, 4];
    national.total_votes = 9;
    national.divisions_counted = 1;

    {
        let store = LmdbEnvironment::open(dir.path(), DEFAULT_MAP_SIZE).unwrap();
        store.put_validator_set(&set).unwrap();
        store.put_ledger_state(&state).unwrap();
        store.put_candidate(4, &candidate(1, 0)).unwrap();
        store.commit_division_verified(&division, &national).unwrap();
    }

    let store = LmdbEnvironment::open(dir.path(), DEFAULT_MAP_SIZE).unwrap();
    assert_eq!(
        store.get_validator_set(ValidatorScope::National).unwrap(),
        Some(set.clone())
    );
    assert_eq!(
        store
            .get_validator_set_version(ValidatorScope::National, 1)
            .unwrap(),
        Some(set)
    );
    assert_eq!(store.get_validator_set(ValidatorScope::Division).unwrap(), None);
    assert_eq!(store.get_ledger_state(4).unwrap(), Some(state));
    assert_eq!(store.iter_candidates(4).unwrap(), vec![candidate(1, 0)]);
    assert_eq!(store.get_division_result(1).unwrap(), Some(division));
    assert_eq!(store.get_national_result().unwrap(), Some(national));
}
