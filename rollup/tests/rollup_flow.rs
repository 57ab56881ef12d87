use std::collections::BTreeSet;
use std::sync::Arc;

use tally_authority::{AuthorityConfig, ValidatorAuthority};
use tally_crypto::{keypair_from_seed, sign_digest, verify_proof, MerkleProof};
use tally_ledger::{LedgerConfig, VoteLedger};
use tally_nullables::{NullClock, NullEligibility, NullStore};
use tally_rollup::{RollupAggregator, RollupConfig, RollupError, RollupEvent};
use tally_store::{ConstituencyStore, VerificationMethod};
use tally_types::{
    AccountId, Clock, ErrorClass, Hash256, KeyPair, Timestamp, ValidatorScope, VoterId,
    VotingWindow,
};

const WINDOW: u64 = 600;

struct Harness {
    store: Arc<NullStore>,
    clock: Arc<NullClock>,
    admin: AccountId,
    authority: ValidatorAuthority<NullStore>,
    rollup: RollupAggregator<NullStore>,
    keys: Vec<KeyPair>,
}

fn account(name: &str) -> AccountId {
    AccountId::new(name).unwrap()
}

impl Harness {
    fn new(validators: usize, threshold: u32, allow_force_verify: bool) -> Self {
        let store = Arc::new(NullStore::new());
        let clock = Arc::new(NullClock::new(10_000));
        let admin = account("commission");
        let mut authority = ValidatorAuthority::open(
            &AuthorityConfig {
                division_admins: BTreeSet::from([admin.clone()]),
                national_admins: BTreeSet::from([admin.clone()]),
                division_threshold: threshold,
                national_threshold: threshold,
            },
            store.clone(),
            clock.clone(),
        )
        .unwrap();
        let keys: Vec<KeyPair> = (0..validators)
            .map(|i| keypair_from_seed(&[i as u8 + 1; 32]))
            .collect();
        for key in &keys {
            authority
                .authorize(&admin, key.validator_id(), ValidatorScope::Division)
                .unwrap();
        }
        let rollup = RollupAggregator::open(
            RollupConfig {
                division: 1,
                candidate_ids: vec![1, 2, 3, 4, 5],
                rollup_window_secs: WINDOW,
                allow_force_verify,
                force_verify_admins: BTreeSet::from([admin.clone()]),
            },
            store.clone(),
            clock.clone(),
        )
        .unwrap();
        Self {
            store,
            clock,
            admin,
            authority,
            rollup,
            keys,
        }
    }

    fn submit(&mut self, id: u32, root: Hash256, votes: Vec<u64>) -> Result<(), RollupError> {
        let total = votes.iter().sum();
        self.rollup.submit_constituency_result(
            &account("submitter"),
            id,
            root,
            total,
            vec![1, 2, 3, 4, 5],
            votes,
        )
    }

    /// Submit a single-leaf constituency and verify it with its (empty) proof.
    fn submit_and_verify(&mut self, id: u32) {
        let leaf = Hash256::new([id as u8; 32]);
        let root = tally_crypto::MerkleTree::new(&[leaf]).root();
        self.submit(id, root, vec![1, 0, 0, 0, 0]).unwrap();
        self.rollup
            .verify_constituency_result(id, &MerkleProof::default(), &leaf)
            .unwrap();
    }

    fn sign(&mut self, batch: u64, signer: usize) -> Result<bool, RollupError> {
        let digest = self.rollup.batch_digest(batch).unwrap();
        let key = &self.keys[signer];
        let signature = sign_digest(&digest, &key.private);
        self.rollup
            .sign_rollup_batch(&self.authority, batch, key.validator_id(), signature)
    }
}

/// Cast (3,2,2,2,1) in a real ledger and return it closed.
fn closed_ledger(store: Arc<NullStore>, clock: Arc<NullClock>) -> VoteLedger<NullStore> {
    let admin = account("officer");
    let mut ledger = VoteLedger::open(
        LedgerConfig {
            constituency: 7,
            division: 1,
            admin: admin.clone(),
        },
        store,
        clock.clone(),
        Arc::new(NullEligibility::allow_all()),
    )
    .unwrap();
    for name in ["A", "B", "C", "D", "E"] {
        ledger.register_candidate(&admin, name, "p").unwrap();
    }
    let now = clock.now().as_secs();
    ledger
        .set_voting_window(
            &admin,
            VotingWindow::new(Timestamp::new(now + 1), Timestamp::new(now + 100)),
        )
        .unwrap();
    clock.advance(1);
    let mut n = 0;
    for (candidate, count) in [(1, 3), (2, 2), (3, 2), (4, 2), (5, 1)] {
        for _ in 0..count {
            ledger
                .cast_vote(&VoterId::new(format!("v{n}")).unwrap(), candidate)
                .unwrap();
            n += 1;
        }
    }
    ledger.close_voting(&admin).unwrap();
    ledger
}

#[test]
fn ledger_report_verifies_at_division() {
    let mut h = Harness::new(3, 2, false);
    let ledger = closed_ledger(h.store.clone(), h.clock.clone());
    let report = ledger.constituency_report().unwrap();
    assert_eq!(report.votes, vec![3, 2, 2, 2, 1]);

    h.rollup
        .submit_constituency_result(
            &account("submitter"),
            report.constituency,
            report.merkle_root,
            report.total_votes,
            report.candidate_ids.clone(),
            report.votes.clone(),
        )
        .unwrap();

    let voter = VoterId::new("v4").unwrap();
    let lp = ledger.proof_for(&voter).unwrap();
    h.rollup
        .verify_constituency_result(7, &lp.proof, &lp.leaf)
        .unwrap();

    // Round trip: vector and total survive verification unchanged.
    let stored = h.store.get_constituency_result(7).unwrap().unwrap();
    assert!(stored.is_verified());
    assert_eq!(stored.votes, vec![3, 2, 2, 2, 1]);
    assert_eq!(stored.total_votes, 10);
    assert_eq!(stored.verification, Some(VerificationMethod::Proof));
}

#[test]
fn total_nine_for_ten_votes_rejected() {
    let mut h = Harness::new(1, 1, false);
    let err = h
        .rollup
        .submit_constituency_result(
            &account("submitter"),
            7,
            Hash256::ZERO,
            9,
            vec![1, 2, 3, 4, 5],
            vec![3, 2, 2, 2, 1],
        )
        .unwrap_err();
    assert!(matches!(
        err,
        RollupError::TotalMismatch {
            declared: 9,
            counted: 10
        }
    ));
    assert_eq!(err.class(), ErrorClass::InputShape);
    assert!(h.rollup.result(7).is_none());
}

#[test]
fn bad_proof_leaves_result_submitted() {
    let mut h = Harness::new(1, 1, false);
    let leaf = Hash256::new([1; 32]);
    let root = tally_crypto::MerkleTree::new(&[leaf, Hash256::new([2; 32])]).root();
    h.submit(3, root, vec![2, 0, 0, 0, 0]).unwrap();

    let err = h
        .rollup
        .verify_constituency_result(3, &MerkleProof::default(), &leaf)
        .unwrap_err();
    assert!(matches!(err, RollupError::InvalidProof(3)));
    assert_eq!(err.class(), ErrorClass::Integrity);
    assert!(!h.rollup.result(3).unwrap().is_verified());
}

#[test]
fn constituency_without_votes_verifies_and_batches() {
    let mut h = Harness::new(1, 1, false);
    h.submit(8, Hash256::ZERO, vec![0, 0, 0, 0, 0]).unwrap();

    let stray = Hash256::new([8; 32]);
    assert!(matches!(
        h.rollup.verify_constituency_result(8, &MerkleProof::default(), &stray),
        Err(RollupError::InvalidProof(8))
    ));
    assert!(matches!(
        h.rollup
            .verify_constituency_result(8, &MerkleProof(vec![stray]), &Hash256::ZERO),
        Err(RollupError::InvalidProof(8))
    ));

    h.rollup
        .verify_constituency_result(8, &MerkleProof::default(), &Hash256::ZERO)
        .unwrap();
    assert_eq!(
        h.rollup.result(8).unwrap().verification,
        Some(VerificationMethod::Proof)
    );
    h.clock.advance(WINDOW);
    let batch = h.rollup.create_rollup_batch(&[8]).unwrap();
    assert!(h.sign(batch, 0).unwrap());
    assert_eq!(h.rollup.division_rollup(&h.authority).unwrap().total_votes, 0);
}

#[test]
fn zero_root_with_votes_still_needs_a_proof() {
    let mut h = Harness::new(1, 1, false);
    h.submit(9, Hash256::ZERO, vec![0, 1, 0, 0, 0]).unwrap();
    assert!(matches!(
        h.rollup
            .verify_constituency_result(9, &MerkleProof::default(), &Hash256::ZERO),
        Err(RollupError::InvalidProof(9))
    ));
}

#[test]
fn verified_result_is_immutable() {
    let mut h = Harness::new(1, 1, false);
    h.submit_and_verify(4);
    assert!(matches!(
        h.submit(4, Hash256::ZERO, vec![1, 0, 0, 0, 0]),
        Err(RollupError::AlreadyVerified(4))
    ));
    assert!(matches!(
        h.rollup
            .verify_constituency_result(4, &MerkleProof::default(), &Hash256::ZERO),
        Err(RollupError::AlreadyVerified(4))
    ));
}

#[test]
fn unverified_resubmission_replaces() {
    let mut h = Harness::new(1, 1, false);
    h.submit(5, Hash256::ZERO, vec![1, 0, 0, 0, 0]).unwrap();
    h.submit(5, Hash256::new([9; 32]), vec![0, 2, 0, 0, 0])
        .unwrap();
    let result = h.rollup.result(5).unwrap();
    assert_eq!(result.merkle_root, Hash256::new([9; 32]));
    assert_eq!(result.total_votes, 2);
}

#[test]
fn force_verify_is_off_by_default() {
    let mut h = Harness::new(1, 1, false);
    h.submit(6, Hash256::ZERO, vec![1, 0, 0, 0, 0]).unwrap();
    let admin = h.admin.clone();
    assert!(matches!(
        h.rollup.force_verify(&admin, 6),
        Err(RollupError::ForceVerifyDisabled)
    ));
}

#[test]
fn force_verify_needs_configured_admin() {
    let mut h = Harness::new(1, 1, true);
    h.submit(6, Hash256::ZERO, vec![1, 0, 0, 0, 0]).unwrap();
    assert!(matches!(
        h.rollup.force_verify(&account("someone"), 6),
        Err(RollupError::Unauthorized(_))
    ));
    let admin = h.admin.clone();
    h.rollup.force_verify(&admin, 6).unwrap();
    assert_eq!(
        h.rollup.result(6).unwrap().verification,
        Some(VerificationMethod::Forced { admin })
    );
}

#[test]
fn batch_needs_every_result_verified() {
    let mut h = Harness::new(1, 1, false);
    h.submit_and_verify(1);
    h.submit(2, Hash256::ZERO, vec![1, 0, 0, 0, 0]).unwrap();
    h.clock.advance(WINDOW);
    assert!(matches!(
        h.rollup.create_rollup_batch(&[1, 2]),
        Err(RollupError::NotAllVerified(2))
    ));
    assert!(matches!(
        h.rollup.create_rollup_batch(&[]),
        Err(RollupError::EmptyBatch)
    ));
    assert!(matches!(
        h.rollup.create_rollup_batch(&[1, 99]),
        Err(RollupError::UnknownConstituency(99))
    ));
}

#[test]
fn batch_waits_for_rollup_window() {
    let mut h = Harness::new(1, 1, false);
    h.submit_and_verify(1);
    h.clock.advance(WINDOW / 2);
    h.submit_and_verify(2);

    // The window runs from the latest included verification.
    h.clock.advance(WINDOW / 2);
    assert!(matches!(
        h.rollup.create_rollup_batch(&[1, 2]),
        Err(RollupError::WindowClosed { .. })
    ));
    h.clock.advance(WINDOW / 2);
    assert_eq!(h.rollup.create_rollup_batch(&[2, 1, 2]).unwrap(), 1);
    assert_eq!(h.rollup.batch(1).unwrap().constituency_ids, vec![1, 2]);
}

#[test]
fn constituency_joins_one_batch_only() {
    let mut h = Harness::new(1, 1, false);
    h.submit_and_verify(1);
    h.submit_and_verify(2);
    h.clock.advance(WINDOW);
    assert_eq!(h.rollup.create_rollup_batch(&[1]).unwrap(), 1);
    assert!(matches!(
        h.rollup.create_rollup_batch(&[1, 2]),
        Err(RollupError::AlreadyBatched {
            constituency: 1,
            batch: 1
        })
    ));
    assert_eq!(h.rollup.create_rollup_batch(&[2]).unwrap(), 2);
}

#[test]
fn two_of_three_required_is_not_finalized() {
    let mut h = Harness::new(3, 3, false);
    h.submit_and_verify(1);
    h.clock.advance(WINDOW);
    let batch = h.rollup.create_rollup_batch(&[1]).unwrap();
    assert!(!h.sign(batch, 0).unwrap());
    assert!(!h.sign(batch, 1).unwrap());
    assert!(!h.rollup.is_batch_finalized(&h.authority, batch).unwrap());
    assert!(h.sign(batch, 2).unwrap());
}

#[test]
fn revoking_a_signer_drops_quorum() {
    let mut h = Harness::new(3, 2, false);
    h.submit_and_verify(1);
    h.clock.advance(WINDOW);
    let batch = h.rollup.create_rollup_batch(&[1]).unwrap();
    h.sign(batch, 0).unwrap();
    assert!(h.sign(batch, 1).unwrap());
    assert!(h.rollup.is_batch_finalized(&h.authority, batch).unwrap());

    let admin = h.admin.clone();
    let revoked = h.keys[1].validator_id();
    h.authority
        .revoke(&admin, revoked, ValidatorScope::Division)
        .unwrap();
    assert_eq!(h.rollup.batch(batch).unwrap().signatures.len(), 2);
    assert!(!h.rollup.is_batch_finalized(&h.authority, batch).unwrap());

    // A revoked validator can no longer sign anything.
    assert!(matches!(h.sign(batch, 1), Err(RollupError::NotAuthorized(_))));
}

#[test]
fn signing_rules() {
    let mut h = Harness::new(2, 2, false);
    h.submit_and_verify(1);
    h.clock.advance(WINDOW);
    let batch = h.rollup.create_rollup_batch(&[1]).unwrap();

    h.sign(batch, 0).unwrap();
    assert!(matches!(
        h.sign(batch, 0),
        Err(RollupError::AlreadySigned { .. })
    ));

    let outsider = keypair_from_seed(&[200; 32]);
    let digest = h.rollup.batch_digest(batch).unwrap();
    assert!(matches!(
        h.rollup.sign_rollup_batch(
            &h.authority,
            batch,
            outsider.validator_id(),
            sign_digest(&digest, &outsider.private)
        ),
        Err(RollupError::NotAuthorized(_))
    ));

    // Validator 1 signs the wrong digest.
    let forged = sign_digest(&Hash256::new([0xAB; 32]), &h.keys[1].private);
    let err = h
        .rollup
        .sign_rollup_batch(&h.authority, batch, h.keys[1].validator_id(), forged)
        .unwrap_err();
    assert!(matches!(err, RollupError::InvalidSignature { .. }));
    assert_eq!(err.class(), ErrorClass::Integrity);

    let digest_two = h.rollup.batch_digest(batch).unwrap();
    assert!(matches!(
        h.rollup.sign_rollup_batch(
            &h.authority,
            99,
            h.keys[1].validator_id(),
            sign_digest(&digest_two, &h.keys[1].private)
        ),
        Err(RollupError::UnknownBatch(99))
    ));
}

#[test]
fn finalized_event_fires_once() {
    let mut h = Harness::new(3, 2, false);
    h.submit_and_verify(1);
    h.clock.advance(WINDOW);
    let batch = h.rollup.create_rollup_batch(&[1]).unwrap();
    h.rollup.drain_events();
    for signer in 0..3 {
        h.sign(batch, signer).unwrap();
    }
    let finalized: Vec<_> = h
        .rollup
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, RollupEvent::BatchFinalized { .. }))
        .collect();
    assert_eq!(finalized, vec![RollupEvent::BatchFinalized { division: 1, batch }]);
}

#[test]
fn division_rollup_uses_finalized_batches_only() {
    let mut h = Harness::new(1, 1, false);
    assert!(matches!(
        h.rollup.division_rollup(&h.authority),
        Err(RollupError::NoFinalizedBatches(1))
    ));
    for id in 1..=3 {
        h.submit_and_verify(id);
    }
    h.clock.advance(WINDOW);
    let first = h.rollup.create_rollup_batch(&[1, 2]).unwrap();
    let second = h.rollup.create_rollup_batch(&[3]).unwrap();
    h.sign(first, 0).unwrap();

    let rollup = h.rollup.division_rollup(&h.authority).unwrap();
    assert_eq!(rollup.batches, vec![first]);
    assert_eq!(rollup.total_votes, 2);
    assert_eq!(rollup.votes, vec![2, 0, 0, 0, 0]);
    for inclusion in &rollup.constituencies {
        assert!(verify_proof(
            &inclusion.leaf,
            inclusion.proof.siblings(),
            &rollup.merkle_root
        ));
    }
    assert_eq!(h.rollup.batch_tally(second).unwrap().total_votes, 1);
}

#[test]
fn reopen_restores_batches_and_signatures() {
    let mut h = Harness::new(2, 2, false);
    h.submit_and_verify(1);
    h.clock.advance(WINDOW);
    let batch = h.rollup.create_rollup_batch(&[1]).unwrap();
    h.sign(batch, 0).unwrap();

    let reopened = RollupAggregator::open(
        h.rollup.config().clone(),
        h.store.clone(),
        h.clock.clone(),
    )
    .unwrap();
    assert_eq!(reopened.batch(batch), h.rollup.batch(batch));
    assert_eq!(reopened.result(1).unwrap().batch, Some(batch));
}
