//! The TierTally node: every tier behind one sequencer.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use tally_authority::{AuthorityConfig, ValidatorAuthority};
use tally_crypto::MerkleProof;
use tally_ledger::{ConstituencyReport, LeafProof, LedgerConfig, VoteLedger};
use tally_national::{NationalConfig, NationalFinalizer};
use tally_rollup::{DivisionRollup, RollupAggregator, RollupConfig};
use tally_store::{AuditRecord, TallyStore, VoteRecord};
use tally_store_lmdb::LmdbEnvironment;
use tally_types::{
    AccountId, BatchId, CandidateId, Clock, ConstituencyId, DivisionId, EligibilityOracle,
    Hash256, Signature, SystemClock, ValidatorId, ValidatorScope, VoterId, VotingWindow,
};

use crate::config::NodeConfig;
use crate::eligibility::VoterRoll;
use crate::error::NodeError;
use crate::events::{AuditEvent, EventBus, Listener};
use crate::status::{BatchStatus, ConstituencyStatus, DivisionStatus, NationalStatus, NodeStatus};

struct Tiers<S> {
    authority: ValidatorAuthority<S>,
    ledgers: BTreeMap<ConstituencyId, VoteLedger<S>>,
    rollups: BTreeMap<DivisionId, RollupAggregator<S>>,
    national: NationalFinalizer<S>,
}

impl<S: TallyStore> Tiers<S> {
    fn ledger(&self, id: ConstituencyId) -> Result<&VoteLedger<S>, NodeError> {
        self.ledgers.get(&id).ok_or(NodeError::UnknownConstituency(id))
    }

    fn ledger_mut(&mut self, id: ConstituencyId) -> Result<&mut VoteLedger<S>, NodeError> {
        self.ledgers
            .get_mut(&id)
            .ok_or(NodeError::UnknownConstituency(id))
    }

    fn rollup(&self, id: DivisionId) -> Result<&RollupAggregator<S>, NodeError> {
        self.rollups.get(&id).ok_or(NodeError::UnknownDivision(id))
    }

    fn rollup_mut(&mut self, id: DivisionId) -> Result<&mut RollupAggregator<S>, NodeError> {
        self.rollups.get_mut(&id).ok_or(NodeError::UnknownDivision(id))
    }

    /// Pending events of every component, lowest tier first.
    fn drain(&mut self) -> Vec<AuditEvent> {
        let mut events = Vec::new();
        for ledger in self.ledgers.values_mut() {
            events.extend(ledger.drain_events().into_iter().filter_map(AuditEvent::from_ledger));
        }
        for rollup in self.rollups.values_mut() {
            events.extend(rollup.drain_events().into_iter().map(AuditEvent::from));
        }
        events.extend(self.national.drain_events().into_iter().map(AuditEvent::from));
        events.extend(self.authority.drain_events().into_iter().map(AuditEvent::from));
        events
    }
}

/// Committed events waiting for delivery, in commit order.
#[derive(Default)]
struct Outbox {
    queue: VecDeque<AuditEvent>,
    /// Set while some thread is delivering; others leave their events to it.
    publishing: bool,
}

/// Owns all tiers and applies operations to them one at a time.
pub struct TallyNode<S> {
    config: NodeConfig,
    store: Arc<S>,
    tiers: Mutex<Tiers<S>>,
    outbox: Mutex<Outbox>,
    bus: RwLock<EventBus>,
}

impl TallyNode<LmdbEnvironment> {
    /// Open the node over the LMDB environment in `config.data_dir`.
    pub fn open(config: NodeConfig) -> Result<Self, NodeError> {
        let env = LmdbEnvironment::open(&config.data_dir, config.map_size)?;
        tracing::info!(path = %config.data_dir.display(), "LMDB environment opened");
        Self::with_store(config, Arc::new(env), Arc::new(SystemClock))
    }
}

impl<S: TallyStore> TallyNode<S> {
    /// Open every configured component over `store`.
    ///
    /// On first start each constituency gets the configured candidates and voting window,
    /// and the configured validators are authorized. On later starts state comes from the
    /// store and only missing pieces are added.
    pub fn with_store(
        config: NodeConfig,
        store: Arc<S>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, NodeError> {
        config.validate()?;
        let params = &config.params;
        let commission = config.commission.clone();
        let admins = BTreeSet::from([commission.clone()]);

        let mut authority = ValidatorAuthority::open(
            &AuthorityConfig {
                division_admins: admins.clone(),
                national_admins: admins,
                division_threshold: params.division_threshold,
                national_threshold: params.national_threshold,
            },
            store.clone(),
            clock.clone(),
        )?;
        for (scope, ids) in [
            (ValidatorScope::Division, config.division_validator_ids()?),
            (ValidatorScope::National, config.national_validator_ids()?),
        ] {
            for id in ids {
                if !authority.is_active(scope, &id) {
                    authority.authorize(&commission, id, scope)?;
                }
            }
        }

        let eligibility: Arc<dyn EligibilityOracle> =
            Arc::new(VoterRoll::from_config(config.voter_roll.as_ref()));
        let mut ledgers = BTreeMap::new();
        for (division, constituency) in config.constituencies() {
            let admin = &constituency.admin;
            let mut ledger = VoteLedger::open(
                LedgerConfig {
                    constituency: constituency.id,
                    division,
                    admin: admin.clone(),
                },
                store.clone(),
                clock.clone(),
                eligibility.clone(),
            )?;
            if ledger.registered_count() == 0 {
                for candidate in &config.candidates {
                    ledger.register_candidate(admin, &candidate.name, &candidate.party)?;
                }
            }
            if let Some(window) = config.voting_window {
                if ledger.voting_window().is_none() {
                    ledger.set_voting_window(admin, window)?;
                }
            }
            ledgers.insert(constituency.id, ledger);
        }

        let candidate_ids = config.candidate_ids();
        let mut rollups = BTreeMap::new();
        for division in &config.divisions {
            let rollup = RollupAggregator::open(
                RollupConfig {
                    division: division.id,
                    candidate_ids: candidate_ids.clone(),
                    rollup_window_secs: params.rollup_window_secs,
                    allow_force_verify: params.allow_force_verify,
                    force_verify_admins: config.force_verify_admins.clone(),
                },
                store.clone(),
                clock.clone(),
            )?;
            rollups.insert(division.id, rollup);
        }

        let national = NationalFinalizer::open(
            NationalConfig {
                expected_divisions: params.expected_divisions,
                candidate_ids,
            },
            store.clone(),
            clock,
        )?;

        let mut tiers = Tiers {
            authority,
            ledgers,
            rollups,
            national,
        };
        let setup = tiers.drain();
        tracing::info!(
            constituencies = tiers.ledgers.len(),
            divisions = tiers.rollups.len(),
            setup_events = setup.len(),
            finalized = tiers.national.is_finalized(),
            "tally node opened"
        );

        Ok(Self {
            config,
            store,
            tiers: Mutex::new(tiers),
            outbox: Mutex::new(Outbox::default()),
            bus: RwLock::new(EventBus::new()),
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Register a listener for every audit event committed from now on.
    ///
    /// Listeners run after the node lock is released, in commit order. An operation
    /// issued from inside a listener is committed at once; its events are delivered after
    /// the event being handled.
    pub fn subscribe(&self, listener: Listener) -> Result<(), NodeError> {
        self.bus
            .write()
            .map_err(|_| NodeError::LockPoisoned)?
            .subscribe(listener);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tiers<S>>, NodeError> {
        self.tiers.lock().map_err(|_| NodeError::LockPoisoned)
    }

    fn outbox(&self) -> Result<MutexGuard<'_, Outbox>, NodeError> {
        self.outbox.lock().map_err(|_| NodeError::LockPoisoned)
    }

    /// Run `op` under the node lock, then publish whatever it committed.
    fn apply<T>(
        &self,
        op: impl FnOnce(&mut Tiers<S>) -> Result<T, NodeError>,
    ) -> Result<T, NodeError> {
        let result = {
            let mut tiers = self.lock()?;
            let result = op(&mut tiers);
            let events = tiers.drain();
            // Queued before the node lock is released, so queue order is commit order.
            self.outbox()?.queue.extend(events);
            result
        };
        self.publish()?;
        result
    }

    fn read<T>(&self, op: impl FnOnce(&Tiers<S>) -> Result<T, NodeError>) -> Result<T, NodeError> {
        let tiers = self.lock()?;
        op(&tiers)
    }

    /// Deliver queued events unless another call up the stack or on another thread
    /// already is.
    fn publish(&self) -> Result<(), NodeError> {
        {
            let mut outbox = self.outbox()?;
            if outbox.publishing || outbox.queue.is_empty() {
                return Ok(());
            }
            outbox.publishing = true;
        }
        loop {
            let next = {
                let mut outbox = self.outbox()?;
                let next = outbox.queue.pop_front();
                outbox.publishing = next.is_some();
                next
            };
            let Some(event) = next else {
                return Ok(());
            };
            let listeners = match self.bus.read() {
                Ok(bus) => bus.snapshot(),
                Err(_) => {
                    self.outbox()?.publishing = false;
                    return Err(NodeError::LockPoisoned);
                }
            };
            tracing::debug!(kind = event.kind(), ?event, "audit event");
            listeners.emit(&event);
        }
    }

    // Constituency tier

    pub fn register_candidate(
        &self,
        constituency: ConstituencyId,
        caller: &AccountId,
        name: &str,
        party: &str,
    ) -> Result<CandidateId, NodeError> {
        let roster = self.config.candidates.len();
        self.apply(|t| {
            let ledger = t.ledger_mut(constituency)?;
            if ledger.registered_count() >= roster {
                return Err(NodeError::RosterFull {
                    constituency,
                    roster,
                });
            }
            Ok(ledger.register_candidate(caller, name, party)?)
        })
    }

    pub fn remove_candidate(
        &self,
        constituency: ConstituencyId,
        caller: &AccountId,
        candidate: CandidateId,
    ) -> Result<(), NodeError> {
        self.apply(|t| Ok(t.ledger_mut(constituency)?.remove_candidate(caller, candidate)?))
    }

    pub fn set_voting_window(
        &self,
        constituency: ConstituencyId,
        caller: &AccountId,
        window: VotingWindow,
    ) -> Result<(), NodeError> {
        self.apply(|t| Ok(t.ledger_mut(constituency)?.set_voting_window(caller, window)?))
    }

    pub fn close_voting(&self, constituency: ConstituencyId, caller: &AccountId) -> Result<(), NodeError> {
        self.apply(|t| Ok(t.ledger_mut(constituency)?.close_voting(caller)?))
    }

    pub fn cast_vote(
        &self,
        constituency: ConstituencyId,
        voter: &VoterId,
        candidate: CandidateId,
    ) -> Result<VoteRecord, NodeError> {
        self.apply(|t| Ok(t.ledger_mut(constituency)?.cast_vote(voter, candidate)?))
    }

    /// Per-candidate counts, available once voting has closed.
    pub fn constituency_results(
        &self,
        constituency: ConstituencyId,
    ) -> Result<Vec<(CandidateId, u64)>, NodeError> {
        self.read(|t| Ok(t.ledger(constituency)?.get_results()?))
    }

    pub fn has_voted(&self, constituency: ConstituencyId, voter: &VoterId) -> Result<bool, NodeError> {
        self.read(|t| Ok(t.ledger(constituency)?.has_voted(voter)))
    }

    /// The voter's leaf and its inclusion proof under the constituency root.
    pub fn proof_for(
        &self,
        constituency: ConstituencyId,
        voter: &VoterId,
    ) -> Result<Option<LeafProof>, NodeError> {
        self.read(|t| Ok(t.ledger(constituency)?.proof_for(voter)))
    }

    /// Forward a closed constituency's report to its division on behalf of `submitter`.
    pub fn submit_constituency(
        &self,
        constituency: ConstituencyId,
        submitter: &AccountId,
    ) -> Result<ConstituencyReport, NodeError> {
        self.apply(|t| {
            let report = t.ledger(constituency)?.constituency_report()?;
            t.rollup_mut(report.division)?.submit_constituency_result(
                submitter,
                report.constituency,
                report.merkle_root,
                report.total_votes,
                report.candidate_ids.clone(),
                report.votes.clone(),
            )?;
            Ok(report)
        })
    }

    // Division tier

    #[allow(clippy::too_many_arguments)]
    pub fn submit_constituency_result(
        &self,
        division: DivisionId,
        submitter: &AccountId,
        constituency: ConstituencyId,
        merkle_root: Hash256,
        total_votes: u64,
        candidate_ids: Vec<CandidateId>,
        votes: Vec<u64>,
    ) -> Result<(), NodeError> {
        self.apply(|t| {
            Ok(t.rollup_mut(division)?.submit_constituency_result(
                submitter,
                constituency,
                merkle_root,
                total_votes,
                candidate_ids,
                votes,
            )?)
        })
    }

    pub fn verify_constituency_result(
        &self,
        division: DivisionId,
        constituency: ConstituencyId,
        proof: &MerkleProof,
        leaf: &Hash256,
    ) -> Result<(), NodeError> {
        self.apply(|t| {
            Ok(t.rollup_mut(division)?.verify_constituency_result(constituency, proof, leaf)?)
        })
    }

    pub fn force_verify(
        &self,
        division: DivisionId,
        caller: &AccountId,
        constituency: ConstituencyId,
    ) -> Result<(), NodeError> {
        self.apply(|t| Ok(t.rollup_mut(division)?.force_verify(caller, constituency)?))
    }

    pub fn create_rollup_batch(
        &self,
        division: DivisionId,
        constituencies: &[ConstituencyId],
    ) -> Result<BatchId, NodeError> {
        self.apply(|t| Ok(t.rollup_mut(division)?.create_rollup_batch(constituencies)?))
    }

    pub fn batch_digest(&self, division: DivisionId, batch: BatchId) -> Result<Hash256, NodeError> {
        self.read(|t| Ok(t.rollup(division)?.batch_digest(batch)?))
    }

    /// Returns whether the batch is finalized after this signature.
    pub fn sign_rollup_batch(
        &self,
        division: DivisionId,
        batch: BatchId,
        validator: ValidatorId,
        signature: Signature,
    ) -> Result<bool, NodeError> {
        self.apply(|t| {
            let Tiers {
                authority, rollups, ..
            } = t;
            let rollup = rollups
                .get_mut(&division)
                .ok_or(NodeError::UnknownDivision(division))?;
            Ok(rollup.sign_rollup_batch(authority, batch, validator, signature)?)
        })
    }

    pub fn division_rollup(&self, division: DivisionId) -> Result<DivisionRollup, NodeError> {
        self.read(|t| Ok(t.rollup(division)?.division_rollup(&t.authority)?))
    }

    /// Forward a division's finalized batches to the national tier.
    pub fn submit_division(
        &self,
        division: DivisionId,
        submitter: &AccountId,
    ) -> Result<DivisionRollup, NodeError> {
        self.apply(|t| {
            let rollup = t.rollup(division)?.division_rollup(&t.authority)?;
            t.national.submit_division_result(
                submitter,
                rollup.division,
                rollup.merkle_root,
                rollup.total_votes,
                rollup.candidate_ids.clone(),
                rollup.votes.clone(),
            )?;
            Ok(rollup)
        })
    }

    // National tier

    pub fn verify_division_result(
        &self,
        division: DivisionId,
        proof: &MerkleProof,
        leaf: &Hash256,
    ) -> Result<(), NodeError> {
        self.apply(|t| Ok(t.national.verify_division_result(division, proof, leaf)?))
    }

    pub fn national_digest(&self) -> Result<Hash256, NodeError> {
        self.read(|t| Ok(t.national.result_digest()))
    }

    /// Returns whether the current national digest has quorum after this signature.
    pub fn sign_national_result(
        &self,
        validator: ValidatorId,
        signature: Signature,
    ) -> Result<bool, NodeError> {
        self.apply(|t| {
            let Tiers {
                authority, national, ..
            } = t;
            Ok(national.sign_national_result(authority, validator, signature)?)
        })
    }

    pub fn finalize_national_result(&self) -> Result<AuditRecord, NodeError> {
        self.apply(|t| {
            let Tiers {
                authority, national, ..
            } = t;
            Ok(national.finalize_national_result(authority)?)
        })
    }

    pub fn audit_trail(&self) -> Result<Vec<AuditRecord>, NodeError> {
        self.read(|t| Ok(t.national.audit_trail()?))
    }

    // Validator authority

    pub fn authorize_validator(
        &self,
        caller: &AccountId,
        validator: ValidatorId,
        scope: ValidatorScope,
    ) -> Result<u64, NodeError> {
        self.apply(|t| Ok(t.authority.authorize(caller, validator, scope)?))
    }

    pub fn revoke_validator(
        &self,
        caller: &AccountId,
        validator: ValidatorId,
        scope: ValidatorScope,
    ) -> Result<u64, NodeError> {
        self.apply(|t| Ok(t.authority.revoke(caller, validator, scope)?))
    }

    pub fn set_required_signatures(
        &self,
        caller: &AccountId,
        scope: ValidatorScope,
        required: u32,
    ) -> Result<u64, NodeError> {
        self.apply(|t| Ok(t.authority.set_required_signatures(caller, scope, required)?))
    }

    pub fn active_validators(&self, scope: ValidatorScope) -> Result<Vec<ValidatorId>, NodeError> {
        self.read(|t| Ok(t.authority.active_validators(scope)))
    }

    /// Snapshot of every tier.
    pub fn status(&self) -> Result<NodeStatus, NodeError> {
        self.read(|t| {
            let result = t.national.result();
            let national = NationalStatus {
                finalized: result.finalized,
                finalized_at: result.finalized_at,
                divisions_counted: result.divisions_counted,
                expected_divisions: t.national.config().expected_divisions,
                candidate_ids: result.candidate_ids.clone(),
                totals: result.totals.clone(),
                total_votes: result.total_votes,
                data_hash: t.national.result_digest().to_string(),
                signers: t
                    .national
                    .current_signers()
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
            };

            let divisions = t
                .rollups
                .values()
                .map(|rollup| DivisionStatus {
                    id: rollup.division(),
                    results_submitted: rollup.results().count(),
                    results_verified: rollup.results().filter(|r| r.is_verified()).count(),
                    batches: rollup
                        .batches()
                        .map(|b| BatchStatus {
                            id: b.id,
                            constituencies: b.constituency_ids.clone(),
                            signatures: b.signatures.len(),
                            finalized: t
                                .authority
                                .is_quorum_reached(ValidatorScope::Division, &b.signers()),
                        })
                        .collect(),
                })
                .collect();

            let constituencies = t
                .ledgers
                .values()
                .map(|ledger| ConstituencyStatus {
                    id: ledger.constituency(),
                    division: ledger.config().division,
                    open: ledger.is_open(),
                    closed: ledger.is_closed(),
                    total_votes: ledger.total_votes(),
                    merkle_root: ledger.merkle_root().to_string(),
                })
                .collect();

            Ok(NodeStatus {
                national,
                divisions,
                constituencies,
            })
        })
    }
}
