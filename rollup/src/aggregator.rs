//! The division rollup aggregator.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tally_authority::ValidatorAuthority;
use tally_crypto::{verify_digest, verify_proof, MerkleProof, MerkleTree};
use tally_store::{
    BatchSignature, ConstituencyResult, ResultState, RollupBatch, RollupStore, ValidatorStore,
    VerificationMethod,
};
use tally_types::{
    AccountId, BatchId, CandidateId, Clock, ConstituencyId, DivisionId, Hash256, Signature,
    ValidatorId, ValidatorScope,
};

use crate::config::RollupConfig;
use crate::digest::{batch_digest, constituency_leaf};
use crate::error::RollupError;
use crate::shape::check_submission;
use crate::summary::{BatchTally, ConstituencyInclusion, DivisionRollup};

/// Events emitted by the aggregator for the node to process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RollupEvent {
    ResultSubmitted {
        division: DivisionId,
        constituency: ConstituencyId,
        submitter: AccountId,
    },
    ResultVerified {
        division: DivisionId,
        constituency: ConstituencyId,
        method: VerificationMethod,
    },
    BatchCreated {
        division: DivisionId,
        batch: BatchId,
        constituencies: Vec<ConstituencyId>,
    },
    BatchSigned {
        division: DivisionId,
        batch: BatchId,
        validator: ValidatorId,
        signatures: usize,
    },
    /// Emitted by the signature that first brings the batch to quorum.
    BatchFinalized {
        division: DivisionId,
        batch: BatchId,
    },
}

pub struct RollupAggregator<S> {
    config: RollupConfig,
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    results: BTreeMap<ConstituencyId, ConstituencyResult>,
    batches: BTreeMap<BatchId, RollupBatch>,
    pending_events: Vec<RollupEvent>,
}

impl<S: RollupStore> RollupAggregator<S> {
    /// Open the aggregator for `config.division`, restoring its results and batches.
    pub fn open(
        config: RollupConfig,
        store: Arc<S>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, RollupError> {
        let division = config.division;
        let results = store
            .iter_constituency_results(division)?
            .into_iter()
            .map(|r| (r.id, r))
            .collect();
        let batches = store
            .iter_batches(division)?
            .into_iter()
            .map(|b| (b.id, b))
            .collect::<BTreeMap<_, _>>();
        tracing::debug!(division, batches = batches.len(), "rollup aggregator opened");
        Ok(Self {
            config,
            store,
            clock,
            results,
            batches,
            pending_events: Vec::new(),
        })
    }

    pub fn division(&self) -> DivisionId {
        self.config.division
    }

    pub fn config(&self) -> &RollupConfig {
        &self.config
    }

    pub fn result(&self, id: ConstituencyId) -> Option<&ConstituencyResult> {
        self.results.get(&id)
    }

    pub fn results(&self) -> impl Iterator<Item = &ConstituencyResult> {
        self.results.values()
    }

    pub fn batch(&self, id: BatchId) -> Option<&RollupBatch> {
        self.batches.get(&id)
    }

    pub fn batches(&self) -> impl Iterator<Item = &RollupBatch> {
        self.batches.values()
    }

    /// Accept a constituency's result, or replace one that is not yet verified.
    pub fn submit_constituency_result(
        &mut self,
        submitter: &AccountId,
        id: ConstituencyId,
        merkle_root: Hash256,
        total_votes: u64,
        candidate_ids: Vec<CandidateId>,
        votes: Vec<u64>,
    ) -> Result<(), RollupError> {
        let division = self.division();
        check_submission(&self.config.candidate_ids, &candidate_ids, &votes, total_votes)
            .inspect_err(|e| tracing::debug!(division, constituency = id, %e, "submission rejected"))?;

        if let Some(existing) = self.store.get_constituency_result(id)? {
            if existing.division != division {
                return Err(RollupError::WrongDivision {
                    constituency: id,
                    division: existing.division,
                });
            }
            if existing.is_verified() {
                return Err(RollupError::AlreadyVerified(id));
            }
        }

        let result = ConstituencyResult {
            id,
            division,
            merkle_root,
            total_votes,
            candidate_ids,
            votes,
            state: ResultState::Submitted,
            submitter: submitter.clone(),
            submitted_at: self.clock.now(),
            verified_at: None,
            verification: None,
            batch: None,
        };
        self.store.put_constituency_result(&result)?;
        self.results.insert(id, result);

        tracing::info!(division, constituency = id, total_votes, "constituency result submitted");
        self.pending_events.push(RollupEvent::ResultSubmitted {
            division,
            constituency: id,
            submitter: submitter.clone(),
        });
        Ok(())
    }

    fn unverified(&self, id: ConstituencyId) -> Result<&ConstituencyResult, RollupError> {
        let result = self
            .results
            .get(&id)
            .ok_or(RollupError::UnknownConstituency(id))?;
        if result.is_verified() {
            return Err(RollupError::AlreadyVerified(id));
        }
        Ok(result)
    }

    fn mark_verified(
        &mut self,
        id: ConstituencyId,
        method: VerificationMethod,
    ) -> Result<(), RollupError> {
        let current = self.unverified(id)?;
        let verified = ConstituencyResult {
            state: ResultState::Verified,
            verified_at: Some(self.clock.now()),
            verification: Some(method.clone()),
            ..current.clone()
        };
        self.store.put_constituency_result(&verified)?;
        self.results.insert(id, verified);

        self.pending_events.push(RollupEvent::ResultVerified {
            division: self.division(),
            constituency: id,
            method,
        });
        Ok(())
    }

    /// Verify a submitted result by checking `leaf`'s inclusion proof against its root.
    ///
    /// A constituency where nobody voted has the zero root; it verifies with an empty
    /// proof of the zero leaf. A failing proof changes nothing and is reported as an
    /// integrity error.
    pub fn verify_constituency_result(
        &mut self,
        id: ConstituencyId,
        proof: &MerkleProof,
        leaf: &Hash256,
    ) -> Result<(), RollupError> {
        let result = self.unverified(id)?;
        let included = if result.total_votes == 0 && result.merkle_root == Hash256::ZERO {
            proof.siblings().is_empty() && *leaf == Hash256::ZERO
        } else {
            verify_proof(leaf, proof.siblings(), &result.merkle_root)
        };
        if !included {
            tracing::warn!(
                division = self.division(),
                constituency = id,
                %leaf,
                "Merkle proof does not match submitted root"
            );
            return Err(RollupError::InvalidProof(id));
        }
        self.mark_verified(id, VerificationMethod::Proof)?;
        tracing::info!(division = self.division(), constituency = id, "constituency result verified");
        Ok(())
    }

    /// Mark a result verified without a proof.
    ///
    /// Only available when enabled in configuration, and only to the configured
    /// force-verify administrators. The override is recorded on the result.
    pub fn force_verify(&mut self, caller: &AccountId, id: ConstituencyId) -> Result<(), RollupError> {
        if !self.config.allow_force_verify {
            return Err(RollupError::ForceVerifyDisabled);
        }
        if !self.config.force_verify_admins.contains(caller) {
            tracing::warn!(division = self.division(), %caller, "unauthorized force verify attempt");
            return Err(RollupError::Unauthorized(caller.clone()));
        }
        self.mark_verified(id, VerificationMethod::Forced {
            admin: caller.clone(),
        })?;
        tracing::warn!(
            division = self.division(),
            constituency = id,
            admin = %caller,
            "constituency result force-verified without proof"
        );
        Ok(())
    }

    /// Commit the given verified results to a new batch.
    ///
    /// The batch may only be created once the rollup window has elapsed since the latest
    /// verification among the included results. No totals are computed here.
    pub fn create_rollup_batch(&mut self, ids: &[ConstituencyId]) -> Result<BatchId, RollupError> {
        let division = self.division();
        let ids: BTreeSet<ConstituencyId> = ids.iter().copied().collect();
        if ids.is_empty() {
            return Err(RollupError::EmptyBatch);
        }

        let mut included = Vec::with_capacity(ids.len());
        let mut latest_verification = None;
        for &id in &ids {
            let result = self
                .results
                .get(&id)
                .ok_or(RollupError::UnknownConstituency(id))?;
            if !result.is_verified() {
                return Err(RollupError::NotAllVerified(id));
            }
            if let Some(batch) = result.batch {
                return Err(RollupError::AlreadyBatched {
                    constituency: id,
                    batch,
                });
            }
            latest_verification = latest_verification.max(result.verified_at);
            included.push(result);
        }

        let now = self.clock.now();
        if let Some(verified_at) = latest_verification {
            let opens_at = verified_at.plus(self.config.rollup_window_secs);
            if now < opens_at {
                tracing::debug!(division, %opens_at, "rollup window not yet open");
                return Err(RollupError::WindowClosed { opens_at });
            }
        }

        let id = self.store.last_batch_id()?.map_or(1, |last| last + 1);
        let batch = RollupBatch {
            id,
            division,
            constituency_ids: ids.iter().copied().collect(),
            created_at: now,
            signatures: Vec::new(),
        };
        let marked: Vec<ConstituencyResult> = included
            .into_iter()
            .map(|r| ConstituencyResult {
                batch: Some(id),
                ..r.clone()
            })
            .collect();
        self.store.create_batch(&batch, &marked)?;

        for result in marked {
            self.results.insert(result.id, result);
        }
        self.batches.insert(id, batch.clone());

        tracing::info!(division, batch = id, constituencies = batch.constituency_ids.len(), "rollup batch created");
        self.pending_events.push(RollupEvent::BatchCreated {
            division,
            batch: id,
            constituencies: batch.constituency_ids,
        });
        Ok(id)
    }

    fn known_batch(&self, id: BatchId) -> Result<&RollupBatch, RollupError> {
        self.batches.get(&id).ok_or(RollupError::UnknownBatch(id))
    }

    fn included(&self, batch: &RollupBatch) -> Vec<&ConstituencyResult> {
        batch
            .constituency_ids
            .iter()
            .filter_map(|id| self.results.get(id))
            .collect()
    }

    /// The digest division validators sign for batch `id`.
    pub fn batch_digest(&self, id: BatchId) -> Result<Hash256, RollupError> {
        let batch = self.known_batch(id)?;
        Ok(batch_digest(batch, &self.included(batch)))
    }

    /// Add `validator`'s Ed25519 signature over the batch digest.
    ///
    /// Returns whether the batch is finalized after this signature.
    pub fn sign_rollup_batch<A: ValidatorStore>(
        &mut self,
        authority: &ValidatorAuthority<A>,
        batch_id: BatchId,
        validator: ValidatorId,
        signature: Signature,
    ) -> Result<bool, RollupError> {
        let division = self.division();
        if !authority.is_active(ValidatorScope::Division, &validator) {
            tracing::debug!(division, batch = batch_id, %validator, "signature from non-validator");
            return Err(RollupError::NotAuthorized(validator));
        }
        let batch = self.known_batch(batch_id)?;
        if batch.has_signed(&validator) {
            return Err(RollupError::AlreadySigned {
                batch: batch_id,
                validator,
            });
        }
        let digest = batch_digest(batch, &self.included(batch));
        if !verify_digest(&digest, &signature, &validator) {
            tracing::warn!(division, batch = batch_id, %validator, "invalid batch signature");
            return Err(RollupError::InvalidSignature {
                batch: batch_id,
                validator,
            });
        }

        let was_finalized = authority.is_quorum_reached(ValidatorScope::Division, &batch.signers());
        let mut updated = batch.clone();
        updated.signatures.push(BatchSignature {
            validator,
            signature,
            set_version: authority.version(ValidatorScope::Division),
            signed_at: self.clock.now(),
        });
        self.store.put_batch(&updated)?;
        let finalized = authority.is_quorum_reached(ValidatorScope::Division, &updated.signers());
        let signatures = updated.signatures.len();
        self.batches.insert(batch_id, updated);

        tracing::info!(division, batch = batch_id, %validator, signatures, "rollup batch signed");
        self.pending_events.push(RollupEvent::BatchSigned {
            division,
            batch: batch_id,
            validator,
            signatures,
        });
        if finalized && !was_finalized {
            tracing::info!(division, batch = batch_id, "rollup batch finalized");
            self.pending_events.push(RollupEvent::BatchFinalized {
                division,
                batch: batch_id,
            });
        }
        Ok(finalized)
    }

    /// Whether batch `id` currently has quorum under the current division validator set.
    pub fn is_batch_finalized<A: ValidatorStore>(
        &self,
        authority: &ValidatorAuthority<A>,
        id: BatchId,
    ) -> Result<bool, RollupError> {
        let batch = self.known_batch(id)?;
        Ok(authority.is_quorum_reached(ValidatorScope::Division, &batch.signers()))
    }

    /// Sum the vote vectors of the results in batch `id`.
    pub fn batch_tally(&self, id: BatchId) -> Result<BatchTally, RollupError> {
        let batch = self.known_batch(id)?;
        let (votes, total_votes) = self.sum(self.included(batch));
        Ok(BatchTally {
            batch: id,
            candidate_ids: self.config.candidate_ids.clone(),
            votes,
            total_votes,
        })
    }

    fn sum<'a>(&self, results: impl IntoIterator<Item = &'a ConstituencyResult>) -> (Vec<u64>, u64) {
        let mut votes = vec![0u64; self.config.candidate_ids.len()];
        let mut total = 0u64;
        for result in results {
            for (acc, v) in votes.iter_mut().zip(&result.votes) {
                *acc = acc.saturating_add(*v);
            }
            total = total.saturating_add(result.total_votes);
        }
        (votes, total)
    }

    /// The division result over every finalized batch, with a Merkle inclusion proof per
    /// constituency.
    pub fn division_rollup<A: ValidatorStore>(
        &self,
        authority: &ValidatorAuthority<A>,
    ) -> Result<DivisionRollup, RollupError> {
        let finalized: Vec<&RollupBatch> = self
            .batches
            .values()
            .filter(|b| authority.is_quorum_reached(ValidatorScope::Division, &b.signers()))
            .collect();
        if finalized.is_empty() {
            return Err(RollupError::NoFinalizedBatches(self.division()));
        }

        let mut included: Vec<&ConstituencyResult> =
            finalized.iter().flat_map(|b| self.included(b)).collect();
        included.sort_by_key(|r| r.id);

        let leaves: Vec<Hash256> = included.iter().map(|r| constituency_leaf(r)).collect();
        let tree = MerkleTree::new(&leaves);
        let constituencies = included
            .iter()
            .zip(&leaves)
            .enumerate()
            .map(|(index, (result, leaf))| ConstituencyInclusion {
                constituency: result.id,
                leaf: *leaf,
                proof: tree.proof(index).unwrap_or_default(),
            })
            .collect();
        let (votes, total_votes) = self.sum(included.iter().copied());

        Ok(DivisionRollup {
            division: self.division(),
            merkle_root: tree.root(),
            total_votes,
            candidate_ids: self.config.candidate_ids.clone(),
            votes,
            batches: finalized.iter().map(|b| b.id).collect(),
            constituencies,
        })
    }

    /// Drain all pending events.
    pub fn drain_events(&mut self) -> Vec<RollupEvent> {
        std::mem::take(&mut self.pending_events)
    }
}
