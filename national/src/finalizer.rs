//! The national finalizer.

use std::collections::BTreeMap;
use std::sync::Arc;

use tally_authority::ValidatorAuthority;
use tally_crypto::{digest, verify_digest, verify_proof, MerkleProof};
use tally_rollup::check_submission;
use tally_store::{
    AuditRecord, DivisionResult, FinalizerStore, NationalResult, NationalSignature, ResultState,
    ValidatorStore,
};
use tally_types::{
    AccountId, CandidateId, Clock, DivisionId, Hash256, Signature, Timestamp, ValidatorId,
    ValidatorScope,
};

use crate::config::NationalConfig;
use crate::error::NationalError;

pub const NATIONAL_DOMAIN: &[u8] = b"tally-national-result";

const FINALIZED_ACTION: &str = "national_finalized";

/// The digest national validators sign.
///
/// Covers the running totals and the roots of every verified division, so any verification
/// after a signature makes that signature stale.
pub fn national_digest(result: &NationalResult, verified: &[&DivisionResult]) -> Hash256 {
    let mut body = Vec::new();
    body.extend_from_slice(&result.divisions_counted.to_le_bytes());
    body.extend_from_slice(&result.total_votes.to_le_bytes());
    for (candidate, total) in result.candidate_ids.iter().zip(&result.totals) {
        body.extend_from_slice(&candidate.to_le_bytes());
        body.extend_from_slice(&total.to_le_bytes());
    }
    for division in verified {
        body.extend_from_slice(&division.id.to_le_bytes());
        body.extend_from_slice(division.merkle_root.as_bytes());
    }
    digest(NATIONAL_DOMAIN, &[&body])
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NationalEvent {
    DivisionSubmitted {
        division: DivisionId,
        submitter: AccountId,
    },
    DivisionVerified {
        division: DivisionId,
        total_votes: u64,
    },
    NationalSigned {
        validator: ValidatorId,
        data_hash: Hash256,
    },
    NationalFinalized {
        data_hash: Hash256,
        validators: Vec<ValidatorId>,
        at: Timestamp,
    },
}

pub struct NationalFinalizer<S> {
    config: NationalConfig,
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    divisions: BTreeMap<DivisionId, DivisionResult>,
    national: NationalResult,
    pending_events: Vec<NationalEvent>,
}

impl<S: FinalizerStore> NationalFinalizer<S> {
    pub fn open(
        config: NationalConfig,
        store: Arc<S>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, NationalError> {
        let divisions = store
            .iter_division_results()?
            .into_iter()
            .map(|d| (d.id, d))
            .collect();
        let national = match store.get_national_result()? {
            Some(stored) => {
                if stored.candidate_ids != config.candidate_ids {
                    return Err(NationalError::VectorMismatch(
                        "stored national result has a different candidate list".into(),
                    ));
                }
                stored
            }
            None => NationalResult::new(config.candidate_ids.clone()),
        };
        tracing::debug!(
            divisions_counted = national.divisions_counted,
            finalized = national.finalized,
            "national finalizer opened"
        );
        Ok(Self {
            config,
            store,
            clock,
            divisions,
            national,
            pending_events: Vec::new(),
        })
    }

    pub fn config(&self) -> &NationalConfig {
        &self.config
    }

    pub fn result(&self) -> &NationalResult {
        &self.national
    }

    pub fn division(&self, id: DivisionId) -> Option<&DivisionResult> {
        self.divisions.get(&id)
    }

    pub fn divisions(&self) -> impl Iterator<Item = &DivisionResult> {
        self.divisions.values()
    }

    pub fn is_finalized(&self) -> bool {
        self.national.finalized
    }

    fn not_finalized(&self) -> Result<(), NationalError> {
        if self.national.finalized {
            return Err(NationalError::AlreadyFinalized);
        }
        Ok(())
    }

    /// Accept a division's result, or replace one that is not yet verified.
    pub fn submit_division_result(
        &mut self,
        submitter: &AccountId,
        id: DivisionId,
        merkle_root: Hash256,
        total_votes: u64,
        candidate_ids: Vec<CandidateId>,
        votes: Vec<u64>,
    ) -> Result<(), NationalError> {
        self.not_finalized()?;
        check_submission(&self.config.candidate_ids, &candidate_ids, &votes, total_votes)
            .inspect_err(|e| tracing::debug!(division = id, %e, "division submission rejected"))?;
        if self.divisions.get(&id).is_some_and(DivisionResult::is_verified) {
            return Err(NationalError::AlreadyVerified(id));
        }

        let result = DivisionResult {
            id,
            merkle_root,
            total_votes,
            candidate_ids,
            votes,
            state: ResultState::Submitted,
            submitter: submitter.clone(),
            submitted_at: self.clock.now(),
            verified_at: None,
        };
        self.store.put_division_result(&result)?;
        self.divisions.insert(id, result);

        tracing::info!(division = id, total_votes, "division result submitted");
        self.pending_events.push(NationalEvent::DivisionSubmitted {
            division: id,
            submitter: submitter.clone(),
        });
        Ok(())
    }

    /// Verify a submitted division result against `leaf`'s inclusion proof and add its
    /// votes to the national totals.
    pub fn verify_division_result(
        &mut self,
        id: DivisionId,
        proof: &MerkleProof,
        leaf: &Hash256,
    ) -> Result<(), NationalError> {
        self.not_finalized()?;
        let current = self
            .divisions
            .get(&id)
            .ok_or(NationalError::UnknownDivision(id))?;
        if current.is_verified() {
            return Err(NationalError::AlreadyVerified(id));
        }
        if !verify_proof(leaf, proof.siblings(), &current.merkle_root) {
            tracing::warn!(division = id, %leaf, "Merkle proof does not match division root");
            return Err(NationalError::InvalidProof(id));
        }

        let verified = DivisionResult {
            state: ResultState::Verified,
            verified_at: Some(self.clock.now()),
            ..current.clone()
        };
        let mut national = self.national.clone();
        for (total, votes) in national.totals.iter_mut().zip(&verified.votes) {
            *total = total.saturating_add(*votes);
        }
        national.total_votes = national.total_votes.saturating_add(verified.total_votes);
        national.divisions_counted += 1;

        self.store.commit_division_verified(&verified, &national)?;
        let total_votes = verified.total_votes;
        self.divisions.insert(id, verified);
        self.national = national;

        tracing::info!(
            division = id,
            total_votes,
            divisions_counted = self.national.divisions_counted,
            "division result verified"
        );
        self.pending_events.push(NationalEvent::DivisionVerified {
            division: id,
            total_votes,
        });
        Ok(())
    }

    fn verified_divisions(&self) -> Vec<&DivisionResult> {
        self.divisions.values().filter(|d| d.is_verified()).collect()
    }

    /// The digest of the current national totals.
    pub fn result_digest(&self) -> Hash256 {
        national_digest(&self.national, &self.verified_divisions())
    }

    /// Validators whose signature is over the current digest.
    pub fn current_signers(&self) -> Vec<ValidatorId> {
        let current = self.result_digest();
        self.national
            .signatures
            .iter()
            .filter(|s| s.data_hash == current)
            .map(|s| s.validator)
            .collect()
    }

    /// Add `validator`'s signature over the current result digest.
    ///
    /// A signature the validator made over an earlier digest is replaced. Returns whether
    /// the current digest has quorum after this signature.
    pub fn sign_national_result<A: ValidatorStore>(
        &mut self,
        authority: &ValidatorAuthority<A>,
        validator: ValidatorId,
        signature: Signature,
    ) -> Result<bool, NationalError> {
        self.not_finalized()?;
        if !authority.is_active(ValidatorScope::National, &validator) {
            tracing::debug!(%validator, "national signature from non-validator");
            return Err(NationalError::NotAuthorized(validator));
        }
        let data_hash = self.result_digest();
        if self
            .national
            .signatures
            .iter()
            .any(|s| s.validator == validator && s.data_hash == data_hash)
        {
            return Err(NationalError::AlreadySigned(validator));
        }
        if !verify_digest(&data_hash, &signature, &validator) {
            tracing::warn!(%validator, "invalid national signature");
            return Err(NationalError::InvalidSignature(validator));
        }

        let mut national = self.national.clone();
        national.signatures.retain(|s| s.validator != validator);
        national.signatures.push(NationalSignature {
            validator,
            data_hash,
            signature,
            set_version: authority.version(ValidatorScope::National),
            signed_at: self.clock.now(),
        });
        self.store.put_national_result(&national)?;
        self.national = national;

        let signers = self.current_signers();
        tracing::info!(%validator, signatures = signers.len(), "national result signed");
        self.pending_events.push(NationalEvent::NationalSigned {
            validator,
            data_hash,
        });
        Ok(authority.is_quorum_reached(ValidatorScope::National, &signers))
    }

    /// Finalize the national result and append its audit record.
    ///
    /// Requires every expected division to be verified and a quorum of active national
    /// validators over the current digest. After this every mutation fails.
    pub fn finalize_national_result<A: ValidatorStore>(
        &mut self,
        authority: &ValidatorAuthority<A>,
    ) -> Result<AuditRecord, NationalError> {
        self.not_finalized()?;
        let verified = self.national.divisions_counted;
        let expected = self.config.expected_divisions;
        if verified < expected {
            return Err(NationalError::IncompleteDivisions { verified, expected });
        }
        let signers: Vec<ValidatorId> = self
            .current_signers()
            .into_iter()
            .filter(|v| authority.is_active(ValidatorScope::National, v))
            .collect();
        if !authority.is_quorum_reached(ValidatorScope::National, &signers) {
            return Err(NationalError::QuorumNotReached {
                signers: signers.len(),
                required: authority.required_signatures(ValidatorScope::National),
            });
        }

        let now = self.clock.now();
        let data_hash = self.result_digest();
        let record = AuditRecord {
            sequence: self.store.iter_audit()?.len() as u64,
            action: FINALIZED_ACTION.to_string(),
            data_hash,
            validators: signers.clone(),
            recorded_at: now,
        };
        let mut national = self.national.clone();
        national.finalized = true;
        national.finalized_at = Some(now);
        self.store.commit_finalization(&national, &record)?;
        self.national = national;

        tracing::info!(
            %data_hash,
            total_votes = self.national.total_votes,
            validators = signers.len(),
            "national result finalized"
        );
        self.pending_events.push(NationalEvent::NationalFinalized {
            data_hash,
            validators: signers,
            at: now,
        });
        Ok(record)
    }

    /// The audit trail in sequence order.
    pub fn audit_trail(&self) -> Result<Vec<AuditRecord>, NationalError> {
        Ok(self.store.iter_audit()?)
    }

    pub fn drain_events(&mut self) -> Vec<NationalEvent> {
        std::mem::take(&mut self.pending_events)
    }
}
