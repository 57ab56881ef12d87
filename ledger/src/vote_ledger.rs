//! The constituency vote ledger.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tally_crypto::{generate_leaf, MerkleTree};
use tally_store::{Candidate, LedgerState, LedgerStore, VoteRecord};
use tally_types::{
    AccountId, CandidateId, Clock, ConstituencyId, EligibilityOracle, Hash256, Timestamp, VoterId,
    VotingWindow,
};

use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::report::{ConstituencyReport, LeafProof};

/// Events emitted by the ledger for the node to process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerEvent {
    CandidateRegistered {
        constituency: ConstituencyId,
        candidate: CandidateId,
    },
    CandidateRemoved {
        constituency: ConstituencyId,
        candidate: CandidateId,
    },
    VotingWindowSet {
        constituency: ConstituencyId,
        window: VotingWindow,
    },
    VotingClosed {
        constituency: ConstituencyId,
        at: Timestamp,
    },
    VoteCast {
        constituency: ConstituencyId,
        voter: VoterId,
        candidate: CandidateId,
        leaf: Hash256,
        sequence: u64,
    },
}

/// Recompute a vote's leaf and compare it with the stored one.
pub fn verify_leaf(record: &VoteRecord) -> bool {
    generate_leaf(&record.voter, record.candidate, record.timestamp) == record.leaf
}

/// One constituency's ballot box.
///
/// Every mutation validates first, persists all touched records in one store call, and
/// only then updates memory, so a failed write leaves the ledger as it was.
pub struct VoteLedger<S> {
    config: LedgerConfig,
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    eligibility: Arc<dyn EligibilityOracle>,
    state: LedgerState,
    candidates: BTreeMap<CandidateId, Candidate>,
    /// Vote leaves in cast order.
    leaves: Vec<Hash256>,
    /// Voter to index into `leaves`.
    voters: HashMap<VoterId, usize>,
    pending_events: Vec<LedgerEvent>,
}

impl<S: LedgerStore> VoteLedger<S> {
    /// Open the ledger for `config.constituency`, restoring whatever the store holds.
    ///
    /// Every stored vote is checked against its leaf hash; a mismatch refuses to open.
    pub fn open(
        config: LedgerConfig,
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        eligibility: Arc<dyn EligibilityOracle>,
    ) -> Result<Self, LedgerError> {
        let constituency = config.constituency;
        let state = store
            .get_ledger_state(constituency)?
            .unwrap_or_else(|| LedgerState::new(constituency));
        let candidates = store
            .iter_candidates(constituency)?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let mut leaves = Vec::new();
        let mut voters = HashMap::new();
        for record in store.iter_votes(constituency)? {
            if !verify_leaf(&record) {
                tracing::warn!(constituency, voter = %record.voter, "stored vote fails leaf check");
                return Err(LedgerError::TamperedVote(record.voter));
            }
            voters.insert(record.voter, leaves.len());
            leaves.push(record.leaf);
        }

        tracing::debug!(constituency, votes = leaves.len(), "vote ledger opened");
        Ok(Self {
            config,
            store,
            clock,
            eligibility,
            state,
            candidates,
            leaves,
            voters,
            pending_events: Vec::new(),
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn constituency(&self) -> ConstituencyId {
        self.config.constituency
    }

    fn require_admin(&self, caller: &AccountId) -> Result<(), LedgerError> {
        if *caller != self.config.admin {
            tracing::debug!(constituency = self.constituency(), %caller, "rejected non-admin call");
            return Err(LedgerError::Unauthorized(caller.clone()));
        }
        Ok(())
    }

    fn has_started(&self, now: Timestamp) -> bool {
        !self.leaves.is_empty()
            || self.state.closed_early_at.is_some()
            || self.state.window.is_some_and(|w| now >= w.opens_at)
    }

    fn is_open_at(&self, now: Timestamp) -> bool {
        self.state.closed_early_at.is_none() && self.state.window.is_some_and(|w| w.is_open(now))
    }

    fn is_closed_at(&self, now: Timestamp) -> bool {
        self.state.closed_early_at.is_some() || self.state.window.is_some_and(|w| w.has_closed(now))
    }

    /// Whether votes are accepted right now.
    pub fn is_open(&self) -> bool {
        self.is_open_at(self.clock.now())
    }

    /// Whether voting is over, either because the window passed or the admin closed it.
    pub fn is_closed(&self) -> bool {
        self.is_closed_at(self.clock.now())
    }

    pub fn voting_window(&self) -> Option<VotingWindow> {
        self.state.window
    }

    /// Register a candidate before voting starts. Ids are assigned sequentially from 1.
    pub fn register_candidate(
        &mut self,
        caller: &AccountId,
        name: &str,
        party: &str,
    ) -> Result<CandidateId, LedgerError> {
        self.require_admin(caller)?;
        if name.trim().is_empty() {
            return Err(LedgerError::EmptyCandidateName);
        }
        let now = self.clock.now();
        if self.has_started(now) {
            return Err(LedgerError::VotingAlreadyStarted);
        }

        let id = self.candidates.keys().next_back().map_or(1, |last| last + 1);
        let candidate = Candidate {
            id,
            name: name.to_string(),
            party: party.to_string(),
            votes: 0,
            active: true,
            registered_at: now,
        };
        self.store.put_candidate(self.constituency(), &candidate)?;
        self.candidates.insert(id, candidate);

        tracing::info!(constituency = self.constituency(), candidate = id, name, "candidate registered");
        self.pending_events.push(LedgerEvent::CandidateRegistered {
            constituency: self.constituency(),
            candidate: id,
        });
        Ok(id)
    }

    /// Mark a candidate inactive. Only possible while nobody has voted for it.
    pub fn remove_candidate(&mut self, caller: &AccountId, id: CandidateId) -> Result<(), LedgerError> {
        self.require_admin(caller)?;
        let candidate = self
            .candidates
            .get(&id)
            .filter(|c| c.active)
            .ok_or(LedgerError::UnknownCandidate(id))?;
        if candidate.votes > 0 {
            return Err(LedgerError::CandidateHasVotes(id));
        }

        let updated = Candidate {
            active: false,
            ..candidate.clone()
        };
        self.store.put_candidate(self.constituency(), &updated)?;
        self.candidates.insert(id, updated);

        tracing::info!(constituency = self.constituency(), candidate = id, "candidate removed");
        self.pending_events.push(LedgerEvent::CandidateRemoved {
            constituency: self.constituency(),
            candidate: id,
        });
        Ok(())
    }

    /// Set or replace the voting window. Refused once any vote exists.
    pub fn set_voting_window(
        &mut self,
        caller: &AccountId,
        window: VotingWindow,
    ) -> Result<(), LedgerError> {
        self.require_admin(caller)?;
        if !window.is_well_formed() {
            return Err(LedgerError::InvalidWindow);
        }
        if !self.leaves.is_empty() {
            return Err(LedgerError::VotingAlreadyStarted);
        }

        let updated = LedgerState {
            window: Some(window),
            closed_early_at: None,
            ..self.state.clone()
        };
        self.store.put_ledger_state(&updated)?;
        self.state = updated;

        tracing::info!(
            constituency = self.constituency(),
            opens_at = window.opens_at.as_secs(),
            closes_at = window.closes_at.as_secs(),
            "voting window set"
        );
        self.pending_events.push(LedgerEvent::VotingWindowSet {
            constituency: self.constituency(),
            window,
        });
        Ok(())
    }

    /// Close voting now, ahead of the window's end.
    pub fn close_voting(&mut self, caller: &AccountId) -> Result<(), LedgerError> {
        self.require_admin(caller)?;
        let now = self.clock.now();
        if self.state.window.is_none() || self.is_closed_at(now) {
            return Err(LedgerError::VotingClosed);
        }

        let updated = LedgerState {
            closed_early_at: Some(now),
            ..self.state.clone()
        };
        self.store.put_ledger_state(&updated)?;
        self.state = updated;

        tracing::info!(constituency = self.constituency(), "voting closed by administrator");
        self.pending_events.push(LedgerEvent::VotingClosed {
            constituency: self.constituency(),
            at: now,
        });
        Ok(())
    }

    /// Record `voter`'s vote for `candidate`.
    pub fn cast_vote(
        &mut self,
        voter: &VoterId,
        candidate: CandidateId,
    ) -> Result<VoteRecord, LedgerError> {
        let constituency = self.constituency();
        let timestamp = self.clock.now();
        if !self.is_open_at(timestamp) {
            tracing::debug!(constituency, %voter, "vote outside voting window");
            return Err(LedgerError::VotingClosed);
        }
        if !self.eligibility.is_eligible(voter) {
            tracing::debug!(constituency, %voter, "ineligible voter");
            return Err(LedgerError::NotEligible(voter.clone()));
        }
        if self.voters.contains_key(voter) {
            tracing::debug!(constituency, %voter, "repeat vote rejected");
            return Err(LedgerError::AlreadyVoted(voter.clone()));
        }
        let current = self
            .candidates
            .get(&candidate)
            .filter(|c| c.active)
            .ok_or(LedgerError::UnknownCandidate(candidate))?;

        let record = VoteRecord {
            constituency,
            voter: voter.clone(),
            candidate,
            timestamp,
            leaf: generate_leaf(voter, candidate, timestamp),
            sequence: self.leaves.len() as u64,
        };
        let updated = Candidate {
            votes: current.votes + 1,
            ..current.clone()
        };
        self.store.record_vote(&record, &updated)?;

        self.candidates.insert(candidate, updated);
        self.voters.insert(voter.clone(), self.leaves.len());
        self.leaves.push(record.leaf);

        tracing::info!(constituency, candidate, sequence = record.sequence, "vote cast");
        self.pending_events.push(LedgerEvent::VoteCast {
            constituency,
            voter: voter.clone(),
            candidate,
            leaf: record.leaf,
            sequence: record.sequence,
        });
        Ok(record)
    }

    /// `(candidate id, votes)` for every active candidate, once voting has closed.
    pub fn get_results(&self) -> Result<Vec<(CandidateId, u64)>, LedgerError> {
        if !self.is_closed() {
            return Err(LedgerError::VotingStillOpen);
        }
        Ok(self
            .candidates
            .values()
            .filter(|c| c.active)
            .map(|c| (c.id, c.votes))
            .collect())
    }

    /// Ids of the active candidates, ascending.
    pub fn candidate_ids(&self) -> Vec<CandidateId> {
        self.candidates
            .values()
            .filter(|c| c.active)
            .map(|c| c.id)
            .collect()
    }

    pub fn candidate(&self, id: CandidateId) -> Option<&Candidate> {
        self.candidates.get(&id)
    }

    /// Number of candidates ever registered, withdrawn ones included.
    pub fn registered_count(&self) -> usize {
        self.candidates.len()
    }

    pub fn total_votes(&self) -> u64 {
        self.leaves.len() as u64
    }

    pub fn has_voted(&self, voter: &VoterId) -> bool {
        self.voters.contains_key(voter)
    }

    /// Root of the Merkle tree over all vote leaves in cast order.
    pub fn merkle_root(&self) -> Hash256 {
        MerkleTree::new(&self.leaves).root()
    }

    /// Inclusion proof of `voter`'s leaf under [`VoteLedger::merkle_root`].
    pub fn proof_for(&self, voter: &VoterId) -> Option<LeafProof> {
        let index = *self.voters.get(voter)?;
        let proof = MerkleTree::new(&self.leaves).proof(index)?;
        Some(LeafProof {
            leaf: self.leaves[index],
            proof,
        })
    }

    /// The result a submitter forwards to the division, available once voting closed.
    ///
    /// The vector covers every registered candidate, so it lines up with the election
    /// roster. A withdrawn candidate is reported with zero votes, since removal is refused
    /// once it has any and an inactive candidate cannot receive more.
    pub fn constituency_report(&self) -> Result<ConstituencyReport, LedgerError> {
        if !self.is_closed() {
            return Err(LedgerError::VotingStillOpen);
        }
        Ok(ConstituencyReport {
            constituency: self.constituency(),
            division: self.config.division,
            merkle_root: self.merkle_root(),
            total_votes: self.total_votes(),
            candidate_ids: self.candidates.keys().copied().collect(),
            votes: self.candidates.values().map(|c| c.votes).collect(),
        })
    }

    /// Drain all pending events.
    pub fn drain_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.pending_events)
    }
}
