//! Audit events fanned out to subscribers after each committed operation.

use std::sync::Arc;

use tally_authority::AuthorityEvent;
use tally_ledger::LedgerEvent;
use tally_national::NationalEvent;
use tally_rollup::RollupEvent;
use tally_store::VerificationMethod;
use tally_types::{
    AccountId, BatchId, CandidateId, ConstituencyId, DivisionId, Hash256, Timestamp, ValidatorId,
    ValidatorScope, VoterId,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuditEvent {
    VoteCast {
        constituency: ConstituencyId,
        voter: VoterId,
        candidate: CandidateId,
        leaf: Hash256,
    },
    VotingClosed {
        constituency: ConstituencyId,
        at: Timestamp,
    },
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
    },
    BatchFinalized {
        division: DivisionId,
        batch: BatchId,
    },
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
    ValidatorSetChanged {
        scope: ValidatorScope,
        version: u64,
    },
}

impl AuditEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::VoteCast { .. } => "vote_cast",
            Self::VotingClosed { .. } => "voting_closed",
            Self::ResultSubmitted { .. } => "result_submitted",
            Self::ResultVerified { .. } => "result_verified",
            Self::BatchCreated { .. } => "batch_created",
            Self::BatchSigned { .. } => "batch_signed",
            Self::BatchFinalized { .. } => "batch_finalized",
            Self::DivisionSubmitted { .. } => "division_submitted",
            Self::DivisionVerified { .. } => "division_verified",
            Self::NationalSigned { .. } => "national_signed",
            Self::NationalFinalized { .. } => "national_finalized",
            Self::ValidatorSetChanged { .. } => "validator_set_changed",
        }
    }

    /// Candidate and window changes are setup, not audit history.
    pub fn from_ledger(event: LedgerEvent) -> Option<Self> {
        match event {
            LedgerEvent::VoteCast {
                constituency,
                voter,
                candidate,
                leaf,
                ..
            } => Some(Self::VoteCast {
                constituency,
                voter,
                candidate,
                leaf,
            }),
            LedgerEvent::VotingClosed { constituency, at } => {
                Some(Self::VotingClosed { constituency, at })
            }
            LedgerEvent::CandidateRegistered { .. }
            | LedgerEvent::CandidateRemoved { .. }
            | LedgerEvent::VotingWindowSet { .. } => None,
        }
    }
}

impl From<RollupEvent> for AuditEvent {
    fn from(event: RollupEvent) -> Self {
        match event {
            RollupEvent::ResultSubmitted {
                division,
                constituency,
                submitter,
            } => Self::ResultSubmitted {
                division,
                constituency,
                submitter,
            },
            RollupEvent::ResultVerified {
                division,
                constituency,
                method,
            } => Self::ResultVerified {
                division,
                constituency,
                method,
            },
            RollupEvent::BatchCreated {
                division,
                batch,
                constituencies,
            } => Self::BatchCreated {
                division,
                batch,
                constituencies,
            },
            RollupEvent::BatchSigned {
                division,
                batch,
                validator,
                ..
            } => Self::BatchSigned {
                division,
                batch,
                validator,
            },
            RollupEvent::BatchFinalized { division, batch } => {
                Self::BatchFinalized { division, batch }
            }
        }
    }
}

impl From<NationalEvent> for AuditEvent {
    fn from(event: NationalEvent) -> Self {
        match event {
            NationalEvent::DivisionSubmitted {
                division,
                submitter,
            } => Self::DivisionSubmitted {
                division,
                submitter,
            },
            NationalEvent::DivisionVerified {
                division,
                total_votes,
            } => Self::DivisionVerified {
                division,
                total_votes,
            },
            NationalEvent::NationalSigned {
                validator,
                data_hash,
            } => Self::NationalSigned {
                validator,
                data_hash,
            },
            NationalEvent::NationalFinalized {
                data_hash,
                validators,
                at,
            } => Self::NationalFinalized {
                data_hash,
                validators,
                at,
            },
        }
    }
}

impl From<AuthorityEvent> for AuditEvent {
    fn from(event: AuthorityEvent) -> Self {
        let (scope, version) = match event {
            AuthorityEvent::ValidatorAuthorized { scope, version, .. }
            | AuthorityEvent::ValidatorRevoked { scope, version, .. }
            | AuthorityEvent::ThresholdChanged { scope, version, .. } => (scope, version),
        };
        Self::ValidatorSetChanged { scope, version }
    }
}

pub type Listener = Box<dyn Fn(&AuditEvent) + Send + Sync>;

type SharedListener = Arc<dyn Fn(&AuditEvent) + Send + Sync>;

/// Synchronous fan-out event bus.
///
/// The node delivers events in commit order after releasing its state lock, so a
/// listener may call back into the node, including to subscribe.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<SharedListener>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Listener) {
        self.listeners.push(Arc::from(listener));
    }

    pub fn emit(&self, event: &AuditEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    /// The current listeners, to call without holding the bus.
    pub(crate) fn snapshot(&self) -> EventBus {
        EventBus {
            listeners: self.listeners.clone(),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    #[test]
    fn emit_calls_all_listeners() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut bus = EventBus::new();

        let c1 = Arc::clone(&counter);
        bus.subscribe(Box::new(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        }));
        let c2 = Arc::clone(&counter);
        bus.subscribe(Box::new(move |_| {
            c2.fetch_add(10, Ordering::SeqCst);
        }));

        bus.emit(&AuditEvent::BatchFinalized {
            division: 1,
            batch: 1,
        });
        assert_eq!(counter.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn emit_with_no_listeners_is_noop() {
        let bus = EventBus::default();
        assert_eq!(bus.listener_count(), 0);
        bus.emit(&AuditEvent::ValidatorSetChanged {
            scope: ValidatorScope::National,
            version: 1,
        });
    }

    #[test]
    fn setup_ledger_events_are_not_audited() {
        let registered = LedgerEvent::CandidateRegistered {
            constituency: 1,
            candidate: 1,
        };
        assert_eq!(AuditEvent::from_ledger(registered), None);

        let closed = LedgerEvent::VotingClosed {
            constituency: 1,
            at: Timestamp::new(5),
        };
        assert_eq!(
            AuditEvent::from_ledger(closed).map(|e| e.kind()),
            Some("voting_closed")
        );
    }

    #[test]
    fn authority_events_collapse_to_set_changes() {
        let event = AuthorityEvent::ThresholdChanged {
            scope: ValidatorScope::Division,
            required: 3,
            version: 4,
        };
        assert_eq!(
            AuditEvent::from(event),
            AuditEvent::ValidatorSetChanged {
                scope: ValidatorScope::Division,
                version: 4
            }
        );
    }
}
