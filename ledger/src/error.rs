use tally_store::StoreError;
use tally_types::{AccountId, CandidateId, ErrorClass, VoterId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{0} is not the ledger administrator")]
    Unauthorized(AccountId),

    #[error("candidate name must not be empty")]
    EmptyCandidateName,

    #[error("unknown or inactive candidate {0}")]
    UnknownCandidate(CandidateId),

    #[error("candidate {0} already has votes")]
    CandidateHasVotes(CandidateId),

    #[error("voting window must close after it opens")]
    InvalidWindow,

    #[error("voting has already started")]
    VotingAlreadyStarted,

    #[error("voting is closed")]
    VotingClosed,

    #[error("voting is still open")]
    VotingStillOpen,

    #[error("voter {0} is not eligible")]
    NotEligible(VoterId),

    #[error("voter {0} has already voted")]
    AlreadyVoted(VoterId),

    #[error("stored vote of {0} does not match its leaf hash")]
    TamperedVote(VoterId),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl LedgerError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::EmptyCandidateName | Self::UnknownCandidate(_) | Self::InvalidWindow => {
                ErrorClass::InputShape
            }
            Self::Unauthorized(_) | Self::NotEligible(_) => ErrorClass::Authorization,
            Self::CandidateHasVotes(_)
            | Self::VotingAlreadyStarted
            | Self::VotingClosed
            | Self::VotingStillOpen
            | Self::AlreadyVoted(_) => ErrorClass::State,
            Self::TamperedVote(_) => ErrorClass::Integrity,
            Self::Storage(_) => ErrorClass::Storage,
        }
    }
}
