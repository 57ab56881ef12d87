use tally_rollup::ShapeError;
use tally_store::StoreError;
use tally_types::{DivisionId, ErrorClass, ValidatorId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NationalError {
    #[error("vote vector mismatch: {0}")]
    VectorMismatch(String),

    #[error("declared total {declared} does not match vote sum {counted}")]
    TotalMismatch { declared: u64, counted: u128 },

    #[error("unknown division {0}")]
    UnknownDivision(DivisionId),

    #[error("division {0} is already verified")]
    AlreadyVerified(DivisionId),

    #[error("Merkle proof for division {0} does not match its root")]
    InvalidProof(DivisionId),

    #[error("{0} is not an active national validator")]
    NotAuthorized(ValidatorId),

    #[error("signature of {0} over the national result is invalid")]
    InvalidSignature(ValidatorId),

    #[error("{0} has already signed the current national result")]
    AlreadySigned(ValidatorId),

    #[error("national result is already finalized")]
    AlreadyFinalized,

    #[error("only {verified} of {expected} divisions are verified")]
    IncompleteDivisions { verified: u32, expected: u32 },

    #[error("national quorum not reached: {signers} of {required} signatures")]
    QuorumNotReached { signers: usize, required: u32 },

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl From<ShapeError> for NationalError {
    fn from(e: ShapeError) -> Self {
        match e {
            ShapeError::VectorMismatch(reason) => Self::VectorMismatch(reason),
            ShapeError::TotalMismatch { declared, counted } => {
                Self::TotalMismatch { declared, counted }
            }
        }
    }
}

impl NationalError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::VectorMismatch(_) | Self::TotalMismatch { .. } | Self::UnknownDivision(_) => {
                ErrorClass::InputShape
            }
            Self::NotAuthorized(_) => ErrorClass::Authorization,
            Self::AlreadyVerified(_)
            | Self::AlreadySigned(_)
            | Self::AlreadyFinalized
            | Self::IncompleteDivisions { .. }
            | Self::QuorumNotReached { .. } => ErrorClass::State,
            Self::InvalidProof(_) | Self::InvalidSignature(_) => ErrorClass::Integrity,
            Self::Storage(_) => ErrorClass::Storage,
        }
    }
}
