use tally_store::StoreError;
use tally_types::{
    AccountId, BatchId, ConstituencyId, DivisionId, ErrorClass, Timestamp, ValidatorId,
};
use thiserror::Error;

use crate::shape::ShapeError;

#[derive(Debug, Error)]
pub enum RollupError {
    #[error("vote vector mismatch: {0}")]
    VectorMismatch(String),

    #[error("declared total {declared} does not match vote sum {counted}")]
    TotalMismatch { declared: u64, counted: u128 },

    #[error("constituency {constituency} belongs to division {division}")]
    WrongDivision {
        constituency: ConstituencyId,
        division: DivisionId,
    },

    #[error("unknown constituency {0}")]
    UnknownConstituency(ConstituencyId),

    #[error("constituency {0} is already verified")]
    AlreadyVerified(ConstituencyId),

    #[error("Merkle proof for constituency {0} does not match its root")]
    InvalidProof(ConstituencyId),

    #[error("force verification is disabled")]
    ForceVerifyDisabled,

    #[error("{0} may not force verification")]
    Unauthorized(AccountId),

    #[error("a batch needs at least one constituency")]
    EmptyBatch,

    #[error("constituency {0} is not verified")]
    NotAllVerified(ConstituencyId),

    #[error("constituency {constituency} is already in batch {batch}")]
    AlreadyBatched {
        constituency: ConstituencyId,
        batch: BatchId,
    },

    #[error("rollup window opens at {opens_at}")]
    WindowClosed { opens_at: Timestamp },

    #[error("{0} is not an active division validator")]
    NotAuthorized(ValidatorId),

    #[error("unknown batch {0}")]
    UnknownBatch(BatchId),

    #[error("signature of {validator} over batch {batch} is invalid")]
    InvalidSignature {
        batch: BatchId,
        validator: ValidatorId,
    },

    #[error("{validator} has already signed batch {batch}")]
    AlreadySigned {
        batch: BatchId,
        validator: ValidatorId,
    },

    #[error("division {0} has no finalized batches")]
    NoFinalizedBatches(DivisionId),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl From<ShapeError> for RollupError {
    fn from(e: ShapeError) -> Self {
        match e {
            ShapeError::VectorMismatch(reason) => Self::VectorMismatch(reason),
            ShapeError::TotalMismatch { declared, counted } => {
                Self::TotalMismatch { declared, counted }
            }
        }
    }
}

impl RollupError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::VectorMismatch(_)
            | Self::TotalMismatch { .. }
            | Self::WrongDivision { .. }
            | Self::UnknownConstituency(_)
            | Self::EmptyBatch
            | Self::UnknownBatch(_) => ErrorClass::InputShape,
            Self::ForceVerifyDisabled | Self::Unauthorized(_) | Self::NotAuthorized(_) => {
                ErrorClass::Authorization
            }
            Self::AlreadyVerified(_)
            | Self::NotAllVerified(_)
            | Self::AlreadyBatched { .. }
            | Self::WindowClosed { .. }
            | Self::AlreadySigned { .. }
            | Self::NoFinalizedBatches(_) => ErrorClass::State,
            Self::InvalidProof(_) | Self::InvalidSignature { .. } => ErrorClass::Integrity,
            Self::Storage(_) => ErrorClass::Storage,
        }
    }
}
