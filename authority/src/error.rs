use tally_store::StoreError;
use tally_types::{AccountId, ErrorClass, ValidatorId, ValidatorScope};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthorityError {
    #[error("{caller} is not a {scope} administrator")]
    Unauthorized {
        caller: AccountId,
        scope: ValidatorScope,
    },

    #[error("validator {validator} is already authorized for {scope}")]
    AlreadyAuthorized {
        validator: ValidatorId,
        scope: ValidatorScope,
    },

    #[error("{validator} is not an active {scope} validator")]
    NotAValidator {
        validator: ValidatorId,
        scope: ValidatorScope,
    },

    #[error("invalid threshold {requested}: must be between 1 and {active} active validators")]
    InvalidThreshold { requested: u32, active: usize },

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl AuthorityError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Unauthorized { .. } | Self::InvalidThreshold { .. } => ErrorClass::Authorization,
            Self::AlreadyAuthorized { .. } | Self::NotAValidator { .. } => ErrorClass::State,
            Self::Storage(_) => ErrorClass::Storage,
        }
    }
}
