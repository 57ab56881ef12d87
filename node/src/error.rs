use tally_types::{ConstituencyId, DivisionId, ErrorClass};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("ledger error: {0}")]
    Ledger(#[from] tally_ledger::LedgerError),

    #[error("validator authority error: {0}")]
    Authority(#[from] tally_authority::AuthorityError),

    #[error("rollup error: {0}")]
    Rollup(#[from] tally_rollup::RollupError),

    #[error("national error: {0}")]
    National(#[from] tally_national::NationalError),

    #[error("store error: {0}")]
    Store(#[from] tally_store::StoreError),

    #[error("LMDB error: {0}")]
    Lmdb(#[from] tally_store_lmdb::LmdbError),

    #[error("config error: {0}")]
    Config(String),

    #[error("constituency {0} is not served by this node")]
    UnknownConstituency(ConstituencyId),

    #[error("division {0} is not served by this node")]
    UnknownDivision(DivisionId),

    #[error("constituency {constituency} already holds all {roster} configured candidates")]
    RosterFull {
        constituency: ConstituencyId,
        roster: usize,
    },

    #[error("node state lock poisoned")]
    LockPoisoned,
}

impl NodeError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Ledger(e) => e.class(),
            Self::Authority(e) => e.class(),
            Self::Rollup(e) => e.class(),
            Self::National(e) => e.class(),
            Self::Config(_) | Self::UnknownConstituency(_) | Self::UnknownDivision(_) => {
                ErrorClass::InputShape
            }
            Self::RosterFull { .. } | Self::LockPoisoned => ErrorClass::State,
            Self::Store(_) | Self::Lmdb(_) => ErrorClass::Storage,
        }
    }
}
