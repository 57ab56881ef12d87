use serde::{Deserialize, Serialize};
use tally_types::{AccountId, ConstituencyId, DivisionId};

/// Static identity of one constituency ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub constituency: ConstituencyId,
    /// The division this constituency reports to.
    pub division: DivisionId,
    /// The only account allowed to manage candidates and the voting window.
    pub admin: AccountId,
}
