//! Node configuration with TOML file support.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tally_store_lmdb::DEFAULT_MAP_SIZE;
use tally_types::{
    AccountId, CandidateId, ConstituencyId, DivisionId, TallyParams, ValidatorId, VoterId,
    VotingWindow,
};

use crate::logging::LogFormat;
use crate::NodeError;

/// A candidate registered in every constituency on first start.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateConfig {
    pub name: String,
    #[serde(default)]
    pub party: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstituencyConfig {
    pub id: ConstituencyId,
    /// Manages candidates and the voting window of this constituency.
    pub admin: AccountId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivisionConfig {
    pub id: DivisionId,
    #[serde(default)]
    pub constituencies: Vec<ConstituencyConfig>,
}

/// Configuration for a TierTally node.
///
/// Loaded from a TOML file via [`NodeConfig::from_toml_file`] or built in code for tests.
/// Scalar fields come first so the TOML form keeps every table after them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// LMDB directory.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_map_size")]
    pub map_size: usize,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Filter directive: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Administers both validator sets and may submit results upward.
    #[serde(default = "default_commission")]
    pub commission: AccountId,

    /// Accounts allowed to force-verify constituency results, when enabled in `params`.
    #[serde(default)]
    pub force_verify_admins: BTreeSet<AccountId>,

    /// Hex-encoded Ed25519 public keys authorized as division validators on start.
    #[serde(default)]
    pub division_validators: Vec<String>,

    /// Hex-encoded Ed25519 public keys authorized as national validators on start.
    #[serde(default)]
    pub national_validators: Vec<String>,

    /// Eligible voters. Every well-formed voter id is eligible when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voter_roll: Option<Vec<VoterId>>,

    #[serde(default)]
    pub params: TallyParams,

    /// Applied to every constituency that has no window yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voting_window: Option<VotingWindow>,

    #[serde(default)]
    pub candidates: Vec<CandidateConfig>,

    #[serde(default = "default_divisions")]
    pub divisions: Vec<DivisionConfig>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./tally_data")
}

fn default_map_size() -> usize {
    DEFAULT_MAP_SIZE
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_commission() -> AccountId {
    AccountId::new("election-commission").expect("literal identity is valid")
}

fn default_divisions() -> Vec<DivisionConfig> {
    vec![DivisionConfig {
        id: 1,
        constituencies: vec![ConstituencyConfig {
            id: 1,
            admin: AccountId::new("returning-officer-1").expect("literal identity is valid"),
        }],
    }]
}

impl NodeConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, NodeError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        let config: Self = toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Candidate ids every ledger assigns, in registration order.
    pub fn candidate_ids(&self) -> Vec<CandidateId> {
        (1..=self.candidates.len() as CandidateId).collect()
    }

    /// Every configured constituency with the division it reports to.
    pub fn constituencies(&self) -> impl Iterator<Item = (DivisionId, &ConstituencyConfig)> {
        self.divisions
            .iter()
            .flat_map(|d| d.constituencies.iter().map(move |c| (d.id, c)))
    }

    pub fn division_validator_ids(&self) -> Result<Vec<ValidatorId>, NodeError> {
        parse_validators(&self.division_validators)
    }

    pub fn national_validator_ids(&self) -> Result<Vec<ValidatorId>, NodeError> {
        parse_validators(&self.national_validators)
    }

    /// Reject layouts the tiers cannot serve.
    pub fn validate(&self) -> Result<(), NodeError> {
        let mut divisions = BTreeSet::new();
        let mut constituencies = BTreeSet::new();
        for division in &self.divisions {
            if !divisions.insert(division.id) {
                return Err(NodeError::Config(format!("division {} listed twice", division.id)));
            }
            for constituency in &division.constituencies {
                if !constituencies.insert(constituency.id) {
                    return Err(NodeError::Config(format!(
                        "constituency {} listed twice",
                        constituency.id
                    )));
                }
                check_identity(constituency.admin.as_str(), "constituency admin")?;
            }
        }
        check_identity(self.commission.as_str(), "commission")?;
        for admin in &self.force_verify_admins {
            check_identity(admin.as_str(), "force verify admin")?;
        }
        for voter in self.voter_roll.iter().flatten() {
            check_identity(voter.as_str(), "voter")?;
        }
        if let Some(window) = &self.voting_window {
            if !window.is_well_formed() {
                return Err(NodeError::Config("voting window closes before it opens".into()));
            }
        }
        if self.candidates.iter().any(|c| c.name.trim().is_empty()) {
            return Err(NodeError::Config("candidate with an empty name".into()));
        }
        self.division_validator_ids()?;
        self.national_validator_ids()?;
        if self.params.expected_divisions as usize > self.divisions.len() {
            tracing::warn!(
                expected = self.params.expected_divisions,
                configured = self.divisions.len(),
                "more divisions expected than this node serves"
            );
        }
        Ok(())
    }
}

// Deserialized identities skip the constructor's checks.
fn check_identity(raw: &str, what: &str) -> Result<(), NodeError> {
    AccountId::new(raw)
        .map(|_| ())
        .map_err(|e| NodeError::Config(format!("{what} {raw:?}: {e}")))
}

fn parse_validators(hex: &[String]) -> Result<Vec<ValidatorId>, NodeError> {
    hex.iter()
        .map(|s| {
            ValidatorId::from_hex(s).map_err(|e| NodeError::Config(format!("validator {s:?}: {e}")))
        })
        .collect()
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            map_size: default_map_size(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            commission: default_commission(),
            force_verify_admins: BTreeSet::new(),
            division_validators: Vec::new(),
            national_validators: Vec::new(),
            voter_roll: None,
            params: TallyParams::default(),
            voting_window: None,
            candidates: Vec::new(),
            divisions: default_divisions(),
        }
    }
}
