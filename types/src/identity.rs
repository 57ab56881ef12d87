//! Identities of the parties that act on the tally.
//!
//! - [`VoterId`]: an eligible voter at the constituency tier.
//! - [`AccountId`]: an administrator or result submitter.
//! - [`ValidatorId`]: a division or national validator, identified by its Ed25519 public key.

use crate::keys::PublicKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Longest accepted voter / account identity, in bytes.
pub const MAX_IDENTITY_LEN: usize = 128;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("identity is empty")]
    Empty,

    #[error("identity is {0} bytes, longer than {MAX_IDENTITY_LEN}")]
    TooLong(usize),

    #[error("validator id must be 64 hex characters")]
    BadValidatorHex,
}

fn check(raw: &str) -> Result<(), IdentityError> {
    if raw.is_empty() {
        return Err(IdentityError::Empty);
    }
    if raw.len() > MAX_IDENTITY_LEN {
        return Err(IdentityError::TooLong(raw.len()));
    }
    Ok(())
}

/// Identity of a voter within an election.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VoterId(String);

impl VoterId {
    pub fn new(raw: impl Into<String>) -> Result<Self, IdentityError> {
        let s = raw.into();
        check(&s)?;
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VoterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of an administrator or a result submitter.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(raw: impl Into<String>) -> Result<Self, IdentityError> {
        let s = raw.into();
        check(&s)?;
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validator identity: the 32-byte Ed25519 public key its signatures verify against.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ValidatorId([u8; 32]);

impl ValidatorId {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_public_key(key: &PublicKey) -> Self {
        Self(key.0)
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn from_hex(s: &str) -> Result<Self, IdentityError> {
        crate::hash::Hash256::from_hex(s)
            .map(|h| Self(*h.as_bytes()))
            .ok_or(IdentityError::BadValidatorHex)
    }
}

impl fmt::Debug for ValidatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValidatorId({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for ValidatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}
