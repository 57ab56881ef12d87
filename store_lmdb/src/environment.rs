//! LMDB environment setup and shared read helpers.

use std::ops::Bound;
use std::path::{Path, PathBuf};

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions, RoTxn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::integrity::check_data_dir;
use crate::keys::increment_prefix;
use crate::migration::Migrator;
use crate::write_batch::WriteBatch;
use crate::LmdbError;

/// Default LMDB map size: 1 GiB.
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;

const MAX_DBS: u32 = 16;

/// Database names, in creation order.
pub(crate) const DATABASES: &[&str] = &[
    "candidates",
    "votes",
    "ledger_state",
    "constituency_results",
    "batches",
    "division_results",
    "national",
    "audit",
    "validator_sets",
    "validator_history",
    "meta",
];

/// The LMDB environment and one database handle per record family.
pub struct LmdbEnvironment {
    env: Env,
    path: PathBuf,
    pub(crate) candidates_db: Database<Bytes, Bytes>,
    pub(crate) votes_db: Database<Bytes, Bytes>,
    pub(crate) ledger_state_db: Database<Bytes, Bytes>,
    pub(crate) constituency_db: Database<Bytes, Bytes>,
    pub(crate) batches_db: Database<Bytes, Bytes>,
    pub(crate) divisions_db: Database<Bytes, Bytes>,
    pub(crate) national_db: Database<Bytes, Bytes>,
    pub(crate) audit_db: Database<Bytes, Bytes>,
    pub(crate) validator_sets_db: Database<Bytes, Bytes>,
    pub(crate) validator_history_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an environment in the directory `path`, then bring its schema up
    /// to date.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        check_data_dir(path)?;
        std::fs::create_dir_all(path)?;

        // SAFETY: the directory is opened at most once per process; the node owns the
        // only handle.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let mut create = |name: &str| env.create_database::<Bytes, Bytes>(&mut wtxn, Some(name));
        let candidates_db = create("candidates")?;
        let votes_db = create("votes")?;
        let ledger_state_db = create("ledger_state")?;
        let constituency_db = create("constituency_results")?;
        let batches_db = create("batches")?;
        let divisions_db = create("division_results")?;
        let national_db = create("national")?;
        let audit_db = create("audit")?;
        let validator_sets_db = create("validator_sets")?;
        let validator_history_db = create("validator_history")?;
        let meta_db = create("meta")?;
        wtxn.commit()?;

        let this = Self {
            env,
            path: path.to_path_buf(),
            candidates_db,
            votes_db,
            ledger_state_db,
            constituency_db,
            batches_db,
            divisions_db,
            national_db,
            audit_db,
            validator_sets_db,
            validator_history_db,
            meta_db,
        };

        Migrator::run(&this)?;
        tracing::info!(path = %path.display(), map_size, "opened LMDB environment");
        Ok(this)
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Begin a write batch. Nothing is visible until [`WriteBatch::commit`].
    pub fn write_batch(&self) -> Result<WriteBatch<'_>, LmdbError> {
        WriteBatch::new(self)
    }

    /// Write one encoded value in its own transaction.
    pub(crate) fn put_value<T: Serialize>(
        &self,
        db: Database<Bytes, Bytes>,
        key: &[u8],
        value: &T,
    ) -> Result<(), LmdbError> {
        let bytes = bincode::serialize(value)?;
        let mut wtxn = self.env.write_txn()?;
        db.put(&mut wtxn, key, &bytes)?;
        wtxn.commit()?;
        Ok(())
    }

    pub(crate) fn get_value<T: DeserializeOwned>(
        &self,
        db: Database<Bytes, Bytes>,
        key: &[u8],
    ) -> Result<Option<T>, LmdbError> {
        let rtxn = self.env.read_txn()?;
        let value = decode_opt(db.get(&rtxn, key)?)?;
        Ok(value)
    }

    /// Decode every value whose key starts with `prefix`, in key order.
    pub(crate) fn scan_prefix<T: DeserializeOwned>(
        &self,
        db: Database<Bytes, Bytes>,
        prefix: &[u8],
    ) -> Result<Vec<T>, LmdbError> {
        let rtxn = self.env.read_txn()?;
        scan_prefix_in(&rtxn, db, prefix)
    }

    /// Decode every value in `db`, in key order.
    pub(crate) fn scan_all<T: DeserializeOwned>(
        &self,
        db: Database<Bytes, Bytes>,
    ) -> Result<Vec<T>, LmdbError> {
        let rtxn = self.env.read_txn()?;
        let mut out = Vec::new();
        for entry in db.iter(&rtxn)? {
            let (_key, val) = entry?;
            out.push(bincode::deserialize(val)?);
        }
        Ok(out)
    }
}

pub(crate) fn decode_opt<T: DeserializeOwned>(raw: Option<&[u8]>) -> Result<Option<T>, LmdbError> {
    raw.map(|bytes| bincode::deserialize(bytes).map_err(LmdbError::from))
        .transpose()
}

pub(crate) fn scan_prefix_in<T: DeserializeOwned>(
    rtxn: &RoTxn,
    db: Database<Bytes, Bytes>,
    prefix: &[u8],
) -> Result<Vec<T>, LmdbError> {
    let mut upper = prefix.to_vec();
    let upper_bound = if increment_prefix(&mut upper) {
        Bound::Excluded(upper.as_slice())
    } else {
        Bound::Unbounded
    };
    let bounds = (Bound::Included(prefix), upper_bound);
    let mut out = Vec::new();
    for entry in db.range(rtxn, &bounds)? {
        let (_key, val) = entry?;
        out.push(bincode::deserialize(val)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_store::MetaStore;

    #[test]
    fn open_creates_directory_and_stamps_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db");
        let env = LmdbEnvironment::open(&path, DEFAULT_MAP_SIZE).unwrap();
        assert!(path.join("data.mdb").exists());
        assert_eq!(
            env.get_schema_version().unwrap(),
            crate::CURRENT_SCHEMA_VERSION
        );
    }
}
