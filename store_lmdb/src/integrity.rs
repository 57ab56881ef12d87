//! LMDB database integrity checks.
//!
//! Run on startup to detect corruption before the node replays any state.

use std::path::Path;

use heed::types::Bytes;

use crate::environment::DATABASES;
use crate::{LmdbEnvironment, LmdbError};

/// Summary of an integrity check run.
#[derive(Debug, Default)]
pub struct IntegrityReport {
    pub databases_checked: u32,
    pub total_entries: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Open each known database and count its entries. Read failures are collected in the
/// report rather than aborting the check.
pub fn check_integrity(store: &LmdbEnvironment) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport::default();
    let env = store.env();
    let rtxn = env.read_txn()?;

    for &name in DATABASES {
        match env.open_database::<Bytes, Bytes>(&rtxn, Some(name)) {
            Ok(Some(db)) => {
                report.databases_checked += 1;
                match db.len(&rtxn) {
                    Ok(count) => report.total_entries += count,
                    Err(e) => report
                        .errors
                        .push(format!("failed to read database '{name}': {e}")),
                }
            }
            Ok(None) => report.errors.push(format!("database '{name}' is missing")),
            Err(e) => report
                .errors
                .push(format!("failed to open database '{name}': {e}")),
        }
    }

    Ok(report)
}

/// Refuse a data directory that holds files but no `data.mdb`.
///
/// A missing or empty directory is a fresh start.
pub(crate) fn check_data_dir(path: &Path) -> Result<(), LmdbError> {
    if !path.exists() {
        return Ok(());
    }
    if path.join("data.mdb").exists() {
        return Ok(());
    }
    let is_empty = std::fs::read_dir(path)?.next().is_none();
    if is_empty {
        Ok(())
    } else {
        Err(LmdbError::Corruption(format!(
            "{} is not empty but data.mdb is missing",
            path.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_MAP_SIZE;

    #[test]
    fn fresh_store_is_healthy() {
        let dir = tempfile::tempdir().unwrap();
        let store = LmdbEnvironment::open(dir.path(), DEFAULT_MAP_SIZE).unwrap();
        let report = check_integrity(&store).unwrap();
        assert!(report.is_healthy(), "{:?}", report.errors);
        assert_eq!(report.databases_checked as usize, DATABASES.len());
    }

    #[test]
    fn foreign_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"hello").unwrap();
        assert!(matches!(
            check_data_dir(dir.path()),
            Err(LmdbError::Corruption(_))
        ));
    }
}
