//! Database schema migration engine.
//!
//! Tracks a monotonically increasing schema version in the meta database and runs
//! sequential migration steps to bring an older database up to date.

use tally_store::MetaStore;

use crate::LmdbError;

/// The schema version that the current code expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

pub struct Migrator;

impl Migrator {
    /// Check the stored schema version and run any needed migrations.
    ///
    /// Version 0 is a fresh database. A stored version higher than
    /// [`CURRENT_SCHEMA_VERSION`] was written by newer code and is refused.
    pub fn run(meta_store: &impl MetaStore) -> Result<(), LmdbError> {
        let current = meta_store.get_schema_version()?;

        if current == CURRENT_SCHEMA_VERSION {
            tracing::debug!(version = current, "database schema is up to date");
            return Ok(());
        }

        if current > CURRENT_SCHEMA_VERSION {
            return Err(LmdbError::SchemaTooNew {
                found: current,
                supported: CURRENT_SCHEMA_VERSION,
            });
        }

        for version in current..CURRENT_SCHEMA_VERSION {
            tracing::info!(from = version, to = version + 1, "running migration");
            run_migration(version, version + 1)?;
        }

        meta_store.set_schema_version(CURRENT_SCHEMA_VERSION)?;
        tracing::info!(version = CURRENT_SCHEMA_VERSION, "migration complete");
        Ok(())
    }
}

fn run_migration(from: u32, to: u32) -> Result<(), LmdbError> {
    match (from, to) {
        // Initial schema, nothing to carry over.
        (0, 1) => Ok(()),
        _ => Err(LmdbError::UnknownMigration { from, to }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LmdbEnvironment, DEFAULT_MAP_SIZE};

    #[test]
    fn unknown_migration_is_error() {
        assert!(matches!(
            run_migration(99, 100),
            Err(LmdbError::UnknownMigration { from: 99, to: 100 })
        ));
    }

    #[test]
    fn newer_schema_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = LmdbEnvironment::open(dir.path(), DEFAULT_MAP_SIZE).unwrap();
            store.set_schema_version(CURRENT_SCHEMA_VERSION + 1).unwrap();
        }
        assert!(matches!(
            LmdbEnvironment::open(dir.path(), DEFAULT_MAP_SIZE),
            Err(LmdbError::SchemaTooNew { .. })
        ));
    }
}
