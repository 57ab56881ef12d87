use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tally_store::{ValidatorRecord, ValidatorSet, ValidatorStore};
use tally_types::{AccountId, Clock, ValidatorId, ValidatorScope};

use crate::error::AuthorityError;

/// Administrators and initial thresholds of both validator scopes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityConfig {
    pub division_admins: BTreeSet<AccountId>,
    pub national_admins: BTreeSet<AccountId>,
    /// Threshold used when the division set is first created.
    pub division_threshold: u32,
    /// Threshold used when the national set is first created.
    pub national_threshold: u32,
}

impl AuthorityConfig {
    fn admins(&self, scope: ValidatorScope) -> &BTreeSet<AccountId> {
        match scope {
            ValidatorScope::Division => &self.division_admins,
            ValidatorScope::National => &self.national_admins,
        }
    }

    fn initial_threshold(&self, scope: ValidatorScope) -> u32 {
        match scope {
            ValidatorScope::Division => self.division_threshold,
            ValidatorScope::National => self.national_threshold,
        }
    }
}

/// Events emitted by the authority for the node to process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthorityEvent {
    ValidatorAuthorized {
        scope: ValidatorScope,
        validator: ValidatorId,
        version: u64,
    },
    ValidatorRevoked {
        scope: ValidatorScope,
        validator: ValidatorId,
        version: u64,
    },
    ThresholdChanged {
        scope: ValidatorScope,
        required: u32,
        version: u64,
    },
}

pub struct ValidatorAuthority<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    sets: BTreeMap<ValidatorScope, ValidatorSet>,
    pending_events: Vec<AuthorityEvent>,
}

impl<S: ValidatorStore> ValidatorAuthority<S> {
    /// Load the latest set of each scope, creating version 0 for a scope the store has
    /// never seen. Administrators always come from `config`; a change to them is stored
    /// as a new version.
    pub fn open(
        config: &AuthorityConfig,
        store: Arc<S>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AuthorityError> {
        let now = clock.now();
        let mut sets = BTreeMap::new();

        for scope in ValidatorScope::ALL {
            let admins = config.admins(scope).clone();
            let set = match store.get_validator_set(scope)? {
                Some(set) if set.admins == admins => set,
                Some(set) => {
                    let updated = ValidatorSet {
                        version: set.version + 1,
                        admins,
                        updated_at: now,
                        ..set
                    };
                    store.put_validator_set(&updated)?;
                    tracing::info!(%scope, version = updated.version, "validator admins updated from config");
                    updated
                }
                None => {
                    let threshold = config.initial_threshold(scope);
                    if threshold == 0 {
                        return Err(AuthorityError::InvalidThreshold {
                            requested: 0,
                            active: 0,
                        });
                    }
                    let genesis = ValidatorSet::genesis(scope, threshold, admins, now);
                    store.put_validator_set(&genesis)?;
                    tracing::info!(%scope, threshold, "validator set created");
                    genesis
                }
            };
            sets.insert(scope, set);
        }

        Ok(Self {
            store,
            clock,
            sets,
            pending_events: Vec::new(),
        })
    }

    /// The current version of `scope`'s set.
    pub fn snapshot(&self, scope: ValidatorScope) -> &ValidatorSet {
        // `open` fills every scope.
        &self.sets[&scope]
    }

    /// A historical version of `scope`'s set, read from the store.
    pub fn snapshot_at(
        &self,
        scope: ValidatorScope,
        version: u64,
    ) -> Result<Option<ValidatorSet>, AuthorityError> {
        Ok(self.store.get_validator_set_version(scope, version)?)
    }

    pub fn version(&self, scope: ValidatorScope) -> u64 {
        self.snapshot(scope).version
    }

    pub fn required_signatures(&self, scope: ValidatorScope) -> u32 {
        self.snapshot(scope).required_signatures
    }

    pub fn is_active(&self, scope: ValidatorScope, id: &ValidatorId) -> bool {
        self.snapshot(scope).is_active(id)
    }

    pub fn active_validators(&self, scope: ValidatorScope) -> Vec<ValidatorId> {
        self.snapshot(scope).active_validators()
    }

    pub fn is_admin(&self, scope: ValidatorScope, caller: &AccountId) -> bool {
        self.snapshot(scope).admins.contains(caller)
    }

    /// Whether the distinct signers that are active validators of `scope` right now meet
    /// its threshold.
    pub fn is_quorum_reached(&self, scope: ValidatorScope, signers: &[ValidatorId]) -> bool {
        let set = self.snapshot(scope);
        let distinct: BTreeSet<&ValidatorId> = signers.iter().collect();
        let active = distinct.into_iter().filter(|id| set.is_active(id)).count();
        active >= set.required_signatures as usize
    }

    fn require_admin(&self, scope: ValidatorScope, caller: &AccountId) -> Result<(), AuthorityError> {
        if !self.is_admin(scope, caller) {
            tracing::debug!(%scope, %caller, "rejected non-admin validator change");
            return Err(AuthorityError::Unauthorized {
                caller: caller.clone(),
                scope,
            });
        }
        Ok(())
    }

    /// Persist `next` as a new version and make it current.
    fn commit(&mut self, mut next: ValidatorSet) -> Result<u64, AuthorityError> {
        next.version = self.version(next.scope) + 1;
        next.updated_at = self.clock.now();
        self.store.put_validator_set(&next)?;
        let version = next.version;
        self.sets.insert(next.scope, next);
        Ok(version)
    }

    /// Authorize `id` for `scope`, or re-activate it after a revocation.
    pub fn authorize(
        &mut self,
        caller: &AccountId,
        id: ValidatorId,
        scope: ValidatorScope,
    ) -> Result<u64, AuthorityError> {
        self.require_admin(scope, caller)?;
        if self.is_active(scope, &id) {
            return Err(AuthorityError::AlreadyAuthorized {
                validator: id,
                scope,
            });
        }

        let mut next = self.snapshot(scope).clone();
        next.validators.insert(
            id,
            ValidatorRecord {
                id,
                active: true,
                authorized_at: self.clock.now(),
                revoked_at: None,
            },
        );
        let version = self.commit(next)?;

        tracing::info!(%scope, validator = %id, version, "validator authorized");
        self.pending_events.push(AuthorityEvent::ValidatorAuthorized {
            scope,
            validator: id,
            version,
        });
        Ok(version)
    }

    /// Revoke `id`. The threshold is left as it is, even if it now exceeds the active count.
    pub fn revoke(
        &mut self,
        caller: &AccountId,
        id: ValidatorId,
        scope: ValidatorScope,
    ) -> Result<u64, AuthorityError> {
        self.require_admin(scope, caller)?;
        let mut next = self.snapshot(scope).clone();
        let now = self.clock.now();
        match next.validators.get_mut(&id) {
            Some(record) if record.active => {
                record.active = false;
                record.revoked_at = Some(now);
            }
            _ => {
                return Err(AuthorityError::NotAValidator {
                    validator: id,
                    scope,
                })
            }
        }
        let version = self.commit(next)?;

        let set = self.snapshot(scope);
        if set.active_count() < set.required_signatures as usize {
            tracing::warn!(
                %scope,
                active = set.active_count(),
                required = set.required_signatures,
                "quorum unreachable until more validators are authorized"
            );
        }
        tracing::info!(%scope, validator = %id, version, "validator revoked");
        self.pending_events.push(AuthorityEvent::ValidatorRevoked {
            scope,
            validator: id,
            version,
        });
        Ok(version)
    }

    pub fn set_required_signatures(
        &mut self,
        caller: &AccountId,
        scope: ValidatorScope,
        required: u32,
    ) -> Result<u64, AuthorityError> {
        self.require_admin(scope, caller)?;
        let active = self.snapshot(scope).active_count();
        if required == 0 || required as usize > active {
            return Err(AuthorityError::InvalidThreshold {
                requested: required,
                active,
            });
        }

        let mut next = self.snapshot(scope).clone();
        next.required_signatures = required;
        let version = self.commit(next)?;

        tracing::info!(%scope, required, version, "signature threshold changed");
        self.pending_events.push(AuthorityEvent::ThresholdChanged {
            scope,
            required,
            version,
        });
        Ok(version)
    }

    /// Drain all pending events.
    pub fn drain_events(&mut self) -> Vec<AuthorityEvent> {
        std::mem::take(&mut self.pending_events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_nullables::{NullClock, NullStore};

    fn admin() -> AccountId {
        AccountId::new("electoral-commission").unwrap()
    }

    fn config() -> AuthorityConfig {
        AuthorityConfig {
            division_admins: BTreeSet::from([admin()]),
            national_admins: BTreeSet::from([admin()]),
            division_threshold: 2,
            national_threshold: 2,
        }
    }

    fn validator(n: u8) -> ValidatorId {
        ValidatorId::new([n; 32])
    }

    fn authority(store: Arc<NullStore>) -> ValidatorAuthority<NullStore> {
        ValidatorAuthority::open(&config(), store, Arc::new(NullClock::new(10))).unwrap()
    }

    #[test]
    fn non_admin_cannot_authorize() {
        let mut auth = authority(Arc::new(NullStore::new()));
        let err = auth
            .authorize(&AccountId::new("mallory").unwrap(), validator(1), ValidatorScope::Division)
            .unwrap_err();
        assert!(matches!(err, AuthorityError::Unauthorized { .. }));
        assert_eq!(auth.version(ValidatorScope::Division), 0);
    }

    #[test]
    fn scopes_are_independent() {
        let mut auth = authority(Arc::new(NullStore::new()));
        auth.authorize(&admin(), validator(1), ValidatorScope::Division)
            .unwrap();
        assert!(auth.is_active(ValidatorScope::Division, &validator(1)));
        assert!(!auth.is_active(ValidatorScope::National, &validator(1)));
    }

    #[test]
    fn redundant_changes_rejected() {
        let mut auth = authority(Arc::new(NullStore::new()));
        auth.authorize(&admin(), validator(1), ValidatorScope::National)
            .unwrap();
        assert!(matches!(
            auth.authorize(&admin(), validator(1), ValidatorScope::National),
            Err(AuthorityError::AlreadyAuthorized { .. })
        ));
        assert!(matches!(
            auth.revoke(&admin(), validator(2), ValidatorScope::National),
            Err(AuthorityError::NotAValidator { .. })
        ));
    }

    #[test]
    fn threshold_bounded_by_active_count() {
        let mut auth = authority(Arc::new(NullStore::new()));
        for n in 1..=2 {
            auth.authorize(&admin(), validator(n), ValidatorScope::Division)
                .unwrap();
        }
        assert!(matches!(
            auth.set_required_signatures(&admin(), ValidatorScope::Division, 0),
            Err(AuthorityError::InvalidThreshold { requested: 0, .. })
        ));
        assert!(matches!(
            auth.set_required_signatures(&admin(), ValidatorScope::Division, 3),
            Err(AuthorityError::InvalidThreshold { requested: 3, active: 2 })
        ));
        auth.set_required_signatures(&admin(), ValidatorScope::Division, 1)
            .unwrap();
        assert_eq!(auth.required_signatures(ValidatorScope::Division), 1);
    }

    #[test]
    fn quorum_counts_distinct_active_signers() {
        let mut auth = authority(Arc::new(NullStore::new()));
        for n in 1..=3 {
            auth.authorize(&admin(), validator(n), ValidatorScope::Division)
                .unwrap();
        }
        let scope = ValidatorScope::Division;
        assert!(!auth.is_quorum_reached(scope, &[validator(1)]));
        assert!(!auth.is_quorum_reached(scope, &[validator(1), validator(1)]));
        assert!(!auth.is_quorum_reached(scope, &[validator(1), validator(9)]));
        assert!(auth.is_quorum_reached(scope, &[validator(1), validator(2)]));

        // Revoking a signer drops quorum even though the signer list is unchanged.
        auth.revoke(&admin(), validator(2), scope).unwrap();
        assert!(!auth.is_quorum_reached(scope, &[validator(1), validator(2)]));
        assert!(auth.is_quorum_reached(scope, &[validator(1), validator(2), validator(3)]));
    }

    #[test]
    fn revocation_keeps_threshold() {
        let mut auth = authority(Arc::new(NullStore::new()));
        let scope = ValidatorScope::National;
        auth.authorize(&admin(), validator(1), scope).unwrap();
        auth.authorize(&admin(), validator(2), scope).unwrap();
        auth.revoke(&admin(), validator(2), scope).unwrap();
        assert_eq!(auth.required_signatures(scope), 2);
        assert!(!auth.is_quorum_reached(scope, &[validator(1)]));
    }

    #[test]
    fn every_change_is_a_persisted_version() {
        let store = Arc::new(NullStore::new());
        let scope = ValidatorScope::Division;
        {
            let mut auth = authority(store.clone());
            assert_eq!(auth.authorize(&admin(), validator(1), scope).unwrap(), 1);
            assert_eq!(auth.revoke(&admin(), validator(1), scope).unwrap(), 2);
            assert_eq!(auth.authorize(&admin(), validator(1), scope).unwrap(), 3);
            let v2 = auth.snapshot_at(scope, 2).unwrap().unwrap();
            assert!(!v2.is_active(&validator(1)));
            assert!(v2.validators[&validator(1)].revoked_at.is_some());
        }
        let reopened = authority(store);
        assert_eq!(reopened.version(scope), 3);
        assert!(reopened.is_active(scope, &validator(1)));
    }

    #[test]
    fn zero_initial_threshold_refused() {
        let cfg = AuthorityConfig {
            national_threshold: 0,
            ..config()
        };
        let result = ValidatorAuthority::open(
            &cfg,
            Arc::new(NullStore::new()),
            Arc::new(NullClock::new(0)),
        );
        assert!(matches!(
            result,
            Err(AuthorityError::InvalidThreshold { requested: 0, .. })
        ));
    }
}
