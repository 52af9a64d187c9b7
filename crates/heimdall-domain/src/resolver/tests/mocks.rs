//! Mock identity stores for resolver testing.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::{DomainError, DomainResult};
use crate::model::AuthzId;
use crate::resolver::{ClientStore, GroupStore, IdentityRecord, UserStore};

/// In-memory store usable as any of the three namespaces, with call
/// counters so tests can assert batch and cache behavior.
#[derive(Default)]
pub struct MockIdentityStore {
    by_name: DashMap<String, AuthzId>,
    by_id: DashMap<AuthzId, String>,
    name_lookups: AtomicUsize,
    id_lookups: AtomicUsize,
    fail: AtomicBool,
}

impl MockIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, name: &str, id: &str) {
        let authz_id = AuthzId::new(id).unwrap();
        self.by_name.insert(name.to_string(), authz_id.clone());
        self.by_id.insert(authz_id, name.to_string());
    }

    /// Makes every subsequent lookup fail like a store outage.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn name_lookup_count(&self) -> usize {
        self.name_lookups.load(Ordering::SeqCst)
    }

    pub fn id_lookup_count(&self) -> usize {
        self.id_lookups.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> DomainResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DomainError::ResolutionFailed {
                message: "store unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn lookup_names(&self, names: &[String]) -> DomainResult<Vec<IdentityRecord>> {
        self.name_lookups.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(names
            .iter()
            .filter_map(|name| {
                self.by_name
                    .get(name)
                    .map(|entry| IdentityRecord::new(name.clone(), entry.value().clone()))
            })
            .collect())
    }

    fn lookup_ids(&self, ids: &[AuthzId]) -> DomainResult<Vec<IdentityRecord>> {
        self.id_lookups.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(ids
            .iter()
            .filter_map(|id| {
                self.by_id
                    .get(id)
                    .map(|entry| IdentityRecord::new(entry.value().clone(), id.clone()))
            })
            .collect())
    }
}

#[async_trait]
impl UserStore for MockIdentityStore {
    async fn find_by_names(&self, names: &[String]) -> DomainResult<Vec<IdentityRecord>> {
        self.lookup_names(names)
    }

    async fn find_by_authz_ids(&self, ids: &[AuthzId]) -> DomainResult<Vec<IdentityRecord>> {
        self.lookup_ids(ids)
    }
}

#[async_trait]
impl ClientStore for MockIdentityStore {
    async fn find_by_names(&self, names: &[String]) -> DomainResult<Vec<IdentityRecord>> {
        self.lookup_names(names)
    }

    async fn find_by_authz_ids(&self, ids: &[AuthzId]) -> DomainResult<Vec<IdentityRecord>> {
        self.lookup_ids(ids)
    }
}

#[async_trait]
impl GroupStore for MockIdentityStore {
    async fn find_by_names(&self, names: &[String]) -> DomainResult<Vec<IdentityRecord>> {
        self.lookup_names(names)
    }

    async fn find_by_authz_ids(&self, ids: &[AuthzId]) -> DomainResult<Vec<IdentityRecord>> {
        self.lookup_ids(ids)
    }
}
