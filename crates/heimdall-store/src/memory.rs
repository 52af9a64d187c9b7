//! In-memory identity store.
//!
//! One instance carries all three namespaces of a single organization
//! scope: the global user namespace, the org's clients, and the org's
//! groups. Uses DashMap so a shared instance serves concurrent
//! resolvers without external locking.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use heimdall_domain::error::DomainResult;
use heimdall_domain::model::AuthzId;
use heimdall_domain::resolver::{ClientStore, GroupStore, IdentityRecord, UserStore};

#[derive(Debug, Default)]
struct Namespace {
    by_name: DashMap<String, AuthzId>,
    by_id: DashMap<AuthzId, String>,
}

impl Namespace {
    fn insert(&self, name: &str, id: AuthzId) {
        self.by_name.insert(name.to_string(), id.clone());
        self.by_id.insert(id, name.to_string());
    }

    fn find_by_names(&self, names: &[String]) -> Vec<IdentityRecord> {
        names
            .iter()
            .filter_map(|name| {
                self.by_name
                    .get(name)
                    .map(|entry| IdentityRecord::new(name.clone(), entry.value().clone()))
            })
            .collect()
    }

    fn find_by_ids(&self, ids: &[AuthzId]) -> Vec<IdentityRecord> {
        ids.iter()
            .filter_map(|id| {
                self.by_id
                    .get(id)
                    .map(|entry| IdentityRecord::new(entry.value().clone(), id.clone()))
            })
            .collect()
    }
}

/// In-memory implementation of all three identity-store traits.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    org: String,
    users: Namespace,
    clients: Namespace,
    groups: Namespace,
}

impl MemoryIdentityStore {
    /// Creates a store scoped to the named organization.
    pub fn new(org: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            ..Self::default()
        }
    }

    /// Creates a store wrapped in Arc, ready to share across the three
    /// resolver seams.
    pub fn new_shared(org: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::new(org))
    }

    /// The organization this store's client and group namespaces are
    /// scoped to.
    pub fn org(&self) -> &str {
        &self.org
    }

    pub fn add_user(&self, name: &str, id: AuthzId) {
        self.users.insert(name, id);
    }

    pub fn add_client(&self, name: &str, id: AuthzId) {
        self.clients.insert(name, id);
    }

    pub fn add_group(&self, name: &str, id: AuthzId) {
        self.groups.insert(name, id);
    }
}

#[async_trait]
impl UserStore for MemoryIdentityStore {
    async fn find_by_names(&self, names: &[String]) -> DomainResult<Vec<IdentityRecord>> {
        Ok(self.users.find_by_names(names))
    }

    async fn find_by_authz_ids(&self, ids: &[AuthzId]) -> DomainResult<Vec<IdentityRecord>> {
        Ok(self.users.find_by_ids(ids))
    }
}

#[async_trait]
impl ClientStore for MemoryIdentityStore {
    async fn find_by_names(&self, names: &[String]) -> DomainResult<Vec<IdentityRecord>> {
        Ok(self.clients.find_by_names(names))
    }

    async fn find_by_authz_ids(&self, ids: &[AuthzId]) -> DomainResult<Vec<IdentityRecord>> {
        Ok(self.clients.find_by_ids(ids))
    }
}

#[async_trait]
impl GroupStore for MemoryIdentityStore {
    async fn find_by_names(&self, names: &[String]) -> DomainResult<Vec<IdentityRecord>> {
        Ok(self.groups.find_by_names(names))
    }

    async fn find_by_authz_ids(&self, ids: &[AuthzId]) -> DomainResult<Vec<IdentityRecord>> {
        Ok(self.groups.find_by_ids(ids))
    }
}
