//! Traits for the local identity stores consumed by the resolver.
//!
//! The user namespace is global; client stores are scoped to one
//! organization at construction. Every lookup is a batch call: an empty
//! input must return an empty result without touching the backend.

use async_trait::async_trait;

use crate::error::DomainResult;
use crate::model::AuthzId;

/// One name/id association returned by a store lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRecord {
    pub name: String,
    pub authz_id: AuthzId,
}

impl IdentityRecord {
    pub fn new(name: impl Into<String>, authz_id: AuthzId) -> Self {
        Self {
            name: name.into(),
            authz_id,
        }
    }
}

/// Batch lookups against the global user namespace.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Returns the records whose names appear in `names`. Names with no
    /// record are simply absent from the result, never an error.
    async fn find_by_names(&self, names: &[String]) -> DomainResult<Vec<IdentityRecord>>;

    /// Returns the records whose authz ids appear in `ids`.
    async fn find_by_authz_ids(&self, ids: &[AuthzId]) -> DomainResult<Vec<IdentityRecord>>;
}

/// Batch lookups against one organization's client namespace.
#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn find_by_names(&self, names: &[String]) -> DomainResult<Vec<IdentityRecord>>;

    async fn find_by_authz_ids(&self, ids: &[AuthzId]) -> DomainResult<Vec<IdentityRecord>>;
}

/// Batch lookups against one organization's group namespace.
#[async_trait]
pub trait GroupStore: Send + Sync {
    async fn find_by_names(&self, names: &[String]) -> DomainResult<Vec<IdentityRecord>>;

    async fn find_by_authz_ids(&self, ids: &[AuthzId]) -> DomainResult<Vec<IdentityRecord>>;
}
