//! Identity resolution between user-facing names and authz-side ids.
//!
//! The resolver batches lookups wherever the stores permit it and
//! funnels every successful resolution through the [`IdentityCache`],
//! so a cache hit never touches a store. The two directions have
//! deliberately different failure contracts:
//!
//! - ids → names is a display path: ids that resolve to nothing are
//!   dropped with a warning, never an error.
//! - names → ids is a write path: any name that resolves to nothing
//!   fails the whole batch with `UnknownActor`/`UnknownGroup`, naming
//!   every unmatched entry at once.
//!
//! Members resolved successfully before a batch-level failure stay
//! cached (partial caching); store-level failures abort the batch with
//! no cache writes for that lookup.

mod cache;
mod traits;

#[cfg(test)]
pub(crate) mod tests;

pub use cache::IdentityCache;
pub use traits::{ClientStore, GroupStore, IdentityRecord, UserStore};

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, instrument, warn};

use crate::error::{DomainError, DomainResult};
use crate::model::{Actor, ActorKind, AuthzId};

/// Configuration for the identity resolver.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Bounded timeout applied to each store lookup.
    pub store_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_secs(5),
        }
    }
}

impl ResolverConfig {
    /// Sets the per-lookup store timeout.
    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }
}

/// Actor names resolved from authz ids, split by namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedActorNames {
    pub users: Vec<String>,
    pub clients: Vec<String>,
}

impl ResolvedActorNames {
    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.clients.is_empty()
    }
}

/// Translates between user-facing names and authz ids for actors and
/// groups, caching every successful resolution.
pub struct IdentityResolver<U, C, G> {
    users: Arc<U>,
    clients: Arc<C>,
    groups: Arc<G>,
    cache: IdentityCache,
    config: ResolverConfig,
}

impl<U, C, G> IdentityResolver<U, C, G>
where
    U: UserStore,
    C: ClientStore,
    G: GroupStore,
{
    pub fn new(users: Arc<U>, clients: Arc<C>, groups: Arc<G>) -> Self {
        Self {
            users,
            clients,
            groups,
            cache: IdentityCache::new(),
            config: ResolverConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn cache(&self) -> &IdentityCache {
        &self.cache
    }

    /// Applies the bounded store timeout to one lookup future.
    async fn bounded<T>(
        &self,
        operation: &str,
        fut: impl Future<Output = DomainResult<T>>,
    ) -> DomainResult<T> {
        match timeout(self.config.store_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(DomainError::ResolutionFailed {
                message: format!(
                    "{operation} timed out after {}ms",
                    self.config.store_timeout.as_millis()
                ),
            }),
        }
    }

    /// Resolves actor authz ids to names, split into users and clients.
    ///
    /// Display path: ids resolving to neither namespace are dropped
    /// with a warning. Both namespace lookups for the cache misses are
    /// issued concurrently; a user match takes precedence if the same
    /// id somehow answers in both.
    #[instrument(skip_all, fields(requested = ids.len()))]
    pub async fn resolve_actor_ids_to_names(
        &self,
        ids: &[AuthzId],
    ) -> DomainResult<ResolvedActorNames> {
        let mut resolved = ResolvedActorNames::default();
        let mut misses = Vec::new();
        let mut seen = HashSet::new();
        for id in ids {
            if !seen.insert(id.clone()) {
                continue;
            }
            match self.cache.actor_by_id(id) {
                Some(actor) => match actor.kind {
                    ActorKind::User => resolved.users.push(actor.name),
                    ActorKind::Client => resolved.clients.push(actor.name),
                },
                None => misses.push(id.clone()),
            }
        }
        if misses.is_empty() {
            debug!("actor id batch served entirely from cache");
            return Ok(resolved);
        }

        let (user_records, client_records) = tokio::join!(
            self.bounded(
                "user lookup by authz id",
                self.users.find_by_authz_ids(&misses)
            ),
            self.bounded(
                "client lookup by authz id",
                self.clients.find_by_authz_ids(&misses)
            ),
        );
        let user_records = user_records?;
        let client_records = client_records?;

        let mut matched = HashSet::new();
        for record in user_records {
            if !matched.insert(record.authz_id.clone()) {
                continue;
            }
            self.cache
                .insert_actor(Actor::user(record.name.clone(), record.authz_id));
            resolved.users.push(record.name);
        }
        for record in client_records {
            if !matched.insert(record.authz_id.clone()) {
                continue;
            }
            self.cache
                .insert_actor(Actor::client(record.name.clone(), record.authz_id));
            resolved.clients.push(record.name);
        }
        for id in &misses {
            if !matched.contains(id) {
                warn!(authz_id = %id, "dropping authz id that is neither a user nor a client");
            }
        }
        Ok(resolved)
    }

    /// Resolves actor names to authz ids.
    ///
    /// Write path: every name must match a user or a client; unmatched
    /// names fail the batch with `UnknownActor` naming all of them.
    #[instrument(skip_all, fields(requested = names.len()))]
    pub async fn resolve_actor_names_to_ids(&self, names: &[String]) -> DomainResult<Vec<AuthzId>> {
        let mut ids = Vec::new();
        let mut misses = Vec::new();
        let mut seen = HashSet::new();
        for name in names {
            if !seen.insert(name.clone()) {
                continue;
            }
            match self.cache.actor_id_by_name(name) {
                Some(id) => ids.push(id),
                None => misses.push(name.clone()),
            }
        }
        if misses.is_empty() {
            debug!("actor name batch served entirely from cache");
            return Ok(ids);
        }

        let (user_records, client_records) = tokio::join!(
            self.bounded("user lookup by name", self.users.find_by_names(&misses)),
            self.bounded("client lookup by name", self.clients.find_by_names(&misses)),
        );
        let user_records = user_records?;
        let client_records = client_records?;

        let mut by_name: HashMap<String, AuthzId> = HashMap::new();
        for record in user_records {
            if by_name.contains_key(&record.name) {
                continue;
            }
            by_name.insert(record.name.clone(), record.authz_id.clone());
            self.cache
                .insert_actor(Actor::user(record.name, record.authz_id));
        }
        for record in client_records {
            // A username shadows a client of the same name.
            if by_name.contains_key(&record.name) {
                continue;
            }
            by_name.insert(record.name.clone(), record.authz_id.clone());
            self.cache
                .insert_actor(Actor::client(record.name, record.authz_id));
        }

        let unmatched: Vec<String> = misses
            .iter()
            .filter(|name| !by_name.contains_key(*name))
            .cloned()
            .collect();
        if !unmatched.is_empty() {
            // Members resolved above stay cached; only the batch result
            // is rejected.
            return Err(DomainError::UnknownActor { names: unmatched });
        }

        for name in &misses {
            if let Some(id) = by_name.get(name) {
                ids.push(id.clone());
            }
        }
        Ok(ids)
    }

    /// Resolves group authz ids to names, dropping unresolvable ids.
    #[instrument(skip_all, fields(requested = ids.len()))]
    pub async fn resolve_group_ids_to_names(&self, ids: &[AuthzId]) -> DomainResult<Vec<String>> {
        let mut names = Vec::new();
        let mut misses = Vec::new();
        let mut seen = HashSet::new();
        for id in ids {
            if !seen.insert(id.clone()) {
                continue;
            }
            match self.cache.group_name_by_id(id) {
                Some(name) => names.push(name),
                None => misses.push(id.clone()),
            }
        }
        if misses.is_empty() {
            return Ok(names);
        }

        let records = self
            .bounded(
                "group lookup by authz id",
                self.groups.find_by_authz_ids(&misses),
            )
            .await?;

        let mut matched = HashSet::new();
        for record in records {
            if !matched.insert(record.authz_id.clone()) {
                continue;
            }
            self.cache
                .insert_group(record.name.clone(), record.authz_id);
            names.push(record.name);
        }
        for id in &misses {
            if !matched.contains(id) {
                warn!(authz_id = %id, "dropping authz id that matches no group");
            }
        }
        Ok(names)
    }

    /// Resolves group names to authz ids; unmatched names fail the
    /// batch with `UnknownGroup` naming all of them.
    #[instrument(skip_all, fields(requested = names.len()))]
    pub async fn resolve_group_names_to_ids(&self, names: &[String]) -> DomainResult<Vec<AuthzId>> {
        let mut ids = Vec::new();
        let mut misses = Vec::new();
        let mut seen = HashSet::new();
        for name in names {
            if !seen.insert(name.clone()) {
                continue;
            }
            match self.cache.group_id_by_name(name) {
                Some(id) => ids.push(id),
                None => misses.push(name.clone()),
            }
        }
        if misses.is_empty() {
            return Ok(ids);
        }

        let records = self
            .bounded("group lookup by name", self.groups.find_by_names(&misses))
            .await?;

        let mut by_name: HashMap<String, AuthzId> = HashMap::new();
        for record in records {
            if by_name.contains_key(&record.name) {
                continue;
            }
            by_name.insert(record.name.clone(), record.authz_id.clone());
            self.cache.insert_group(record.name, record.authz_id);
        }

        let unmatched: Vec<String> = misses
            .iter()
            .filter(|name| !by_name.contains_key(*name))
            .cloned()
            .collect();
        if !unmatched.is_empty() {
            return Err(DomainError::UnknownGroup { names: unmatched });
        }

        for name in &misses {
            if let Some(id) = by_name.get(name) {
                ids.push(id.clone());
            }
        }
        Ok(ids)
    }
}
