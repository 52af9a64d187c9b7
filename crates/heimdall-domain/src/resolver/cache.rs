//! Name/id association cache, scoped to one resolver instance.
//!
//! Entries are added only after a successful resolution and are never
//! invalidated by this layer; staleness is an accepted tradeoff. The
//! maps are append-only/overwrite-by-key, so concurrent writers racing
//! on the same mapping write equal values and need no coordination
//! beyond the map's own atomic insert.

use dashmap::DashMap;

use crate::model::{Actor, ActorKind, AuthzId};

/// Per-resolver cache of actor and group identity associations.
#[derive(Default)]
pub struct IdentityCache {
    actor_ids_by_name: DashMap<String, AuthzId>,
    actors_by_id: DashMap<AuthzId, (ActorKind, String)>,
    group_ids_by_name: DashMap<String, AuthzId>,
    group_names_by_id: DashMap<AuthzId, String>,
}

impl std::fmt::Debug for IdentityCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityCache")
            .field("actor_entries", &self.actors_by_id.len())
            .field("group_entries", &self.group_names_by_id.len())
            .finish()
    }
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an actor association in both directions.
    pub fn insert_actor(&self, actor: Actor) {
        self.actor_ids_by_name
            .insert(actor.name.clone(), actor.authz_id.clone());
        self.actors_by_id
            .insert(actor.authz_id, (actor.kind, actor.name));
    }

    /// Records a group association in both directions.
    pub fn insert_group(&self, name: impl Into<String>, authz_id: AuthzId) {
        let name = name.into();
        self.group_ids_by_name.insert(name.clone(), authz_id.clone());
        self.group_names_by_id.insert(authz_id, name);
    }

    pub fn actor_id_by_name(&self, name: &str) -> Option<AuthzId> {
        self.actor_ids_by_name
            .get(name)
            .map(|entry| entry.value().clone())
    }

    pub fn actor_by_id(&self, id: &AuthzId) -> Option<Actor> {
        self.actors_by_id.get(id).map(|entry| {
            let (kind, name) = entry.value().clone();
            Actor {
                kind,
                name,
                authz_id: id.clone(),
            }
        })
    }

    pub fn group_id_by_name(&self, name: &str) -> Option<AuthzId> {
        self.group_ids_by_name
            .get(name)
            .map(|entry| entry.value().clone())
    }

    pub fn group_name_by_id(&self, id: &AuthzId) -> Option<String> {
        self.group_names_by_id
            .get(id)
            .map(|entry| entry.value().clone())
    }

    /// Number of cached actor associations.
    pub fn actor_entries(&self) -> usize {
        self.actors_by_id.len()
    }

    /// Number of cached group associations.
    pub fn group_entries(&self) -> usize {
        self.group_names_by_id.len()
    }
}
