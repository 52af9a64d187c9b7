//! ACL model: permission kinds, access control entries, and the
//! five-kind ACL with set semantics.
//!
//! An [`Acl`] always carries exactly one [`Ace`] per [`Permission`]; a
//! wire document missing a kind (or carrying an unrecognized one) is
//! rejected as malformed. Ace member lists are kept sorted and
//! deduplicated so that equality is set equality regardless of the order
//! members arrived in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{DomainError, DomainResult};
use crate::model::types::AuthzId;
use crate::resolver::{ClientStore, GroupStore, IdentityResolver, UserStore};

/// The five permission kinds of an ACL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Create,
    Read,
    Update,
    Delete,
    Grant,
}

impl Permission {
    /// All five kinds, in canonical order.
    pub const ALL: [Permission; 5] = [
        Permission::Create,
        Permission::Read,
        Permission::Update,
        Permission::Delete,
        Permission::Grant,
    ];

    /// Returns the wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Create => "create",
            Permission::Read => "read",
            Permission::Update => "update",
            Permission::Delete => "delete",
            Permission::Grant => "grant",
        }
    }

    fn index(&self) -> usize {
        match self {
            Permission::Create => 0,
            Permission::Read => 1,
            Permission::Update => 2,
            Permission::Delete => 3,
            Permission::Grant => 4,
        }
    }
}

impl FromStr for Permission {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "create" => Ok(Permission::Create),
            "read" => Ok(Permission::Read),
            "update" => Ok(Permission::Update),
            "delete" => Ok(Permission::Delete),
            "grant" => Ok(Permission::Grant),
            _ => Err("unrecognized permission kind"),
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire shape of a single ACE: raw actor and group id lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AceData {
    #[serde(default)]
    pub actors: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
}

/// One permission kind's authorized actor-id and group-id sets.
///
/// Both lists are kept sorted and duplicate-free; every mutator is
/// idempotent and reports whether it changed anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ace {
    actors: Vec<AuthzId>,
    groups: Vec<AuthzId>,
}

fn insert_sorted(list: &mut Vec<AuthzId>, id: AuthzId) -> bool {
    match list.binary_search(&id) {
        Ok(_) => false,
        Err(pos) => {
            list.insert(pos, id);
            true
        }
    }
}

fn remove_sorted(list: &mut Vec<AuthzId>, id: &AuthzId) -> bool {
    match list.binary_search(id) {
        Ok(pos) => {
            list.remove(pos);
            true
        }
        Err(_) => false,
    }
}

impl Ace {
    /// Builds an Ace from member iterators, normalizing to the sorted,
    /// deduplicated representation.
    pub fn new(
        actors: impl IntoIterator<Item = AuthzId>,
        groups: impl IntoIterator<Item = AuthzId>,
    ) -> Self {
        let mut ace = Ace::default();
        for id in actors {
            ace.add_actor(id);
        }
        for id in groups {
            ace.add_group(id);
        }
        ace
    }

    /// Parses an Ace from its wire shape. Empty id strings are rejected.
    pub fn from_data(data: &AceData) -> DomainResult<Self> {
        let mut ace = Ace::default();
        for raw in &data.actors {
            let id = AuthzId::new(raw.clone()).map_err(|reason| DomainError::MalformedAcl {
                reason: reason.to_string(),
            })?;
            ace.add_actor(id);
        }
        for raw in &data.groups {
            let id = AuthzId::new(raw.clone()).map_err(|reason| DomainError::MalformedAcl {
                reason: reason.to_string(),
            })?;
            ace.add_group(id);
        }
        Ok(ace)
    }

    /// Returns the wire shape of this Ace.
    pub fn to_data(&self) -> AceData {
        AceData {
            actors: self.actors.iter().map(|id| id.as_str().to_string()).collect(),
            groups: self.groups.iter().map(|id| id.as_str().to_string()).collect(),
        }
    }

    pub fn actors(&self) -> &[AuthzId] {
        &self.actors
    }

    pub fn groups(&self) -> &[AuthzId] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty() && self.groups.is_empty()
    }

    pub fn contains_actor(&self, id: &AuthzId) -> bool {
        self.actors.binary_search(id).is_ok()
    }

    pub fn contains_group(&self, id: &AuthzId) -> bool {
        self.groups.binary_search(id).is_ok()
    }

    /// Adds an actor id; returns false if it was already present.
    pub fn add_actor(&mut self, id: AuthzId) -> bool {
        insert_sorted(&mut self.actors, id)
    }

    /// Adds a group id; returns false if it was already present.
    pub fn add_group(&mut self, id: AuthzId) -> bool {
        insert_sorted(&mut self.groups, id)
    }

    /// Removes an actor id; returns false if it was absent.
    pub fn remove_actor(&mut self, id: &AuthzId) -> bool {
        remove_sorted(&mut self.actors, id)
    }

    /// Removes a group id; returns false if it was absent.
    pub fn remove_group(&mut self, id: &AuthzId) -> bool {
        remove_sorted(&mut self.groups, id)
    }

    /// Empties the group list; returns false if it was already empty.
    pub fn clear_groups(&mut self) -> bool {
        if self.groups.is_empty() {
            return false;
        }
        self.groups.clear();
        true
    }

    /// Returns the union of both operands' member lists.
    pub fn merge(&self, other: &Ace) -> Ace {
        let mut merged = self.clone();
        for id in &other.actors {
            merged.add_actor(id.clone());
        }
        for id in &other.groups {
            merged.add_group(id.clone());
        }
        merged
    }
}

/// A full ACL: exactly one Ace per permission kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acl {
    aces: [Ace; 5],
}

impl Default for Acl {
    fn default() -> Self {
        Self {
            aces: std::array::from_fn(|_| Ace::default()),
        }
    }
}

impl Acl {
    /// An ACL with all five ACEs empty.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn ace(&self, kind: Permission) -> &Ace {
        &self.aces[kind.index()]
    }

    pub fn ace_mut(&mut self, kind: Permission) -> &mut Ace {
        &mut self.aces[kind.index()]
    }

    /// Iterates all five ACEs in canonical kind order.
    pub fn iter(&self) -> impl Iterator<Item = (Permission, &Ace)> + '_ {
        Permission::ALL
            .into_iter()
            .map(move |kind| (kind, self.ace(kind)))
    }

    /// Iterates only the given kinds, in the order given.
    pub fn iter_kinds<'a>(
        &'a self,
        kinds: &'a [Permission],
    ) -> impl Iterator<Item = (Permission, &'a Ace)> + 'a {
        kinds.iter().map(move |kind| (*kind, self.ace(*kind)))
    }

    /// Per-kind union of both operands. Pure; neither operand is mutated.
    pub fn merge(&self, other: &Acl) -> Acl {
        let mut merged = Acl::empty();
        for kind in Permission::ALL {
            *merged.ace_mut(kind) = self.ace(kind).merge(other.ace(kind));
        }
        merged
    }

    /// Parses an ACL from a raw five-key wire document.
    ///
    /// Exactly the five recognized kinds must be present; anything else
    /// fails with `MalformedAcl` naming the offending key.
    pub fn from_wire(value: &serde_json::Value) -> DomainResult<Self> {
        let object = value.as_object().ok_or_else(|| DomainError::MalformedAcl {
            reason: "acl document is not an object".to_string(),
        })?;

        for key in object.keys() {
            if Permission::from_str(key).is_err() {
                return Err(DomainError::MalformedAcl {
                    reason: format!("unrecognized ace kind '{key}'"),
                });
            }
        }

        let mut acl = Acl::empty();
        for kind in Permission::ALL {
            let raw = object
                .get(kind.as_str())
                .ok_or_else(|| DomainError::MalformedAcl {
                    reason: format!("missing ace kind '{kind}'"),
                })?;
            let data: AceData =
                serde_json::from_value(raw.clone()).map_err(|err| DomainError::MalformedAcl {
                    reason: format!("invalid ace '{kind}': {err}"),
                })?;
            *acl.ace_mut(kind) = Ace::from_data(&data)?;
        }
        Ok(acl)
    }

    /// Renders the ACL as its five-key wire document.
    pub fn to_wire(&self) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        for (kind, ace) in self.iter() {
            let data = ace.to_data();
            object.insert(
                kind.as_str().to_string(),
                serde_json::json!({ "actors": data.actors, "groups": data.groups }),
            );
        }
        serde_json::Value::Object(object)
    }

    /// Resolves every member id to a name for display.
    ///
    /// Ids that no longer resolve to a user, client, or group are dropped
    /// (and logged by the resolver); a dangling id must not break a
    /// permission display. The source ACL is not mutated.
    pub async fn to_user_facing<U, C, G>(
        &self,
        resolver: &IdentityResolver<U, C, G>,
    ) -> DomainResult<NamedAcl>
    where
        U: UserStore,
        C: ClientStore,
        G: GroupStore,
    {
        let mut named = NamedAcl::empty();
        for (kind, ace) in self.iter() {
            let actors = resolver.resolve_actor_ids_to_names(ace.actors()).await?;
            let groups = resolver.resolve_group_ids_to_names(ace.groups()).await?;
            *named.ace_mut(kind) = NamedAce {
                users: actors.users,
                clients: actors.clients,
                groups,
            };
        }
        Ok(named)
    }
}

/// Wire shape of a user-facing ACE: member names split by namespace.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NamedAce {
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(default)]
    pub clients: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
}

/// A five-kind ACL whose members are user-facing names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedAcl {
    aces: [NamedAce; 5],
}

impl NamedAcl {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn ace(&self, kind: Permission) -> &NamedAce {
        &self.aces[kind.index()]
    }

    pub fn ace_mut(&mut self, kind: Permission) -> &mut NamedAce {
        &mut self.aces[kind.index()]
    }

    /// Parses a user-supplied named ACL, enforcing the same
    /// exactly-five-kinds invariant as [`Acl::from_wire`].
    pub fn from_wire(value: &serde_json::Value) -> DomainResult<Self> {
        let object = value.as_object().ok_or_else(|| DomainError::MalformedAcl {
            reason: "acl document is not an object".to_string(),
        })?;

        for key in object.keys() {
            if Permission::from_str(key).is_err() {
                return Err(DomainError::MalformedAcl {
                    reason: format!("unrecognized ace kind '{key}'"),
                });
            }
        }

        let mut acl = NamedAcl::empty();
        for kind in Permission::ALL {
            let raw = object
                .get(kind.as_str())
                .ok_or_else(|| DomainError::MalformedAcl {
                    reason: format!("missing ace kind '{kind}'"),
                })?;
            let ace: NamedAce =
                serde_json::from_value(raw.clone()).map_err(|err| DomainError::MalformedAcl {
                    reason: format!("invalid ace '{kind}': {err}"),
                })?;
            *acl.ace_mut(kind) = ace;
        }
        Ok(acl)
    }

    /// Renders the named ACL as its wire document.
    pub fn to_wire(&self) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        for kind in Permission::ALL {
            let ace = self.ace(kind);
            object.insert(
                kind.as_str().to_string(),
                serde_json::json!({
                    "users": ace.users,
                    "clients": ace.clients,
                    "groups": ace.groups,
                }),
            );
        }
        serde_json::Value::Object(object)
    }

    /// Resolves every member name to its authz id.
    ///
    /// This is the write path: an ACL headed for the authorization
    /// service must not silently narrow, so any unresolvable member fails
    /// the whole translation with `UnknownActor`/`UnknownGroup`.
    pub async fn to_authz_facing<U, C, G>(
        &self,
        resolver: &IdentityResolver<U, C, G>,
    ) -> DomainResult<Acl>
    where
        U: UserStore,
        C: ClientStore,
        G: GroupStore,
    {
        let mut acl = Acl::empty();
        for kind in Permission::ALL {
            let named = self.ace(kind);
            let mut actor_names: Vec<String> = named.users.clone();
            actor_names.extend(named.clients.iter().cloned());
            let actor_ids = resolver.resolve_actor_names_to_ids(&actor_names).await?;
            let group_ids = resolver.resolve_group_names_to_ids(&named.groups).await?;
            *acl.ace_mut(kind) = Ace::new(actor_ids, group_ids);
        }
        Ok(acl)
    }
}
