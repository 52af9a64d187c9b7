//! Core identity types shared across the crate.

use std::collections::BTreeSet;
use std::fmt;

/// An opaque identifier assigned by the external authorization service.
///
/// The service hands these out as 32-character hex tokens, but nothing in
/// this layer depends on that shape; the id is treated as an opaque,
/// non-empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AuthzId(String);

impl AuthzId {
    /// Creates a new AuthzId, rejecting empty input.
    pub fn new(value: impl Into<String>) -> Result<Self, &'static str> {
        let value = value.into();
        if value.is_empty() {
            return Err("authz id cannot be empty");
        }
        Ok(Self(value))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthzId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The two principal kinds that can be granted permissions directly.
///
/// Resolved once at lookup time; never inferred downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorKind {
    /// A human principal; usernames are globally unique.
    User,
    /// A machine principal; client names are unique within an organization.
    Client,
}

/// A user or client together with its authz-side identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub kind: ActorKind,
    pub name: String,
    pub authz_id: AuthzId,
}

impl Actor {
    pub fn user(name: impl Into<String>, authz_id: AuthzId) -> Self {
        Self {
            kind: ActorKind::User,
            name: name.into(),
            authz_id,
        }
    }

    pub fn client(name: impl Into<String>, authz_id: AuthzId) -> Self {
        Self {
            kind: ActorKind::Client,
            name: name.into(),
            authz_id,
        }
    }
}

/// A group's membership as two id sets: actor members and nested group
/// members. Used both for the current state fetched from the remote
/// service and for a desired state produced by name resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupMembership {
    pub actors: BTreeSet<AuthzId>,
    pub groups: BTreeSet<AuthzId>,
}

impl GroupMembership {
    /// Builds a membership from actor and group id iterators.
    pub fn new(
        actors: impl IntoIterator<Item = AuthzId>,
        groups: impl IntoIterator<Item = AuthzId>,
    ) -> Self {
        Self {
            actors: actors.into_iter().collect(),
            groups: groups.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty() && self.groups.is_empty()
    }

    pub fn contains_actor(&self, id: &AuthzId) -> bool {
        self.actors.contains(id)
    }
}

/// Distinguishes the two member lists of a group on the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Actor,
    Group,
}

/// A single group member: an actor id or a nested group id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRef {
    pub kind: MemberKind,
    pub id: AuthzId,
}

impl MemberRef {
    pub fn actor(id: AuthzId) -> Self {
        Self {
            kind: MemberKind::Actor,
            id,
        }
    }

    pub fn group(id: AuthzId) -> Self {
        Self {
            kind: MemberKind::Group,
            id,
        }
    }
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MemberKind::Actor => write!(f, "actor:{}", self.id),
            MemberKind::Group => write!(f, "group:{}", self.id),
        }
    }
}

/// The object kinds the authorization service keeps one resource
/// collection for. Organizations have no dedicated collection; they are
/// plain objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Actor,
    Group,
    Container,
    Object,
}

impl ObjectKind {
    /// The collection path segment for this kind.
    pub fn collection(&self) -> &'static str {
        match self {
            ObjectKind::Actor => "actors",
            ObjectKind::Group => "groups",
            ObjectKind::Container => "containers",
            ObjectKind::Object => "objects",
        }
    }
}
