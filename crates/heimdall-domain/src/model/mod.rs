//! ACL and identity model types.

mod acl;
mod types;

mod types_proptest;

pub use acl::{Ace, AceData, Acl, NamedAce, NamedAcl, Permission};
pub use types::{Actor, ActorKind, AuthzId, GroupMembership, MemberKind, MemberRef, ObjectKind};
