//! In-memory stand-in for the remote authorization service, with a
//! call log and failure injection for reconciler/policy/hook tests.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use dashmap::DashMap;

use crate::gateway::{AuthzApi, GatewayError, GatewayResult, RequestContext};
use crate::model::{
    Ace, Acl, AuthzId, GroupMembership, MemberKind, MemberRef, ObjectKind, Permission,
};

/// Records every call, counts successful mutations, and can be told to
/// fail the n-th mutation attempt.
#[derive(Default)]
pub(crate) struct MockAuthzService {
    next_id: AtomicU64,
    acls: DashMap<AuthzId, Acl>,
    memberships: DashMap<AuthzId, GroupMembership>,
    calls: Mutex<Vec<String>>,
    mutation_attempts: AtomicUsize,
    applied_mutations: AtomicUsize,
    fail_mutation_at: AtomicUsize,
}

impl MockAuthzService {
    pub fn new() -> Self {
        let service = Self::default();
        service.fail_mutation_at.store(usize::MAX, Ordering::SeqCst);
        service
    }

    /// Pre-creates an object without going through the call log.
    pub fn seed_object(&self, kind: ObjectKind) -> AuthzId {
        let id = self.mint_id();
        self.acls.insert(id.clone(), Acl::empty());
        if kind == ObjectKind::Group {
            self.memberships
                .insert(id.clone(), GroupMembership::default());
        }
        id
    }

    pub fn seed_membership(&self, group: &AuthzId, membership: GroupMembership) {
        self.memberships.insert(group.clone(), membership);
    }

    pub fn acl(&self, object: &AuthzId) -> Acl {
        self.acls
            .get(object)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    pub fn membership(&self, group: &AuthzId) -> GroupMembership {
        self.memberships
            .get(group)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call.starts_with(prefix))
            .collect()
    }

    /// Number of mutations that were actually applied.
    pub fn mutation_count(&self) -> usize {
        self.applied_mutations.load(Ordering::SeqCst)
    }

    /// Fails the `index`-th mutation attempt (0-based), once.
    pub fn fail_mutation(&self, index: usize) {
        self.fail_mutation_at.store(index, Ordering::SeqCst);
    }

    pub fn clear_failure(&self) {
        self.fail_mutation_at.store(usize::MAX, Ordering::SeqCst);
    }

    fn mint_id(&self) -> AuthzId {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        AuthzId::new(format!("{n:032x}")).unwrap()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn gate_mutation(&self, operation: &str) -> GatewayResult<()> {
        let attempt = self.mutation_attempts.fetch_add(1, Ordering::SeqCst);
        if attempt == self.fail_mutation_at.load(Ordering::SeqCst) {
            return Err(GatewayError::Transport {
                operation: operation.to_string(),
                message: "injected failure".to_string(),
            });
        }
        self.applied_mutations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl AuthzApi for MockAuthzService {
    async fn create_object(
        &self,
        _ctx: &RequestContext,
        kind: ObjectKind,
    ) -> GatewayResult<AuthzId> {
        self.record(format!("create_object:{}", kind.collection()));
        self.gate_mutation("create_object")?;
        Ok(self.seed_object(kind))
    }

    async fn fetch_group(
        &self,
        _ctx: &RequestContext,
        group: &AuthzId,
    ) -> GatewayResult<GroupMembership> {
        self.record(format!("fetch_group:{group}"));
        self.memberships
            .get(group)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| GatewayError::NotFound {
                operation: "fetch_group".to_string(),
            })
    }

    async fn fetch_acl(
        &self,
        _ctx: &RequestContext,
        kind: ObjectKind,
        object: &AuthzId,
    ) -> GatewayResult<Acl> {
        self.record(format!("fetch_acl:{}:{object}", kind.collection()));
        self.acls
            .get(object)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| GatewayError::NotFound {
                operation: "fetch_acl".to_string(),
            })
    }

    async fn update_ace(
        &self,
        _ctx: &RequestContext,
        kind: ObjectKind,
        object: &AuthzId,
        permission: Permission,
        ace: &Ace,
    ) -> GatewayResult<()> {
        self.record(format!(
            "update_ace:{}:{object}:{permission}",
            kind.collection()
        ));
        self.gate_mutation("update_ace")?;
        let mut acl = self
            .acls
            .get_mut(object)
            .ok_or_else(|| GatewayError::NotFound {
                operation: "update_ace".to_string(),
            })?;
        *acl.ace_mut(permission) = ace.clone();
        Ok(())
    }

    async fn add_member(
        &self,
        _ctx: &RequestContext,
        group: &AuthzId,
        member: &MemberRef,
    ) -> GatewayResult<()> {
        self.record(format!("add_member:{group}:{member}"));
        self.gate_mutation("add_member")?;
        let mut membership =
            self.memberships
                .get_mut(group)
                .ok_or_else(|| GatewayError::NotFound {
                    operation: "add_member".to_string(),
                })?;
        match member.kind {
            MemberKind::Actor => membership.actors.insert(member.id.clone()),
            MemberKind::Group => membership.groups.insert(member.id.clone()),
        };
        Ok(())
    }

    async fn remove_member(
        &self,
        _ctx: &RequestContext,
        group: &AuthzId,
        member: &MemberRef,
    ) -> GatewayResult<()> {
        self.record(format!("remove_member:{group}:{member}"));
        self.gate_mutation("remove_member")?;
        let mut membership =
            self.memberships
                .get_mut(group)
                .ok_or_else(|| GatewayError::NotFound {
                    operation: "remove_member".to_string(),
                })?;
        match member.kind {
            MemberKind::Actor => membership.actors.remove(&member.id),
            MemberKind::Group => membership.groups.remove(&member.id),
        };
        Ok(())
    }

    async fn check_ace_membership(
        &self,
        _ctx: &RequestContext,
        kind: ObjectKind,
        object: &AuthzId,
        permission: Permission,
        actor: &AuthzId,
    ) -> GatewayResult<bool> {
        self.record(format!(
            "check_ace_membership:{}:{object}:{permission}:{actor}",
            kind.collection()
        ));
        // The not-found contract: an unknown object or an absent grant
        // both read as "not authorized".
        Ok(self
            .acls
            .get(object)
            .map(|acl| acl.ace(permission).contains_actor(actor))
            .unwrap_or(false))
    }
}

/// A request context with a fixed superuser-ish requesting actor.
pub(crate) fn test_context() -> RequestContext {
    RequestContext::new(AuthzId::new("0".repeat(32)).unwrap())
}
