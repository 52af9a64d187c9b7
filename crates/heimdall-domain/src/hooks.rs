//! Lifecycle seams for host objects.
//!
//! Host create/update paths call these explicitly, in sequence —
//! translate, then persist — rather than having id mapping ride along
//! as a side effect of saving the host record. Persistence of the host
//! object's own record stays with the host.

use std::sync::Arc;

use tracing::instrument;

use crate::error::DomainResult;
use crate::gateway::{AuthzApi, RequestContext};
use crate::model::{Ace, AuthzId, GroupMembership, NamedAcl, ObjectKind, Permission};
use crate::reconcile::{MembershipReconciler, ReconcileOutcome};
use crate::resolver::{ClientStore, GroupStore, IdentityResolver, UserStore};

/// The operations a host object performs against its authz-side
/// counterpart.
pub struct ObjectAuthz<A, U, C, G> {
    gateway: Arc<A>,
    resolver: Arc<IdentityResolver<U, C, G>>,
    reconciler: MembershipReconciler<A>,
}

impl<A, U, C, G> ObjectAuthz<A, U, C, G>
where
    A: AuthzApi,
    U: UserStore,
    C: ClientStore,
    G: GroupStore,
{
    pub fn new(gateway: Arc<A>, resolver: Arc<IdentityResolver<U, C, G>>) -> Self {
        Self {
            reconciler: MembershipReconciler::new(Arc::clone(&gateway)),
            gateway,
            resolver,
        }
    }

    /// Creates the authz-side record for a new host object and returns
    /// the id the host stores. Assigned exactly once; the host never
    /// reassigns it while the object exists.
    #[instrument(skip(self, ctx))]
    pub async fn create_authz_record(
        &self,
        ctx: &RequestContext,
        kind: ObjectKind,
    ) -> DomainResult<AuthzId> {
        Ok(self.gateway.create_object(ctx, kind).await?)
    }

    /// Merges the parent's ACL into the object's own, pushing only the
    /// ACEs the merge changed. Returns how many ACEs were updated.
    #[instrument(skip(self, ctx), fields(object = %object, parent = %parent))]
    pub async fn apply_inherited_acl(
        &self,
        ctx: &RequestContext,
        kind: ObjectKind,
        object: &AuthzId,
        parent_kind: ObjectKind,
        parent: &AuthzId,
    ) -> DomainResult<usize> {
        let own = self.gateway.fetch_acl(ctx, kind, object).await?;
        let inherited = self.gateway.fetch_acl(ctx, parent_kind, parent).await?;
        let merged = own.merge(&inherited);

        let mut updated = 0;
        for (permission, ace) in merged.iter() {
            if ace != own.ace(permission) {
                self.gateway
                    .update_ace(ctx, kind, object, permission, ace)
                    .await?;
                updated += 1;
            }
        }
        Ok(updated)
    }

    /// Replaces one ACE on the object wholesale.
    pub async fn update_ace(
        &self,
        ctx: &RequestContext,
        kind: ObjectKind,
        object: &AuthzId,
        permission: Permission,
        ace: &Ace,
    ) -> DomainResult<()> {
        Ok(self
            .gateway
            .update_ace(ctx, kind, object, permission, ace)
            .await?)
    }

    /// Asks the service whether an actor holds one permission kind on
    /// the object. A not-found answer reads as "not authorized".
    pub async fn check_authorized(
        &self,
        ctx: &RequestContext,
        kind: ObjectKind,
        object: &AuthzId,
        actor: &AuthzId,
        permission: Permission,
    ) -> DomainResult<bool> {
        Ok(self
            .gateway
            .check_ace_membership(ctx, kind, object, permission, actor)
            .await?)
    }

    /// Fetches the object's ACL rendered with user-facing names.
    pub async fn fetch_user_facing_acl(
        &self,
        ctx: &RequestContext,
        kind: ObjectKind,
        object: &AuthzId,
    ) -> DomainResult<NamedAcl> {
        let acl = self.gateway.fetch_acl(ctx, kind, object).await?;
        acl.to_user_facing(self.resolver.as_ref()).await
    }

    /// Translates a caller-supplied named ACL and pushes all five
    /// ACEs. Any unresolvable member fails the whole update before a
    /// single ACE is written.
    #[instrument(skip(self, ctx, named), fields(object = %object))]
    pub async fn update_acl_from_names(
        &self,
        ctx: &RequestContext,
        kind: ObjectKind,
        object: &AuthzId,
        named: &NamedAcl,
    ) -> DomainResult<()> {
        let acl = named.to_authz_facing(self.resolver.as_ref()).await?;
        for (permission, ace) in acl.iter() {
            self.gateway
                .update_ace(ctx, kind, object, permission, ace)
                .await?;
        }
        Ok(())
    }

    /// Resolves a caller's desired member names and reconciles the
    /// group's remote membership to match.
    #[instrument(skip_all, fields(group = %group))]
    pub async fn reconcile_membership(
        &self,
        ctx: &RequestContext,
        group: &AuthzId,
        actor_names: &[String],
        group_names: &[String],
    ) -> DomainResult<ReconcileOutcome> {
        let (actor_ids, group_ids) = tokio::join!(
            self.resolver.resolve_actor_names_to_ids(actor_names),
            self.resolver.resolve_group_names_to_ids(group_names),
        );
        let desired = GroupMembership::new(actor_ids?, group_ids?);
        self.reconciler.reconcile(ctx, group, &desired).await
    }
}
