//! Membership reconciliation: minimal edit scripts against a group's
//! remote membership.
//!
//! The remote service has no bulk "set membership" primitive, so a
//! desired state is reached by per-member add/remove calls. Additions
//! are applied before removals: if a run is interrupted partway, the
//! affected principal never observes a wider access loss than it
//! started with. Reconciliation is not transactional; an interrupted
//! run surfaces the unapplied operations and is safe to re-run, since
//! the diff recomputed against the partially-updated remote state is
//! exactly the remaining edits.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::error::{DomainError, DomainResult};
use crate::gateway::{AuthzApi, RequestContext};
use crate::model::{AuthzId, GroupMembership, MemberRef};

/// Whether a membership edit adds or removes a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipAction {
    Add,
    Remove,
}

/// One member-level edit against a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipOp {
    pub action: MembershipAction,
    pub member: MemberRef,
}

impl fmt::Display for MembershipOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.action {
            MembershipAction::Add => write!(f, "add {}", self.member),
            MembershipAction::Remove => write!(f, "remove {}", self.member),
        }
    }
}

/// The minimal edit script between a current and a desired membership.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipDelta {
    to_add: Vec<MemberRef>,
    to_remove: Vec<MemberRef>,
}

impl MembershipDelta {
    /// Computes the set differences in both directions, for both
    /// member lists. Pure; issues no remote calls.
    pub fn between(current: &GroupMembership, desired: &GroupMembership) -> Self {
        let to_add = desired
            .actors
            .difference(&current.actors)
            .cloned()
            .map(MemberRef::actor)
            .chain(
                desired
                    .groups
                    .difference(&current.groups)
                    .cloned()
                    .map(MemberRef::group),
            )
            .collect();
        let to_remove = current
            .actors
            .difference(&desired.actors)
            .cloned()
            .map(MemberRef::actor)
            .chain(
                current
                    .groups
                    .difference(&desired.groups)
                    .cloned()
                    .map(MemberRef::group),
            )
            .collect();
        Self { to_add, to_remove }
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    pub fn additions(&self) -> &[MemberRef] {
        &self.to_add
    }

    pub fn removals(&self) -> &[MemberRef] {
        &self.to_remove
    }

    /// The ordered operation list: every addition before any removal.
    pub fn ops(&self) -> Vec<MembershipOp> {
        self.to_add
            .iter()
            .cloned()
            .map(|member| MembershipOp {
                action: MembershipAction::Add,
                member,
            })
            .chain(self.to_remove.iter().cloned().map(|member| MembershipOp {
                action: MembershipAction::Remove,
                member,
            }))
            .collect()
    }
}

/// What a completed reconciliation applied.
#[derive(Debug, Clone, Default)]
pub struct ReconcileOutcome {
    pub applied: Vec<MembershipOp>,
}

/// Moves a group's remote membership to a desired state with the
/// minimal number of per-member calls.
pub struct MembershipReconciler<A> {
    gateway: Arc<A>,
}

impl<A: AuthzApi> MembershipReconciler<A> {
    pub fn new(gateway: Arc<A>) -> Self {
        Self { gateway }
    }

    /// Fetches the group's current membership, diffs it against
    /// `desired`, and applies the edits. Zero mutating calls when the
    /// two states already agree.
    #[instrument(skip(self, ctx, desired), fields(group = %group))]
    pub async fn reconcile(
        &self,
        ctx: &RequestContext,
        group: &AuthzId,
        desired: &GroupMembership,
    ) -> DomainResult<ReconcileOutcome> {
        let current = self.gateway.fetch_group(ctx, group).await?;
        let delta = MembershipDelta::between(&current, desired);
        if delta.is_empty() {
            debug!("membership already converged");
            return Ok(ReconcileOutcome::default());
        }

        let ops = delta.ops();
        debug!(
            additions = delta.additions().len(),
            removals = delta.removals().len(),
            "applying membership delta"
        );
        let mut applied = Vec::with_capacity(ops.len());
        for (index, op) in ops.iter().enumerate() {
            let result = match op.action {
                MembershipAction::Add => self.gateway.add_member(ctx, group, &op.member).await,
                MembershipAction::Remove => {
                    self.gateway.remove_member(ctx, group, &op.member).await
                }
            };
            if let Err(err) = result {
                return Err(DomainError::PartialReconciliation {
                    applied: applied.len(),
                    remaining: ops[index..].to_vec(),
                    reason: err.to_string(),
                });
            }
            applied.push(op.clone());
        }
        Ok(ReconcileOutcome { applied })
    }
}
