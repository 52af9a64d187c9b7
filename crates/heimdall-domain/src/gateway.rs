//! Contract for the remote authorization service.
//!
//! Everything above the transport calls through [`AuthzApi`]; the HTTP
//! implementation lives in the `heimdall-gateway` crate. The remote
//! protocol offers no batch variant for any of these operations, and no
//! optimistic-concurrency primitive: read-modify-write sequences against
//! the same object can race, and the later write wins.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Acl, Ace, AuthzId, GroupMembership, MemberRef, ObjectKind, Permission};

/// The caller identity threaded through every remote call.
///
/// The service authorizes each request against this actor; it is
/// enforced at the transport boundary, not by the components above it.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub requesting_actor: AuthzId,
}

impl RequestContext {
    pub fn new(requesting_actor: AuthzId) -> Self {
        Self { requesting_actor }
    }
}

/// Transport-level errors from the authorization service.
///
/// Messages deliberately omit service addresses and raw URLs; the
/// transport logs those internally alongside the failing operation.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The object does not exist on the remote service.
    #[error("not found during {operation}")]
    NotFound { operation: String },

    /// The request exceeded its bounded timeout.
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    /// Connection-level failure.
    #[error("transport failure during {operation}: {message}")]
    Transport { operation: String, message: String },

    /// The service answered with a status this client does not expect.
    #[error("unexpected status {status} during {operation}")]
    UnexpectedStatus { operation: String, status: u16 },

    /// The service answered with a body this client cannot interpret.
    #[error("invalid response during {operation}: {message}")]
    InvalidResponse { operation: String, message: String },
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Client-side operations against the remote authorization service.
///
/// Each call is a single synchronous request/response; callers needing
/// several changes issue several calls and own the partial-failure
/// semantics (see the membership reconciler).
#[async_trait]
pub trait AuthzApi: Send + Sync {
    /// Creates a new object of the given kind and returns its id. The
    /// requesting actor is granted the initial ACL by the service.
    async fn create_object(&self, ctx: &RequestContext, kind: ObjectKind)
        -> GatewayResult<AuthzId>;

    /// Fetches a group's current membership.
    async fn fetch_group(
        &self,
        ctx: &RequestContext,
        group: &AuthzId,
    ) -> GatewayResult<GroupMembership>;

    /// Fetches an object's full five-kind ACL.
    async fn fetch_acl(
        &self,
        ctx: &RequestContext,
        kind: ObjectKind,
        object: &AuthzId,
    ) -> GatewayResult<Acl>;

    /// Replaces one ACE's member lists wholesale.
    async fn update_ace(
        &self,
        ctx: &RequestContext,
        kind: ObjectKind,
        object: &AuthzId,
        permission: Permission,
        ace: &Ace,
    ) -> GatewayResult<()>;

    /// Adds one member to a group. Adding an existing member is a no-op
    /// on the service side.
    async fn add_member(
        &self,
        ctx: &RequestContext,
        group: &AuthzId,
        member: &MemberRef,
    ) -> GatewayResult<()>;

    /// Removes one member from a group.
    async fn remove_member(
        &self,
        ctx: &RequestContext,
        group: &AuthzId,
        member: &MemberRef,
    ) -> GatewayResult<()>;

    /// Probes whether an actor is authorized for one permission kind on
    /// an object. A not-found answer from the service means "not
    /// authorized", never an error.
    async fn check_ace_membership(
        &self,
        ctx: &RequestContext,
        kind: ObjectKind,
        object: &AuthzId,
        permission: Permission,
        actor: &AuthzId,
    ) -> GatewayResult<bool>;
}
