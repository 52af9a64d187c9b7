//! Domain error types for identity resolution and ACL reconciliation.

use thiserror::Error;

use crate::gateway::GatewayError;
use crate::reconcile::MembershipOp;

/// Domain-specific errors.
///
/// Validation-class errors (`UnknownActor`, `UnknownGroup`) carry the full
/// list of offending names so callers can report them in a single message.
/// Infrastructure-class errors (`ResolutionFailed`, `GatewayTimeout`,
/// `GatewayFailed`) keep their messages generic; the failing operation and
/// ids are logged at the call site, not surfaced here.
#[derive(Debug, Error)]
pub enum DomainError {
    /// One or more actor names matched neither a user nor a client.
    #[error("unknown actor(s): {}", .names.join(", "))]
    UnknownActor { names: Vec<String> },

    /// One or more group names matched no group record.
    #[error("unknown group(s): {}", .names.join(", "))]
    UnknownGroup { names: Vec<String> },

    /// An ACL violated the exactly-five-kinds structural invariant.
    #[error("malformed acl: {reason}")]
    MalformedAcl { reason: String },

    /// A local identity-store lookup failed or timed out.
    #[error("identity resolution failed: {message}")]
    ResolutionFailed { message: String },

    /// The authorization service did not answer within the bounded timeout.
    #[error("authorization service timed out during {operation} after {timeout_ms}ms")]
    GatewayTimeout { operation: String, timeout_ms: u64 },

    /// The authorization service rejected or failed a request.
    #[error("authorization service request failed during {operation}")]
    GatewayFailed { operation: String },

    /// The requested object does not exist in the authorization service.
    #[error("object not found in authorization service during {operation}")]
    ObjectNotFound { operation: String },

    /// A membership reconciliation was interrupted partway.
    ///
    /// `remaining` starts with the operation that failed; re-running the
    /// same reconciliation recomputes exactly these edits from the
    /// partially-updated remote state.
    #[error(
        "membership reconciliation interrupted: {} change(s) applied, {} not applied: {}",
        .applied,
        .remaining.len(),
        .reason
    )]
    PartialReconciliation {
        applied: usize,
        remaining: Vec<MembershipOp>,
        reason: String,
    },

    /// A policy rule referenced a container or group that no earlier rule
    /// created. This is a bug in the policy table, not a runtime condition.
    #[error("policy rule '{rule}' references unknown target '{missing}'")]
    PolicyViolation { rule: String, missing: String },
}

impl From<GatewayError> for DomainError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Timeout {
                operation,
                timeout_ms,
            } => DomainError::GatewayTimeout {
                operation,
                timeout_ms,
            },
            GatewayError::NotFound { operation } => DomainError::ObjectNotFound { operation },
            GatewayError::Transport { operation, .. }
            | GatewayError::UnexpectedStatus { operation, .. }
            | GatewayError::InvalidResponse { operation, .. } => {
                DomainError::GatewayFailed { operation }
            }
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
