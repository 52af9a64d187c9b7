//! heimdall-domain: identity resolution and ACL reconciliation core
//!
//! This crate holds the logic that keeps the host system's
//! human-readable names consistent with the opaque ids of the external
//! authorization service:
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │               heimdall-domain                   │
//! ├─────────────────────────────────────────────────┤
//! │  model/     - ACL, ACE, and identity types      │
//! │  resolver/  - name <-> authz id translation     │
//! │  reconcile/ - minimal membership edit scripts   │
//! │  policy/    - declarative default org policy    │
//! │  hooks      - lifecycle seams for host objects  │
//! │  gateway    - remote authz service contract     │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! The gateway trait is implemented over HTTP by `heimdall-gateway`;
//! the local identity-store traits are implemented by
//! `heimdall-store`.

pub mod error;
pub mod gateway;
pub mod hooks;
pub mod model;
pub mod policy;
pub mod reconcile;
pub mod resolver;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types at the crate root
pub use error::{DomainError, DomainResult};
pub use model::{Ace, Acl, AuthzId, Permission};
