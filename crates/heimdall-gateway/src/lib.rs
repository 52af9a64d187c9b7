//! heimdall-gateway: HTTP adapter for the remote authorization service
//!
//! Implements the `AuthzApi` contract from `heimdall-domain` over the
//! service's JSON/HTTP interface: one resource collection per object
//! kind, `/acl` sub-resources, and per-member group endpoints. Every
//! request carries the requesting actor's id as a header and a bounded
//! timeout; there are no batch endpoints to call.

pub mod client;
pub mod config;

mod types;

// Re-export commonly used types
pub use client::HttpAuthzGateway;
pub use config::GatewayConfig;
pub use heimdall_domain::gateway::{AuthzApi, GatewayError, GatewayResult, RequestContext};
