//! heimdall-store: local identity-store implementations
//!
//! Implements the `UserStore` / `ClientStore` / `GroupStore` traits
//! from `heimdall-domain` for environments that keep identities in
//! memory — primarily tests and development setups. Production
//! deployments implement the same traits over their own persistence.

pub mod memory;

// Re-export commonly used types
pub use memory::MemoryIdentityStore;
