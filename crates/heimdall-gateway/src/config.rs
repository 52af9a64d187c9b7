//! Gateway configuration.
//!
//! All service wiring is explicit configuration injected at
//! construction; there is no process-wide default. The superuser id is
//! part of the configuration because it is known a priori — it is
//! never resolved by name.

use std::time::Duration;

use heimdall_domain::model::AuthzId;

/// Configuration for the HTTP gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the authorization service, without a trailing slash.
    pub base_url: String,
    /// Bounded timeout applied to every request.
    pub request_timeout: Duration,
    /// The superuser principal's authz id.
    pub superuser_id: AuthzId,
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>, superuser_id: AuthzId) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            request_timeout: Duration::from_secs(15),
            superuser_id,
        }
    }

    /// Sets the per-request timeout.
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}
