//! HTTP client implementing the authorization service contract.
//!
//! One pooled `reqwest::Client` per gateway instance; every request
//! carries the requesting actor header and the configured timeout.
//! Error messages never carry the service URL — the failing operation
//! is logged here with full detail instead.

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{error, instrument};

use heimdall_domain::gateway::{AuthzApi, GatewayError, GatewayResult, RequestContext};
use heimdall_domain::model::{
    Ace, Acl, AuthzId, GroupMembership, MemberKind, MemberRef, ObjectKind, Permission,
};

use crate::config::GatewayConfig;
use crate::types::{CreateObjectResponse, GroupBody};

/// Header carrying the requesting actor's authz id.
pub const REQUESTING_ACTOR_HEADER: &str = "X-Requesting-Actor-Id";

/// HTTP implementation of [`AuthzApi`].
pub struct HttpAuthzGateway {
    config: GatewayConfig,
    client: reqwest::Client,
}

impl HttpAuthzGateway {
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| GatewayError::Transport {
                operation: "client setup".to_string(),
                message: err.without_url().to_string(),
            })?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// A request context acting as the configured superuser.
    pub fn superuser_context(&self) -> RequestContext {
        RequestContext::new(self.config.superuser_id.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url)
    }

    fn timeout_ms(&self) -> u64 {
        self.config.request_timeout.as_millis() as u64
    }

    fn member_path(group: &AuthzId, member: &MemberRef) -> String {
        let collection = match member.kind {
            MemberKind::Actor => "actors",
            MemberKind::Group => "groups",
        };
        format!("groups/{group}/{collection}/{}", member.id)
    }

    async fn send(
        &self,
        operation: &'static str,
        ctx: &RequestContext,
        request: reqwest::RequestBuilder,
    ) -> GatewayResult<reqwest::Response> {
        request
            .header(REQUESTING_ACTOR_HEADER, ctx.requesting_actor.as_str())
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    GatewayError::Timeout {
                        operation: operation.to_string(),
                        timeout_ms: self.timeout_ms(),
                    }
                } else {
                    error!(operation, error = %err, "transport failure talking to authorization service");
                    GatewayError::Transport {
                        operation: operation.to_string(),
                        message: err.without_url().to_string(),
                    }
                }
            })
    }

    fn expect_success(
        &self,
        operation: &'static str,
        response: reqwest::Response,
    ) -> GatewayResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound {
                operation: operation.to_string(),
            });
        }
        error!(
            operation,
            status = status.as_u16(),
            "authorization service returned unexpected status"
        );
        Err(GatewayError::UnexpectedStatus {
            operation: operation.to_string(),
            status: status.as_u16(),
        })
    }

    async fn read_json<T>(
        &self,
        operation: &'static str,
        response: reqwest::Response,
    ) -> GatewayResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        response
            .json::<T>()
            .await
            .map_err(|err| GatewayError::InvalidResponse {
                operation: operation.to_string(),
                message: err.without_url().to_string(),
            })
    }
}

#[async_trait]
impl AuthzApi for HttpAuthzGateway {
    #[instrument(skip(self, ctx))]
    async fn create_object(
        &self,
        ctx: &RequestContext,
        kind: ObjectKind,
    ) -> GatewayResult<AuthzId> {
        const OPERATION: &str = "create_object";
        let request = self
            .client
            .post(self.url(kind.collection()))
            .json(&serde_json::json!({}));
        let response = self.send(OPERATION, ctx, request).await?;
        let response = self.expect_success(OPERATION, response)?;
        let body: CreateObjectResponse = self.read_json(OPERATION, response).await?;
        AuthzId::new(body.id).map_err(|err| GatewayError::InvalidResponse {
            operation: OPERATION.to_string(),
            message: err.to_string(),
        })
    }

    async fn fetch_group(
        &self,
        ctx: &RequestContext,
        group: &AuthzId,
    ) -> GatewayResult<GroupMembership> {
        const OPERATION: &str = "fetch_group";
        let request = self.client.get(self.url(&format!("groups/{group}")));
        let response = self.send(OPERATION, ctx, request).await?;
        let response = self.expect_success(OPERATION, response)?;
        let body: GroupBody = self.read_json(OPERATION, response).await?;
        body.into_membership()
            .map_err(|message| GatewayError::InvalidResponse {
                operation: OPERATION.to_string(),
                message,
            })
    }

    async fn fetch_acl(
        &self,
        ctx: &RequestContext,
        kind: ObjectKind,
        object: &AuthzId,
    ) -> GatewayResult<Acl> {
        const OPERATION: &str = "fetch_acl";
        let request = self
            .client
            .get(self.url(&format!("{}/{object}/acl", kind.collection())));
        let response = self.send(OPERATION, ctx, request).await?;
        let response = self.expect_success(OPERATION, response)?;
        let body: serde_json::Value = self.read_json(OPERATION, response).await?;
        Acl::from_wire(&body).map_err(|err| GatewayError::InvalidResponse {
            operation: OPERATION.to_string(),
            message: err.to_string(),
        })
    }

    #[instrument(skip(self, ctx, ace), fields(object = %object))]
    async fn update_ace(
        &self,
        ctx: &RequestContext,
        kind: ObjectKind,
        object: &AuthzId,
        permission: Permission,
        ace: &Ace,
    ) -> GatewayResult<()> {
        const OPERATION: &str = "update_ace";
        let request = self
            .client
            .put(self.url(&format!(
                "{}/{object}/acl/{permission}",
                kind.collection()
            )))
            .json(&ace.to_data());
        let response = self.send(OPERATION, ctx, request).await?;
        self.expect_success(OPERATION, response)?;
        Ok(())
    }

    async fn add_member(
        &self,
        ctx: &RequestContext,
        group: &AuthzId,
        member: &MemberRef,
    ) -> GatewayResult<()> {
        const OPERATION: &str = "add_member";
        let request = self
            .client
            .put(self.url(&Self::member_path(group, member)))
            .json(&serde_json::json!({}));
        let response = self.send(OPERATION, ctx, request).await?;
        self.expect_success(OPERATION, response)?;
        Ok(())
    }

    async fn remove_member(
        &self,
        ctx: &RequestContext,
        group: &AuthzId,
        member: &MemberRef,
    ) -> GatewayResult<()> {
        const OPERATION: &str = "remove_member";
        let request = self.client.delete(self.url(&Self::member_path(group, member)));
        let response = self.send(OPERATION, ctx, request).await?;
        self.expect_success(OPERATION, response)?;
        Ok(())
    }

    async fn check_ace_membership(
        &self,
        ctx: &RequestContext,
        kind: ObjectKind,
        object: &AuthzId,
        permission: Permission,
        actor: &AuthzId,
    ) -> GatewayResult<bool> {
        const OPERATION: &str = "check_ace_membership";
        let request = self.client.get(self.url(&format!(
            "{}/{object}/acl/{permission}/actors/{actor}",
            kind.collection()
        )));
        let response = self.send(OPERATION, ctx, request).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(true);
        }
        // Not-found here means "not authorized", never an error.
        if status == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        error!(
            operation = OPERATION,
            status = status.as_u16(),
            "authorization service returned unexpected status"
        );
        Err(GatewayError::UnexpectedStatus {
            operation: OPERATION.to_string(),
            status: status.as_u16(),
        })
    }
}
