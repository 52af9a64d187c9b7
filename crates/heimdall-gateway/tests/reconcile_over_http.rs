//! End-to-end: name-based membership reconciliation through the real
//! HTTP adapter, with identities served by the in-memory store.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use heimdall_domain::gateway::RequestContext;
use heimdall_domain::hooks::ObjectAuthz;
use heimdall_domain::model::AuthzId;
use heimdall_domain::resolver::IdentityResolver;
use heimdall_gateway::{GatewayConfig, HttpAuthzGateway};
use heimdall_store::MemoryIdentityStore;

fn id(value: &str) -> AuthzId {
    AuthzId::new(value).unwrap()
}

#[tokio::test]
async fn test_reconcile_membership_from_names_issues_minimal_edits() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    // Current remote membership: one stale actor.
    Mock::given(method("GET"))
        .and(path("/groups/grp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "actors": ["stale"],
            "groups": [],
        })))
        .expect(1)
        .mount(&server)
        .await;
    // Exactly one addition and one removal, addition first.
    Mock::given(method("PUT"))
        .and(path("/groups/grp/actors/a1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/groups/grp/actors/stale"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = MemoryIdentityStore::new_shared("acme");
    store.add_user("alice", id("a1"));
    let resolver = Arc::new(IdentityResolver::new(
        Arc::clone(&store),
        Arc::clone(&store),
        Arc::clone(&store),
    ));
    let gateway = Arc::new(HttpAuthzGateway::new(GatewayConfig::new(
        server.uri(),
        id(&"0".repeat(32)),
    ))?);
    let authz = ObjectAuthz::new(gateway, resolver);

    let ctx = RequestContext::new(id("deadbeefdeadbeefdeadbeefdeadbeef"));
    let outcome = authz
        .reconcile_membership(&ctx, &id("grp"), &["alice".to_string()], &[])
        .await?;

    assert_eq!(outcome.applied.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_unknown_member_name_stops_before_any_remote_call() {
    let server = MockServer::start().await;
    // No mocks mounted: any request to the service would 404 and the
    // expect(0) guards below would fail verification.
    Mock::given(method("GET"))
        .and(path("/groups/grp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "actors": [],
            "groups": [],
        })))
        .expect(0)
        .mount(&server)
        .await;

    let store = MemoryIdentityStore::new_shared("acme");
    let resolver = Arc::new(IdentityResolver::new(
        Arc::clone(&store),
        Arc::clone(&store),
        Arc::clone(&store),
    ));
    let gateway = Arc::new(
        HttpAuthzGateway::new(GatewayConfig::new(server.uri(), id(&"0".repeat(32)))).unwrap(),
    );
    let authz = ObjectAuthz::new(gateway, resolver);

    let ctx = RequestContext::new(id("deadbeefdeadbeefdeadbeefdeadbeef"));
    let err = authz
        .reconcile_membership(&ctx, &id("grp"), &["ghost-user".to_string()], &[])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        heimdall_domain::DomainError::UnknownActor { .. }
    ));
}
