//! End-to-end router tests against mock backends

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use httpmock::prelude::*;
use mcpgate_config::{AnonymousPolicy, GatewayConfig, GroupConfig, ServerConfig};
use mcpgate_core::ServerTier;
use mcpgate_server::{create_router, AppState};
use mcpgate_store::MemoryStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn gateway_config(weather_endpoint: String, enabled: bool) -> GatewayConfig {
    GatewayConfig {
        listen_addr: "127.0.0.1:0".into(),
        database_url: "sqlite::memory:".into(),
        trust_gateway_headers: true,
        anonymous: AnonymousPolicy::Deny,
        superuser_group: "MCP-Admin".into(),
        cache_ttl_secs: 300,
        list_timeout_secs: 2,
        invoke_timeout_secs: 2,
        servers: vec![
            ServerConfig {
                id: "weather".into(),
                display_name: "Weather".into(),
                tier: ServerTier::Local,
                endpoint: weather_endpoint,
                api_key_env: None,
                enabled,
                description: "Forecast tools".into(),
            },
            ServerConfig {
                id: "restricted".into(),
                display_name: "Restricted".into(),
                tier: ServerTier::Local,
                endpoint: "http://127.0.0.1:9".into(),
                api_key_env: None,
                enabled: true,
                description: String::new(),
            },
        ],
        groups: vec![
            GroupConfig {
                name: "Test-Tenant".into(),
                allowed_servers: vec!["weather".into()],
                is_superuser: false,
            },
            GroupConfig {
                name: "Ops".into(),
                allowed_servers: vec!["restricted".into()],
                is_superuser: false,
            },
        ],
    }
}

fn router_for(config: &GatewayConfig) -> Router {
    create_router(AppState::with_store(config, Arc::new(MemoryStore::new())))
}

fn mock_backend(server: &MockServer) -> (httpmock::Mock<'_>, httpmock::Mock<'_>) {
    let discovery = server.mock(|when, then| {
        when.method(GET).path("/openapi.json");
        then.status(200).json_body(json!({
            "paths": {
                "/get_weather": {
                    "post": {"summary": "Get weather"}
                }
            }
        }));
    });
    let invoke = server.mock(|when, then| {
        when.method(POST).path("/get_weather").json_body(json!({"city": "Berlin"}));
        then.status(200).json_body(json!({"temp_c": 18}));
    });
    (discovery, invoke)
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

fn get_as_tenant(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("x-user-email", "dev@example.com")
        .header("x-user-groups", "Test-Tenant")
        .body(Body::empty())
        .unwrap()
}

fn post_as_tenant(uri: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-user-email", "dev@example.com")
        .header("x-user-groups", "Test-Tenant")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_needs_no_identity() {
    let backend = MockServer::start();
    let router = router_for(&gateway_config(backend.base_url(), true));

    let (status, body) = send(&router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["servers"], 2);
}

#[tokio::test]
async fn anonymous_server_listing_is_empty_with_hint() {
    let backend = MockServer::start();
    let router = router_for(&gateway_config(backend.base_url(), true));

    let (status, body) = send(&router, get("/servers")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 0);
    assert!(body["metadata"]["warnings"][0].as_str().unwrap().contains("authenticate"));
}

#[tokio::test]
async fn anonymous_tool_listing_is_unauthorized() {
    let backend = MockServer::start();
    let router = router_for(&gateway_config(backend.base_url(), true));

    let (status, body) = send(&router, get("/tools")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "IDENTITY_UNRESOLVED");
}

#[tokio::test]
async fn tenant_sees_only_allowed_servers() {
    let backend = MockServer::start();
    let router = router_for(&gateway_config(backend.base_url(), true));

    let (status, body) = send(&router, get_as_tenant("/servers")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["servers"]["local"][0]["id"], "weather");
    assert_eq!(body["metadata"]["user"], "dev@example.com");
}

#[tokio::test]
async fn tool_listing_is_namespaced() {
    let backend = MockServer::start();
    mock_backend(&backend);
    let router = router_for(&gateway_config(backend.base_url(), true));

    let (status, body) = send(&router, get_as_tenant("/tools")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["count"], 1);
    assert_eq!(body["data"]["tools"][0]["name"], "weather/get_weather");
}

#[tokio::test]
async fn invoke_unwraps_arguments_wrapper() {
    let backend = MockServer::start();
    let (_, invoke) = mock_backend(&backend);
    let router = router_for(&gateway_config(backend.base_url(), true));

    let (status, body) = send(
        &router,
        post_as_tenant("/weather/get_weather", json!({"arguments": {"city": "Berlin"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["temp_c"], 18);
    invoke.assert();
}

#[tokio::test]
async fn malformed_json_body_is_rejected_before_invocation() {
    let backend = MockServer::start();
    let (discovery, invoke) = mock_backend(&backend);
    let router = router_for(&gateway_config(backend.base_url(), true));

    let request = Request::builder()
        .method("POST")
        .uri("/weather/get_weather")
        .header("content-type", "application/json")
        .header("x-user-email", "dev@example.com")
        .header("x-user-groups", "Test-Tenant")
        .body(Body::from(r#"{"city": "Berlin""#))
        .unwrap();
    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
    discovery.assert_hits(0);
    invoke.assert_hits(0);
}

#[tokio::test]
async fn db_group_grants_apply_to_header_identities() {
    let backend = MockServer::start();
    mock_backend(&backend);
    let store = Arc::new(MemoryStore::new());
    store
        .add_group_server_mapping(
            mcpgate_core::GroupName::new("Tenant-Google"),
            mcpgate_core::ServerId::new("weather"),
        )
        .await;
    let router = create_router(AppState::with_store(
        &gateway_config(backend.base_url(), true),
        store,
    ));

    // "Tenant-Google" has no static allow-list entry; its only grant for
    // "weather" lives in the database mapping.
    let request = Request::builder()
        .method("GET")
        .uri("/servers")
        .header("x-user-email", "dev@example.com")
        .header("x-user-groups", "Tenant-Google")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["servers"]["local"][0]["id"], "weather");
}

#[tokio::test]
async fn invoking_an_unauthorized_server_is_forbidden_without_backend_io() {
    let backend = MockServer::start();
    let (discovery, invoke) = mock_backend(&backend);
    let router = router_for(&gateway_config(backend.base_url(), true));

    let (status, body) = send(&router, post_as_tenant("/restricted/anything", json!({}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
    discovery.assert_hits(0);
    invoke.assert_hits(0);
}

#[tokio::test]
async fn unknown_and_disabled_servers_are_not_found() {
    let backend = MockServer::start();
    let router = router_for(&gateway_config(backend.base_url(), true));
    let (status, _) = send(&router, post_as_tenant("/ghost/tool", json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let disabled = router_for(&gateway_config(backend.base_url(), false));
    let (status, body) = send(&disabled, post_as_tenant("/weather/get_weather", json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    // Disabled servers vanish from the listing too.
    let (_, body) = send(&disabled, get_as_tenant("/servers")).await;
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn superuser_reaches_every_enabled_server() {
    let backend = MockServer::start();
    let router = router_for(&gateway_config(backend.base_url(), true));

    let request = Request::builder()
        .method("GET")
        .uri("/servers")
        .header("x-user-email", "root@example.com")
        .header("x-user-groups", "MCP-Admin")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 2);
}

#[tokio::test]
async fn refresh_invalidates_the_catalog_cache() {
    let backend = MockServer::start();
    let (discovery, _) = mock_backend(&backend);
    let router = router_for(&gateway_config(backend.base_url(), true));

    send(&router, get_as_tenant("/tools")).await;
    send(&router, get_as_tenant("/tools")).await;
    discovery.assert_hits(1);

    let (status, _) = send(&router, post_as_tenant("/refresh", json!({}))).await;
    assert_eq!(status, StatusCode::OK);

    send(&router, get_as_tenant("/tools")).await;
    discovery.assert_hits(2);
}

#[tokio::test]
async fn partial_backend_failure_degrades_instead_of_failing() {
    let backend = MockServer::start();
    mock_backend(&backend);
    let router = router_for(&gateway_config(backend.base_url(), true));

    let request = Request::builder()
        .method("GET")
        .uri("/tools")
        .header("x-user-email", "root@example.com")
        .header("x-user-groups", "MCP-Admin")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["count"], 1);
    assert_eq!(body["data"]["degraded_servers"][0], "restricted");
}

#[tokio::test]
async fn single_server_listing_checks_authorization() {
    let backend = MockServer::start();
    mock_backend(&backend);
    let router = router_for(&gateway_config(backend.base_url(), true));

    let (status, body) = send(&router, get_as_tenant("/weather")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["server"]["id"], "weather");
    assert_eq!(body["data"]["tools"][0]["name"], "weather/get_weather");
    assert_eq!(body["data"]["degraded"], false);

    let (status, _) = send(&router, get_as_tenant("/restricted")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&router, get_as_tenant("/ghost")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn openapi_document_reflects_authorized_tools() {
    let backend = MockServer::start();
    mock_backend(&backend);
    let router = router_for(&gateway_config(backend.base_url(), true));

    let (status, body) = send(&router, get_as_tenant("/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["openapi"], "3.0.3");
    assert!(body["paths"].get("/weather/get_weather").is_some());
    assert!(body["paths"].get("/restricted").is_none());
}
