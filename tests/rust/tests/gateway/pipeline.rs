//! Request pipeline plumbing over the full HTTP stack
//!
//! Authentication outcomes, CORS handling, and the fallback handoff,
//! as seen by a real HTTP client.

use reqwest::StatusCode;
use serde_json::Value;
use tests::fixtures;
use tests::gateway::TestGateway;
use tests::TEST_CLIENT_ID;

// Import the trait to use its methods
use apimux_core::ApiKeyRepository;

#[tokio::test(flavor = "multi_thread")]
async fn health_reports_service_metadata() {
    let gw = TestGateway::spawn().await;

    let response = gw.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["version"].as_str().is_some_and(|v| !v.is_empty()));
}

#[tokio::test(flavor = "multi_thread")]
async fn allowed_requests_reach_the_upstream_handoff() {
    let gw = TestGateway::spawn().await;
    gw.seed_route_with_use("inventory-service", "team-alpha")
        .await;
    let raw_key = gw.seed_api_key("team-alpha", "ci").await;

    let response = gw
        .client
        .get(gw.url("/r/inventory-service/items"))
        .header("x-api-key", &raw_key)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "upstream_unavailable");
}

#[tokio::test(flavor = "multi_thread")]
async fn cors_preflight_is_answered_at_the_edge() {
    let gw = TestGateway::spawn().await;

    // Preflight for a path that would otherwise be denied
    let response = gw
        .client
        .request(reqwest::Method::OPTIONS, gw.url("/r/ghost-service/items"))
        .header("origin", "https://dashboard.example")
        .header("access-control-request-method", "POST")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn plain_options_requests_bypass_authorization() {
    let gw = TestGateway::spawn().await;

    // Not a preflight (no Origin); flows through to the fallback while
    // a GET on the same path would be denied
    let response = gw
        .client
        .request(reqwest::Method::OPTIONS, gw.url("/r/ghost-service/items"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let response = gw.get("/r/ghost-service/items").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_api_keys_are_rejected_with_a_challenge() {
    let gw = TestGateway::spawn().await;
    gw.seed_route_with_use("inventory-service", "team-alpha")
        .await;

    let response = gw
        .client
        .get(gw.url("/r/inventory-service/items"))
        .header("x-api-key", "amx_definitely_not_a_real_key_material")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let challenge = response
        .headers()
        .get("www-authenticate")
        .and_then(|v| v.to_str().ok())
        .expect("401 must carry a challenge");
    assert!(challenge.contains("invalid_key"));
}

#[tokio::test(flavor = "multi_thread")]
async fn revoked_api_keys_stop_authenticating() {
    let gw = TestGateway::spawn().await;
    gw.seed_route_with_use("inventory-service", "team-alpha")
        .await;
    let raw_key = gw.seed_api_key("team-alpha", "ci").await;

    let before = gw
        .client
        .get(gw.url("/r/inventory-service/items"))
        .header("x-api-key", &raw_key)
        .send()
        .await
        .unwrap();
    assert_eq!(before.status(), StatusCode::BAD_GATEWAY);

    // Revocation is checked on every request, not cached
    let keys = gw.api_keys.list_for_team("team-alpha").await.unwrap();
    gw.api_keys.revoke(&keys[0].id).await.unwrap();

    let after = gw
        .client
        .get(gw.url("/r/inventory-service/items"))
        .header("x-api-key", &raw_key)
        .send()
        .await
        .unwrap();
    assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test(flavor = "multi_thread")]
async fn api_keys_are_ignored_off_route_paths() {
    let gw = TestGateway::spawn().await;
    let raw_key = gw.seed_api_key("team-alpha", "ci").await;

    // On a management path the key is not consulted; the caller counts
    // as anonymous and is denied by authorization, not authentication
    let response = gw
        .client
        .get(gw.url("/mesh/topology"))
        .header("x-api-key", &raw_key)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_authorization_headers_are_rejected() {
    let gw = TestGateway::spawn().await;

    let response = gw
        .client
        .get(gw.url("/mesh/topology"))
        .header("authorization", "Basic dXNlcjpwYXNz")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test(flavor = "multi_thread")]
async fn bearer_and_key_credentials_coexist() {
    let gw = TestGateway::spawn().await;
    gw.seed_route_with_use("inventory-service", "team-alpha")
        .await;
    let raw_key = gw.seed_api_key("team-alpha", "ci").await;

    // On route paths the key wins even when a (useless) bearer token is
    // also present
    let token = fixtures::signed_token(&fixtures::admin_claims(TEST_CLIENT_ID));
    let response = gw
        .client
        .get(gw.url("/r/inventory-service/items"))
        .header("x-api-key", &raw_key)
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
