//! API key flows across storage, cache, and HTTP
//!
//! Scenarios run against a real SQLite database behind a running
//! gateway, so repository writes and permission cache lifetimes
//! interact the same way they do in a deployment.

use apimux_core::ApiKeyRepository;
use apimux_gateway::auth::ApiKey;
use chrono::Duration;
use pretty_assertions::assert_eq;
use tests::gateway::TestGateway;

async fn get_with_key(gw: &TestGateway, path: &str, key: &str) -> reqwest::Response {
    gw.client
        .get(gw.url(path))
        .header("x-api-key", key)
        .send()
        .await
        .expect("request failed")
}

#[tokio::test(flavor = "multi_thread")]
async fn test_routes_registered_after_a_denial_work_immediately() {
    let gw = TestGateway::spawn().await;
    let key = gw.seed_api_key("team-alpha", "ci-deploy").await;

    // Nothing is registered under this identifier yet
    let resp = get_with_key(&gw, "/r/late-service/items", &key).await;
    assert_eq!(resp.status(), 403);

    gw.seed_route_with_use("late-service", "team-alpha").await;

    // Unknown-route denials are never cached, so the new route is
    // visible on the very next request
    let resp = get_with_key(&gw, "/r/late-service/items", &key).await;
    assert_eq!(resp.status(), 502);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_grant_revocation_waits_out_the_cache() {
    let gw = TestGateway::spawn().await;
    let route = gw.seed_route_with_use("inventory-service", "team-alpha").await;
    let key = gw.seed_api_key("team-alpha", "ci-deploy").await;

    let resp = get_with_key(&gw, "/r/inventory-service/items", &key).await;
    assert_eq!(resp.status(), 502);

    gw.grants
        .remove_grant("team-alpha", &route.id)
        .await
        .expect("remove grant");

    // The allow computed above is served from cache until its TTL
    // expires; grant revocation is eventually consistent
    let resp = get_with_key(&gw, "/r/inventory-service/items", &key).await;
    assert_eq!(resp.status(), 502);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_key_revocation_bites_immediately() {
    let gw = TestGateway::spawn().await;
    gw.seed_route_with_use("inventory-service", "team-alpha").await;
    let key = gw.seed_api_key("team-alpha", "ci-deploy").await;

    let resp = get_with_key(&gw, "/r/inventory-service/items", &key).await;
    assert_eq!(resp.status(), 502);

    let records = gw.api_keys.list_for_team("team-alpha").await.unwrap();
    gw.api_keys.revoke(&records[0].id).await.unwrap();

    // Authentication reads the repository on every request, so unlike
    // grants there is no cache window to wait out
    let resp = get_with_key(&gw, "/r/inventory-service/items", &key).await;
    assert_eq!(resp.status(), 401);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_teams_are_isolated_end_to_end() {
    let gw = TestGateway::spawn().await;
    gw.seed_route_with_use("alpha-service", "team-alpha").await;
    gw.seed_route_with_use("beta-service", "team-beta").await;
    let alpha_key = gw.seed_api_key("team-alpha", "alpha-ci").await;
    let beta_key = gw.seed_api_key("team-beta", "beta-ci").await;

    let resp = get_with_key(&gw, "/r/alpha-service/items", &alpha_key).await;
    assert_eq!(resp.status(), 502);

    let resp = get_with_key(&gw, "/r/beta-service/items", &beta_key).await;
    assert_eq!(resp.status(), 502);

    // The key authenticates fine but its team holds no grant here
    let resp = get_with_key(&gw, "/r/beta-service/items", &alpha_key).await;
    assert_eq!(resp.status(), 403);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_expired_keys_are_rejected_end_to_end() {
    let gw = TestGateway::spawn().await;
    gw.seed_route_with_use("inventory-service", "team-alpha").await;

    let stale = ApiKey::generate_with_expiry("team-alpha", Duration::hours(-1));
    let stale_raw = stale.key.clone();
    gw.api_keys
        .create(&stale.into_record("stale-ci"))
        .await
        .unwrap();

    let resp = get_with_key(&gw, "/r/inventory-service/items", &stale_raw).await;
    assert_eq!(resp.status(), 401);

    let fresh = ApiKey::generate_with_expiry("team-alpha", Duration::hours(1));
    let fresh_raw = fresh.key.clone();
    gw.api_keys
        .create(&fresh.into_record("fresh-ci"))
        .await
        .unwrap();

    let resp = get_with_key(&gw, "/r/inventory-service/items", &fresh_raw).await;
    assert_eq!(resp.status(), 502);
}
