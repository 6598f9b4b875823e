//! Token team resolution over the full HTTP stack
//!
//! Signed bearer tokens carry team membership in several shapes; these
//! tests pin down which shape wins and how the `x-team-id` header
//! interacts with each of them.

use pretty_assertions::assert_eq;
use serde_json::json;
use tests::gateway::TestGateway;
use tests::{fixtures, TEST_CLIENT_ID};

fn token_with_team_id_claim(team: &str) -> String {
    let mut claims = fixtures::admin_claims(TEST_CLIENT_ID);
    claims["team_id"] = json!(team);
    fixtures::signed_token(&claims)
}

fn token_with_teams(teams: &[&str]) -> String {
    let mut claims = fixtures::admin_claims(TEST_CLIENT_ID);
    claims["teams"] = json!(teams);
    fixtures::signed_token(&claims)
}

async fn get_for_team(
    gw: &TestGateway,
    path: &str,
    token: &str,
    team: &str,
) -> reqwest::Response {
    gw.client
        .get(gw.url(path))
        .bearer_auth(token)
        .header("x-team-id", team)
        .send()
        .await
        .expect("request failed")
}

#[tokio::test(flavor = "multi_thread")]
async fn test_explicit_team_id_claim_resolves_the_acting_team() {
    let gw = TestGateway::spawn().await;
    gw.seed_route_with_use("inventory-service", "team-alpha").await;

    let resp = gw
        .get_with_bearer(
            "/r/inventory-service/items",
            &token_with_team_id_claim("team-alpha"),
        )
        .await;
    assert_eq!(resp.status(), 502);

    let resp = gw
        .get_with_bearer(
            "/r/inventory-service/items",
            &token_with_team_id_claim("team-ghost"),
        )
        .await;
    assert_eq!(resp.status(), 403);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_requested_team_may_match_the_team_id_claim() {
    let gw = TestGateway::spawn().await;
    gw.seed_route_with_use("inventory-service", "team-alpha").await;
    let token = token_with_team_id_claim("team-alpha");

    // The header legitimizes against the team_id claim even when no
    // teams array is present, prefixed or not
    let resp = get_for_team(&gw, "/r/inventory-service/items", &token, "team-alpha").await;
    assert_eq!(resp.status(), 502);

    let resp = get_for_team(&gw, "/r/inventory-service/items", &token, "tm_team-alpha").await;
    assert_eq!(resp.status(), 502);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_team_entries_work_with_and_without_prefix() {
    let gw = TestGateway::spawn().await;
    gw.seed_route_with_use("alpha-service", "team-alpha").await;
    gw.seed_route_with_use("beta-service", "team-beta").await;

    // Prefixed entries are normalized down to the stored team id
    let resp = gw
        .get_with_bearer(
            "/r/alpha-service/items",
            &token_with_teams(&["tm_team-alpha"]),
        )
        .await;
    assert_eq!(resp.status(), 502);

    // Bare entries pass through normalization unchanged
    let resp = gw
        .get_with_bearer("/r/beta-service/items", &token_with_teams(&["team-beta"]))
        .await;
    assert_eq!(resp.status(), 502);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_first_listed_team_is_the_default() {
    let gw = TestGateway::spawn().await;
    let route = gw.seed_route("shared-service").await;
    gw.grant_use("team-beta", &route).await;
    let token = token_with_teams(&["tm_team-alpha", "tm_team-beta"]);

    // Without a header the first membership acts, and team-alpha holds
    // no grant here
    let resp = gw.get_with_bearer("/r/shared-service/items", &token).await;
    assert_eq!(resp.status(), 403);

    // Selecting the granted membership explicitly flips the outcome
    let resp = get_for_team(&gw, "/r/shared-service/items", &token, "team-beta").await;
    assert_eq!(resp.status(), 502);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_key_callers_ignore_requested_team_headers() {
    let gw = TestGateway::spawn().await;
    gw.seed_route_with_use("inventory-service", "team-alpha").await;
    let key = gw.seed_api_key("team-alpha", "ci-deploy").await;

    // The key fixes the team before resolution; the header cannot
    // reassign a key caller to another team
    let resp = gw
        .client
        .get(gw.url("/r/inventory-service/items"))
        .header("x-api-key", &key)
        .header("x-team-id", "team-beta")
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), 502);
}
