//! Bearer token security tests

use apimux_gateway::auth::{sign_claims, HmacTokenDecoder, TokenDecoder};
use serde_json::json;
use tests::{fixtures, TEST_CLIENT_ID, TEST_JWT_SECRET};

fn decoder() -> HmacTokenDecoder {
    HmacTokenDecoder::new(TEST_JWT_SECRET)
}

#[test]
fn test_admin_fixture_round_trips_with_typed_accessors() {
    let token = fixtures::signed_token(&fixtures::admin_claims(TEST_CLIENT_ID));

    let claims = decoder().decode(&token).expect("Token should decode");
    assert!(claims.has_scope("gateway.read"));
    assert!(claims
        .realm_roles()
        .contains(&"gateway_admin_realm".to_string()));
    assert!(claims
        .client_roles(TEST_CLIENT_ID)
        .contains(&"gateway_admin".to_string()));
    assert!(claims.teams().is_empty());
}

#[test]
fn test_team_fixture_exposes_team_memberships() {
    let token = fixtures::signed_token(&fixtures::admin_claims_for_team(
        TEST_CLIENT_ID,
        "team-alpha",
    ));

    let claims = decoder().decode(&token).expect("Token should decode");
    assert_eq!(claims.teams(), vec!["tm_team-alpha".to_string()]);
}

#[test]
fn test_signature_binds_the_payload() {
    // Two tokens validly signed with the same secret
    let token_a = sign_claims(&json!({ "sub": "alice" }), TEST_JWT_SECRET);
    let token_b = sign_claims(&json!({ "sub": "bob" }), TEST_JWT_SECRET);

    let payload_a = token_a.split('.').next().unwrap();
    let signature_b = token_b.split('.').nth(1).unwrap();

    // Splicing alice's payload onto bob's signature must not verify
    let spliced = format!("{payload_a}.{signature_b}");
    assert!(decoder().decode(&spliced).is_none());

    // The unmodified tokens still do
    assert!(decoder().decode(&token_a).is_some());
    assert!(decoder().decode(&token_b).is_some());
}

#[test]
fn test_truncated_and_padded_tokens_are_rejected() {
    let token = fixtures::signed_token(&fixtures::admin_claims(TEST_CLIENT_ID));

    let truncated = &token[..token.len() - 2];
    assert!(decoder().decode(truncated).is_none());

    let padded = format!("{token}xx");
    assert!(decoder().decode(&padded).is_none());
}

#[test]
fn test_missing_claim_structures_never_panic() {
    // Minimal payload with none of the optional structures
    let token = sign_claims(&json!({ "sub": "bare" }), TEST_JWT_SECRET);
    let claims = decoder().decode(&token).expect("Token should decode");

    assert_eq!(claims.subject(), Some("bare"));
    assert!(claims.scope().is_none());
    assert!(claims.scopes().is_empty());
    assert!(claims.realm_roles().is_empty());
    assert!(claims.client_roles(TEST_CLIENT_ID).is_empty());
    assert!(claims.teams().is_empty());
    assert!(claims.team_id().is_none());
}

#[test]
fn test_malformed_claim_structures_degrade_to_empty() {
    // Wrong shapes: scope as number, roles as string, teams as object
    let mut payload = json!({
        "sub": "odd",
        "scope": 42,
        "realm_access": "admin",
        "teams": { "team": "alpha" },
    });
    payload["resource_access"][TEST_CLIENT_ID] = json!("gateway_admin");
    let token = sign_claims(&payload, TEST_JWT_SECRET);

    let claims = decoder().decode(&token).expect("Token should decode");
    assert!(claims.scope().is_none());
    assert!(claims.realm_roles().is_empty());
    assert!(claims.client_roles(TEST_CLIENT_ID).is_empty());
    assert!(claims.teams().is_empty());
}

#[test]
fn test_expiration_boundary() {
    // A token expiring well in the future decodes; one already past does not
    let future = sign_claims(
        &json!({ "sub": "x", "exp": chrono::Utc::now().timestamp() + 60 }),
        TEST_JWT_SECRET,
    );
    assert!(decoder().decode(&future).is_some());

    let past = sign_claims(
        &json!({ "sub": "x", "exp": chrono::Utc::now().timestamp() - 1 }),
        TEST_JWT_SECRET,
    );
    assert!(decoder().decode(&past).is_none());
}
