//! Scenario: bearer-token policy.
//!
//! # Coverage
//! 1. With auth required, a request without a token is 401 and carries a
//!    JSON error body.
//! 2. /health and /version stay public.
//! 3. A valid token in the header or the `access_token` query parameter is
//!    accepted; an expired or foreign-key token is 401.
//! 4. With auth disabled and no key, reads work and principal-only routes
//!    are 401.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use rqs_daemon::{
    routes,
    state::{AppState, AuthSettings},
};
use rqs_testkit::{mint_token, tokens::mint_token_with_ttl, World, TEST_TOKEN_SECRET};
use tower::ServiceExt; // oneshot

fn router(world: &World, auth: AuthSettings) -> axum::Router {
    let h = world.harness();
    routes::build_router(Arc::new(AppState::new(h.service, auth)))
}

async fn status_of(router: axum::Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let resp = router.oneshot(req).await.expect("oneshot failed");
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_with_bearer(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn missing_token_is_401_when_required() {
    let world = World::new();
    let (status, body) = status_of(
        router(&world, AuthSettings::required(TEST_TOKEN_SECRET)),
        get("/requisitions"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "authentication required");
}

#[tokio::test]
async fn health_and_version_are_public() {
    let world = World::new();
    for uri in ["/health", "/version"] {
        let (status, _) = status_of(
            router(&world, AuthSettings::required(TEST_TOKEN_SECRET)),
            get(uri),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn header_and_query_tokens_are_accepted() {
    let world = World::new();
    let token = mint_token(TEST_TOKEN_SECRET, world.clerk.id, "clerk").unwrap();

    let (status, _) = status_of(
        router(&world, AuthSettings::required(TEST_TOKEN_SECRET)),
        get_with_bearer("/requisitions", &token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = status_of(
        router(&world, AuthSettings::required(TEST_TOKEN_SECRET)),
        get(&format!("/requisitions?access_token={token}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn expired_or_foreign_tokens_are_401() {
    let world = World::new();

    let expired = mint_token_with_ttl(
        TEST_TOKEN_SECRET,
        world.clerk.id,
        "clerk",
        chrono::Duration::hours(-2),
    )
    .unwrap();
    let (status, body) = status_of(
        router(&world, AuthSettings::required(TEST_TOKEN_SECRET)),
        get_with_bearer("/requisitions", &expired),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid or expired token");

    let foreign = mint_token("some-other-key", world.clerk.id, "clerk").unwrap();
    let (status, _) = status_of(
        router(&world, AuthSettings::required(TEST_TOKEN_SECRET)),
        get_with_bearer("/requisitions", &foreign),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn disabled_auth_allows_reads_but_not_principal_routes() {
    let world = World::new();

    let (status, _) = status_of(
        router(&world, AuthSettings::disabled()),
        get("/requisitions"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = status_of(
        router(&world, AuthSettings::disabled()),
        get("/requisitions/requisitions-for-approval"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "authentication required");
}
