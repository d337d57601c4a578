//! HS256 bearer tokens in the daemon's claim shape.

use anyhow::{Context, Result};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use uuid::Uuid;

/// Signing key for scenario tests. Not a credential.
pub const TEST_TOKEN_SECRET: &str = "rqs-testkit-signing-key";

/// Token for `user` valid for one hour.
pub fn mint_token(secret: &str, user: Uuid, username: &str) -> Result<String> {
    mint_token_with_ttl(secret, user, username, chrono::Duration::hours(1))
}

/// Negative `ttl` produces an already-expired token.
pub fn mint_token_with_ttl(
    secret: &str,
    user: Uuid,
    username: &str,
    ttl: chrono::Duration,
) -> Result<String> {
    let now = chrono::Utc::now();
    let claims = json!({
        "sub": user,
        "username": username,
        "iat": now.timestamp(),
        "exp": (now + ttl).timestamp(),
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .context("mint token failed")
}
