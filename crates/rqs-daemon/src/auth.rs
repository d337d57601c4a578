//! Bearer-token authentication.
//!
//! [`authenticate`] runs on every request. A valid HS256 token (from the
//! `Authorization` header or the `access_token` query parameter) puts a
//! [`Principal`] into the request extensions. Handlers that need a user take
//! `Principal` as an extractor and reject with 401 when it is absent.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// Routes reachable without a token even when auth is required.
const PUBLIC_PATHS: &[&str] = &["/version", "/health"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: Uuid,
    #[serde(default)]
    pub username: String,
    pub exp: usize,
    #[serde(default)]
    pub iat: usize,
}

/// The authenticated user for this request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub username: String,
}

pub fn issue_token(
    secret: &str,
    user_id: Uuid,
    username: &str,
    ttl: chrono::Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (now + ttl).timestamp().max(0) as usize,
        iat: now.timestamp().max(0) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_token(secret: &str, token: &str) -> Result<Principal, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(Principal {
        user_id: data.claims.sub,
        username: data.claims.username,
    })
}

/// Header first, then `?access_token=`.
fn bearer_token(request: &Request) -> Option<String> {
    if let Some(token) = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        return Some(token.trim().to_string());
    }

    request.uri().query()?.split('&').find_map(|pair| {
        pair.strip_prefix("access_token=")
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    })
}

pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let public = PUBLIC_PATHS.contains(&request.uri().path());
    let token = bearer_token(&request);

    let principal = match (&token, &state.auth.secret) {
        (Some(token), Some(secret)) => match verify_token(secret, token) {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::debug!(error = %e, "bearer token rejected");
                if state.auth.required && !public {
                    return Err(unauthorized("invalid or expired token"));
                }
                None
            }
        },
        _ => None,
    };

    match principal {
        Some(p) => {
            request.extensions_mut().insert(p);
        }
        None if state.auth.required && !public => {
            return Err(unauthorized("authentication required"));
        }
        None => {}
    }

    Ok(next.run(request).await)
}

fn unauthorized(msg: &str) -> Response {
    ApiError::new(StatusCode::UNAUTHORIZED, msg).into_response()
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "authentication required"))
    }
}
