//! Runtime secret resolution.
//!
//! # Contract
//! - Config YAML stores only env var NAMES (`secrets.*_env`).
//! - Callers invoke [`resolve_secrets`] once at startup and pass the result
//!   into constructors; no other code reads these variables.
//! - `Debug` on [`ResolvedSecrets`] redacts every value.
//! - Errors name the env var, never its value.
//!
//! # Enforcement
//! | Condition                  | Required           |
//! |----------------------------|--------------------|
//! | `store.backend: postgres`  | database URL       |
//! | `auth.required: true`      | token signing key  |
//!
//! The reference-data bearer token is always optional.

use crate::{ServiceConfig, StoreBackend};
use anyhow::{bail, Result};

#[derive(Clone)]
pub struct ResolvedSecrets {
    pub database_url: Option<String>,
    /// HS256 key used to verify (and in tests, mint) bearer tokens.
    pub token_secret: Option<String>,
    /// Bearer token forwarded to the reference-data service.
    pub referencedata_token: Option<String>,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "<REDACTED>"),
            )
            .field(
                "token_secret",
                &self.token_secret.as_ref().map(|_| "<REDACTED>"),
            )
            .field(
                "referencedata_token",
                &self.referencedata_token.as_ref().map(|_| "<REDACTED>"),
            )
            .finish()
    }
}

/// Unset or blank reads as `None`.
fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Resolve every secret the config names from the process environment.
pub fn resolve_secrets(cfg: &ServiceConfig) -> Result<ResolvedSecrets> {
    resolve_secrets_with(cfg, resolve_env)
}

/// Same as [`resolve_secrets`] with an injectable lookup.
pub fn resolve_secrets_with<F>(cfg: &ServiceConfig, lookup: F) -> Result<ResolvedSecrets>
where
    F: Fn(&str) -> Option<String>,
{
    let names = &cfg.secrets;
    let database_url = lookup(&names.database_url_env);
    let token_secret = lookup(&names.token_secret_env);
    let referencedata_token = lookup(&names.referencedata_token_env);

    if cfg.store.backend == StoreBackend::Postgres && database_url.is_none() {
        bail!(
            "SECRETS_MISSING store=postgres: required env var '{}' (database url) is not set or empty",
            names.database_url_env,
        );
    }
    if cfg.auth.required && token_secret.is_none() {
        bail!(
            "SECRETS_MISSING auth.required=true: required env var '{}' (token signing key) is not set or empty",
            names.token_secret_env,
        );
    }

    Ok(ResolvedSecrets {
        database_url,
        token_secret,
        referencedata_token,
    })
}
