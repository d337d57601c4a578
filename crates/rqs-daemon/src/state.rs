//! Shared runtime state for rqs-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The service owns its
//! collaborators; this module only carries it alongside build and auth info.

use std::sync::Arc;

use anyhow::Result;
use rqs_config::{ResolvedSecrets, ServiceConfig};
use rqs_service::RequisitionService;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

/// Static build metadata included in health / version responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
    /// `RQS_BUILD` at compile time, `"dev"` otherwise.
    pub build: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            service: "rqs-daemon",
            version: env!("CARGO_PKG_VERSION"),
            build: option_env!("RQS_BUILD").unwrap_or("dev"),
        }
    }
}

// ---------------------------------------------------------------------------
// AuthSettings
// ---------------------------------------------------------------------------

/// Bearer-token policy.
#[derive(Clone)]
pub struct AuthSettings {
    /// When true, every route except /version and /health needs a valid token.
    pub required: bool,
    /// HS256 key. `None` means no token can verify.
    pub secret: Option<String>,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("required", &self.required)
            .field("secret", &self.secret.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

impl AuthSettings {
    pub fn disabled() -> Self {
        Self {
            required: false,
            secret: None,
        }
    }

    pub fn required(secret: impl Into<String>) -> Self {
        Self {
            required: true,
            secret: Some(secret.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

pub struct AppState {
    pub build: BuildInfo,
    pub service: Arc<RequisitionService>,
    pub auth: AuthSettings,
}

impl AppState {
    pub fn new(service: Arc<RequisitionService>, auth: AuthSettings) -> Self {
        Self {
            build: BuildInfo::current(),
            service,
            auth,
        }
    }

    /// Wire the service and auth policy from the loaded config.
    pub async fn from_config(cfg: &ServiceConfig, secrets: &ResolvedSecrets) -> Result<Self> {
        let service = RequisitionService::from_config(cfg, secrets).await?;
        let auth = AuthSettings {
            required: cfg.auth.required,
            secret: secrets.token_secret.clone(),
        };
        Ok(Self::new(Arc::new(service), auth))
    }
}
