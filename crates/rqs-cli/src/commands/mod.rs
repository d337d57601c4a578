//! Command handler modules for rqs.
//!
//! Shared wiring used by several commands lives here. Command-specific logic
//! lives in the submodules.

pub mod order;
pub mod release;

use std::sync::Arc;

use anyhow::{Context, Result};
use rqs_service::RequisitionService;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Parse one id argument, naming it in the error.
pub fn parse_id(what: &str, raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).with_context(|| format!("invalid {what} id: {raw}"))
}

/// Service over the Postgres store, with reference data and settings from
/// the layered config named by `RQS_CONFIG`.
pub async fn pg_service() -> Result<RequisitionService> {
    let loaded = rqs_config::load_from_env()?;
    let mut cfg = rqs_config::ServiceConfig::from_config_json(&loaded.config_json)?;
    // The CLI talks to Postgres directly and verifies no bearer tokens.
    cfg.store.backend = rqs_config::StoreBackend::Postgres;
    cfg.auth.required = false;
    let secrets = rqs_config::resolve_secrets(&cfg)?;
    tracing::info!(config_hash = %loaded.config_hash, "config loaded");

    let url = secrets
        .database_url
        .as_deref()
        .with_context(|| format!("missing env var {}", cfg.secrets.database_url_env))?;
    let pool = rqs_db::connect(url).await?;
    let store = Arc::new(rqs_db::PgStore::new(pool));
    let refdata = rqs_service::bootstrap::refdata_from_config(&cfg, &secrets)?;
    let settings = Arc::new(rqs_config::ConfigSettings::new(&cfg));

    Ok(RequisitionService::new(store, refdata, settings))
}
