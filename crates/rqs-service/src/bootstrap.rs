//! Collaborator wiring from the loaded config. Shared by the daemon and CLI.

use crate::RequisitionService;
use anyhow::{Context, Result};
use rqs_config::{ConfigSettings, ResolvedSecrets, ServiceConfig, StoreBackend};
use rqs_db::{MemStore, PgStore, RequisitionStore};
use rqs_refdata::{HttpReferenceData, ReferenceDataProvider, StaticReferenceData};
use std::sync::Arc;
use tracing::info;

/// Build the store named by `store.backend`. Postgres runs migrations first.
pub async fn store_from_config(
    cfg: &ServiceConfig,
    secrets: &ResolvedSecrets,
) -> Result<Arc<dyn RequisitionStore>> {
    match cfg.store.backend {
        StoreBackend::Memory => Ok(Arc::new(MemStore::new())),
        StoreBackend::Postgres => {
            let url = secrets
                .database_url
                .as_deref()
                .with_context(|| format!("missing env var {}", cfg.secrets.database_url_env))?;
            let pool = rqs_db::connect(url).await?;
            rqs_db::migrate(&pool).await?;
            Ok(Arc::new(PgStore::new(pool)))
        }
    }
}

/// `base_url` wins over `fixture_path`; with neither, reference data is empty.
pub fn refdata_from_config(
    cfg: &ServiceConfig,
    secrets: &ResolvedSecrets,
) -> Result<Arc<dyn ReferenceDataProvider>> {
    if let Some(base_url) = &cfg.referencedata.base_url {
        return Ok(Arc::new(HttpReferenceData::new(
            base_url.clone(),
            secrets.referencedata_token.clone(),
        )));
    }
    if let Some(path) = &cfg.referencedata.fixture_path {
        return Ok(Arc::new(StaticReferenceData::from_path(path)?));
    }
    Ok(Arc::new(StaticReferenceData::default()))
}

impl RequisitionService {
    pub async fn from_config(cfg: &ServiceConfig, secrets: &ResolvedSecrets) -> Result<Self> {
        let store = store_from_config(cfg, secrets).await?;
        let refdata = refdata_from_config(cfg, secrets)?;
        info!(
            store = store.backend_name(),
            referencedata = refdata.source_name(),
            skip_authorization = cfg.service.skip_authorization,
            "requisition service wired"
        );
        Ok(Self::new(store, refdata, Arc::new(ConfigSettings::new(cfg))))
    }
}
