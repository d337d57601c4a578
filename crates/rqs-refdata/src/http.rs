//! HTTP-backed reference data.
//!
//! Resources are fetched from `{base_url}/api/<collection>/{id}`; a 404 is an
//! unknown id, any other non-success status is an error. The bearer token
//! is read by the caller from secrets and passed in; do not log it.

use crate::ReferenceDataProvider;
use anyhow::{anyhow, Context, Result};
use reqwest::StatusCode;
use rqs_schemas::{
    Facility, ProcessingPeriod, Product, Program, ProgramProduct, SupervisoryNode, SupplyLine,
    User,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct HttpReferenceData {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpReferenceData {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let req = self.http.get(self.url(path));
        match &self.token {
            Some(t) => req.bearer_auth(t),
            None => req,
        }
    }

    async fn fetch_one<T: DeserializeOwned>(&self, collection: &str, id: Uuid) -> Result<Option<T>> {
        let resp = self
            .get(&format!("{collection}/{id}"))
            .send()
            .await
            .with_context(|| format!("referencedata {collection} request failed"))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!(collection, %id, "referencedata miss");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(anyhow!(
                "referencedata {} http error status={}",
                collection,
                status.as_u16()
            ));
        }

        let body = resp
            .json::<T>()
            .await
            .with_context(|| format!("referencedata {collection} json decode failed"))?;
        Ok(Some(body))
    }

    async fn search<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<T>> {
        let resp = self
            .get(path)
            .query(query)
            .send()
            .await
            .with_context(|| format!("referencedata {path} request failed"))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!(
                "referencedata {} http error status={}",
                path,
                status.as_u16()
            ));
        }

        resp.json::<Vec<T>>()
            .await
            .with_context(|| format!("referencedata {path} json decode failed"))
    }
}

#[async_trait::async_trait]
impl ReferenceDataProvider for HttpReferenceData {
    fn source_name(&self) -> &'static str {
        "http"
    }

    async fn facility(&self, id: Uuid) -> Result<Option<Facility>> {
        self.fetch_one("facilities", id).await
    }

    async fn program(&self, id: Uuid) -> Result<Option<Program>> {
        self.fetch_one("programs", id).await
    }

    async fn processing_period(&self, id: Uuid) -> Result<Option<ProcessingPeriod>> {
        self.fetch_one("processingPeriods", id).await
    }

    async fn product(&self, id: Uuid) -> Result<Option<Product>> {
        self.fetch_one("products", id).await
    }

    async fn user(&self, id: Uuid) -> Result<Option<User>> {
        self.fetch_one("users", id).await
    }

    async fn supervisory_node(&self, id: Uuid) -> Result<Option<SupervisoryNode>> {
        self.fetch_one("supervisoryNodes", id).await
    }

    async fn program_products(&self, program: Uuid) -> Result<Vec<ProgramProduct>> {
        self.search("programProducts/search", &[("program", program.to_string())])
            .await
    }

    async fn supply_lines(&self, program: Uuid, supervisory_node: Uuid) -> Result<Vec<SupplyLine>> {
        self.search(
            "supplyLines/search",
            &[
                ("program", program.to_string()),
                ("supervisoryNode", supervisory_node.to_string()),
            ],
        )
        .await
    }
}
