//! rqs-refdata
//!
//! Reference-data boundary. Facilities, programs, periods, products, users,
//! supervisory nodes and supply lines are owned by another service; this
//! crate resolves them by id.
//!
//! Lookups return `Ok(None)` for an unknown id. `Err` is reserved for
//! transport or decode failures so callers can tell "missing" from "broken".

pub mod http;
pub mod fixture;

pub use fixture::StaticReferenceData;
pub use http::HttpReferenceData;

use anyhow::Result;
use rqs_schemas::{
    Facility, ProcessingPeriod, Product, Program, ProgramProduct, SupervisoryNode, SupplyLine,
    User,
};
use uuid::Uuid;

#[async_trait::async_trait]
pub trait ReferenceDataProvider: Send + Sync {
    /// Short name for logs (e.g. `"http"`, `"static"`).
    fn source_name(&self) -> &'static str;

    async fn facility(&self, id: Uuid) -> Result<Option<Facility>>;

    async fn program(&self, id: Uuid) -> Result<Option<Program>>;

    async fn processing_period(&self, id: Uuid) -> Result<Option<ProcessingPeriod>>;

    async fn product(&self, id: Uuid) -> Result<Option<Product>>;

    async fn user(&self, id: Uuid) -> Result<Option<User>>;

    async fn supervisory_node(&self, id: Uuid) -> Result<Option<SupervisoryNode>>;

    /// Catalog entries for `program`, used to pre-populate lines at initiation.
    async fn program_products(&self, program: Uuid) -> Result<Vec<ProgramProduct>>;

    async fn supply_lines(&self, program: Uuid, supervisory_node: Uuid) -> Result<Vec<SupplyLine>>;
}
