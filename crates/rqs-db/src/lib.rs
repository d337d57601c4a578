//! rqs-db
//!
//! Persistence for requisitions, comments and orders behind the
//! [`RequisitionStore`] trait. [`PgStore`] is the production backend;
//! [`MemStore`] backs local runs and tests.

mod mem;
mod pg;

pub use mem::MemStore;
pub use pg::PgStore;

use anyhow::{Context, Result};
use rqs_schemas::{Comment, Order, Requisition, RequisitionStatus};
use rqs_workflow::{OrderSearchParams, RequisitionSearchParams};
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

pub const ENV_DB_URL: &str = "RQS_DATABASE_URL";

/// Connect to Postgres using RQS_DATABASE_URL.
pub async fn connect_from_env() -> Result<PgPool> {
    let url = std::env::var(ENV_DB_URL)
        .with_context(|| format!("missing env var {ENV_DB_URL}"))?;
    connect(&url).await
}

pub async fn connect(url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(url)
        .await
        .context("failed to connect to Postgres")?;

    Ok(pool)
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

/// Simple status query (connectivity + schema presence).
pub async fn status(pool: &PgPool) -> Result<DbStatus> {
    let (one,): (i32,) = sqlx::query_as::<_, (i32,)>("select 1")
        .fetch_one(pool)
        .await
        .context("status connectivity query failed")?;
    let ok = one == 1;

    let (has_requisitions_table,): (bool,) = sqlx::query_as::<_, (bool,)>(
        r#"
        select exists (
            select 1
            from information_schema.tables
            where table_schema='public' and table_name='requisitions'
        )
        "#,
    )
    .fetch_one(pool)
    .await
    .context("status table-exists query failed")?;

    Ok(DbStatus {
        ok,
        has_requisitions_table,
    })
}

#[derive(Debug, Clone)]
pub struct DbStatus {
    pub ok: bool,
    pub has_requisitions_table: bool,
}

/// Count requisitions still moving through approval: SUBMITTED, AUTHORIZED
/// or APPROVED. The CLI refuses to migrate over these without `--yes`.
pub async fn count_in_flight_requisitions(pool: &PgPool) -> Result<i64> {
    // No schema yet: nothing in flight.
    let st = status(pool).await?;
    if !st.has_requisitions_table {
        return Ok(0);
    }

    let (n,): (i64,) = sqlx::query_as::<_, (i64,)>(
        r#"
        select count(*)::bigint
        from requisitions
        where status in ('SUBMITTED','AUTHORIZED','APPROVED')
        "#,
    )
    .fetch_one(pool)
    .await
    .context("count_in_flight_requisitions failed")?;

    Ok(n)
}

/// Storage collaborator for the requisition service.
///
/// Every method is one bounded call. There is no cross-call transaction:
/// a read followed by a write is a read-modify-write race that callers
/// accept.
#[async_trait::async_trait]
pub trait RequisitionStore: Send + Sync {
    fn backend_name(&self) -> &'static str;

    // -- requisitions -------------------------------------------------------

    async fn find_requisition(&self, id: Uuid) -> Result<Option<Requisition>>;

    /// Insert or replace by id.
    async fn save_requisition(&self, r: &Requisition) -> Result<()>;

    /// Removes the requisition and its comments. `false` when absent.
    async fn delete_requisition(&self, id: Uuid) -> Result<bool>;

    async fn list_requisitions(&self) -> Result<Vec<Requisition>>;

    /// Conjunctive search, ordered by created date then id.
    async fn search_requisitions(&self, params: &RequisitionSearchParams) -> Result<Vec<Requisition>>;

    /// The non-emergency requisition for a (facility, program, period) triple.
    async fn find_regular_requisition(
        &self,
        facility: Uuid,
        program: Uuid,
        processing_period: Uuid,
    ) -> Result<Option<Requisition>>;

    async fn requisitions_by_creator(&self, creator: Uuid) -> Result<Vec<Requisition>>;

    /// Requisitions routed through `node` with the given status.
    async fn requisitions_by_supervisory_node(
        &self,
        node: Uuid,
        status: RequisitionStatus,
    ) -> Result<Vec<Requisition>>;

    // -- comments -----------------------------------------------------------

    /// Insert or replace by id. New comments append to their requisition's list.
    async fn save_comment(&self, c: &Comment) -> Result<()>;

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>>;

    /// Creation order: created date, then insertion.
    async fn comments_for(&self, requisition: Uuid) -> Result<Vec<Comment>>;

    async fn delete_comment(&self, id: Uuid) -> Result<bool>;

    // -- orders -------------------------------------------------------------

    /// Insert or replace by id.
    async fn save_order(&self, o: &Order) -> Result<()>;

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>>;

    async fn list_orders(&self) -> Result<Vec<Order>>;

    async fn search_orders(&self, params: &OrderSearchParams) -> Result<Vec<Order>>;

    async fn delete_order(&self, id: Uuid) -> Result<bool>;
}
