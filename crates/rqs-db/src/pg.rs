use crate::RequisitionStore;
use anyhow::{Context, Result};
use rqs_schemas::{
    Comment, Order, OrderLineItem, OrderStatus, Requisition, RequisitionLine, RequisitionStatus,
};
use rqs_workflow::{OrderSearchParams, RequisitionSearchParams};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

const REQUISITION_COLUMNS: &str = r#"
  id,
  status,
  created_date,
  emergency,
  facility_id,
  program_id,
  processing_period_id,
  supervisory_node_id,
  creator_id,
  requisition_lines
"#;

const ORDER_COLUMNS: &str = r#"
  id,
  requisition_id,
  order_code,
  quoted_cost,
  status,
  program_id,
  created_by_id,
  requesting_facility_id,
  receiving_facility_id,
  supplying_facility_id,
  created_date,
  order_line_items
"#;

/// Postgres-backed store. Lines and order line items live in JSONB columns.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_requisitions(
        &self,
        mut qb: QueryBuilder<'_, Postgres>,
        what: &str,
    ) -> Result<Vec<Requisition>> {
        qb.push(" order by created_date, id");
        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("{what} failed"))?;
        rows.iter().map(requisition_from_row).collect()
    }
}

fn requisition_from_row(row: &PgRow) -> Result<Requisition> {
    let lines: Json<Vec<RequisitionLine>> = row.try_get("requisition_lines")?;
    Ok(Requisition {
        id: row.try_get("id")?,
        status: RequisitionStatus::parse(&row.try_get::<String, _>("status")?)?,
        created_date: row.try_get("created_date")?,
        emergency: row.try_get("emergency")?,
        facility: row.try_get("facility_id")?,
        program: row.try_get("program_id")?,
        processing_period: row.try_get("processing_period_id")?,
        supervisory_node: row.try_get("supervisory_node_id")?,
        creator: row.try_get("creator_id")?,
        requisition_lines: lines.0,
    })
}

fn comment_from_row(row: &PgRow) -> Result<Comment> {
    Ok(Comment {
        id: row.try_get("id")?,
        author: row.try_get("author_id")?,
        requisition: row.try_get("requisition_id")?,
        comment_text: row.try_get("comment_text")?,
        created_date: row.try_get("created_date")?,
    })
}

fn order_from_row(row: &PgRow) -> Result<Order> {
    let items: Json<Vec<OrderLineItem>> = row.try_get("order_line_items")?;
    Ok(Order {
        id: row.try_get("id")?,
        requisition: row.try_get("requisition_id")?,
        order_code: row.try_get("order_code")?,
        quoted_cost: row.try_get("quoted_cost")?,
        status: OrderStatus::parse(&row.try_get::<String, _>("status")?)?,
        program: row.try_get("program_id")?,
        created_by_id: row.try_get("created_by_id")?,
        requesting_facility: row.try_get("requesting_facility_id")?,
        receiving_facility: row.try_get("receiving_facility_id")?,
        supplying_facility: row.try_get("supplying_facility_id")?,
        created_date: row.try_get("created_date")?,
        order_line_items: items.0,
    })
}

#[async_trait::async_trait]
impl RequisitionStore for PgStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn find_requisition(&self, id: Uuid) -> Result<Option<Requisition>> {
        let row = sqlx::query(&format!(
            "select {REQUISITION_COLUMNS} from requisitions where id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("find_requisition failed")?;

        row.as_ref().map(requisition_from_row).transpose()
    }

    async fn save_requisition(&self, r: &Requisition) -> Result<()> {
        sqlx::query(
            r#"
            insert into requisitions (
              id, status, created_date, emergency, facility_id, program_id,
              processing_period_id, supervisory_node_id, creator_id, requisition_lines
            ) values (
              $1, $2, $3, $4, $5, $6, $7, $8, $9, $10
            )
            on conflict (id) do update set
              status = excluded.status,
              created_date = excluded.created_date,
              emergency = excluded.emergency,
              facility_id = excluded.facility_id,
              program_id = excluded.program_id,
              processing_period_id = excluded.processing_period_id,
              supervisory_node_id = excluded.supervisory_node_id,
              creator_id = excluded.creator_id,
              requisition_lines = excluded.requisition_lines
            "#,
        )
        .bind(r.id)
        .bind(r.status.as_str())
        .bind(r.created_date)
        .bind(r.emergency)
        .bind(r.facility)
        .bind(r.program)
        .bind(r.processing_period)
        .bind(r.supervisory_node)
        .bind(r.creator)
        .bind(Json(&r.requisition_lines))
        .execute(&self.pool)
        .await
        .context("save_requisition failed")?;

        Ok(())
    }

    async fn delete_requisition(&self, id: Uuid) -> Result<bool> {
        // requisition_comments cascade.
        let res = sqlx::query("delete from requisitions where id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("delete_requisition failed")?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_requisitions(&self) -> Result<Vec<Requisition>> {
        let qb = QueryBuilder::new(format!("select {REQUISITION_COLUMNS} from requisitions"));
        self.fetch_requisitions(qb, "list_requisitions").await
    }

    async fn search_requisitions(&self, params: &RequisitionSearchParams) -> Result<Vec<Requisition>> {
        let mut qb = QueryBuilder::new(format!(
            "select {REQUISITION_COLUMNS} from requisitions where true"
        ));
        if let Some(v) = params.facility {
            qb.push(" and facility_id = ").push_bind(v);
        }
        if let Some(v) = params.program {
            qb.push(" and program_id = ").push_bind(v);
        }
        if let Some(v) = params.processing_period {
            qb.push(" and processing_period_id = ").push_bind(v);
        }
        if let Some(v) = params.supervisory_node {
            qb.push(" and supervisory_node_id = ").push_bind(v);
        }
        if let Some(v) = params.status {
            qb.push(" and status = ").push_bind(v.as_str());
        }
        if let Some(v) = params.created_from {
            qb.push(" and created_date >= ").push_bind(v);
        }
        if let Some(v) = params.created_to {
            qb.push(" and created_date <= ").push_bind(v);
        }
        self.fetch_requisitions(qb, "search_requisitions").await
    }

    async fn find_regular_requisition(
        &self,
        facility: Uuid,
        program: Uuid,
        processing_period: Uuid,
    ) -> Result<Option<Requisition>> {
        let row = sqlx::query(&format!(
            r#"
            select {REQUISITION_COLUMNS}
            from requisitions
            where facility_id = $1
              and program_id = $2
              and processing_period_id = $3
              and emergency = false
            order by created_date, id
            limit 1
            "#
        ))
        .bind(facility)
        .bind(program)
        .bind(processing_period)
        .fetch_optional(&self.pool)
        .await
        .context("find_regular_requisition failed")?;

        row.as_ref().map(requisition_from_row).transpose()
    }

    async fn requisitions_by_creator(&self, creator: Uuid) -> Result<Vec<Requisition>> {
        let mut qb = QueryBuilder::new(format!(
            "select {REQUISITION_COLUMNS} from requisitions where creator_id = "
        ));
        qb.push_bind(creator);
        self.fetch_requisitions(qb, "requisitions_by_creator").await
    }

    async fn requisitions_by_supervisory_node(
        &self,
        node: Uuid,
        status: RequisitionStatus,
    ) -> Result<Vec<Requisition>> {
        let mut qb = QueryBuilder::new(format!(
            "select {REQUISITION_COLUMNS} from requisitions where supervisory_node_id = "
        ));
        qb.push_bind(node);
        qb.push(" and status = ").push_bind(status.as_str());
        self.fetch_requisitions(qb, "requisitions_by_supervisory_node")
            .await
    }

    async fn save_comment(&self, c: &Comment) -> Result<()> {
        sqlx::query(
            r#"
            insert into requisition_comments (
              id, requisition_id, author_id, comment_text, created_date
            ) values (
              $1, $2, $3, $4, $5
            )
            on conflict (id) do update set
              author_id = excluded.author_id,
              comment_text = excluded.comment_text,
              created_date = excluded.created_date
            "#,
        )
        .bind(c.id)
        .bind(c.requisition)
        .bind(c.author)
        .bind(&c.comment_text)
        .bind(c.created_date)
        .execute(&self.pool)
        .await
        .context("save_comment failed")?;
        Ok(())
    }

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>> {
        let row = sqlx::query(
            r#"
            select id, requisition_id, author_id, comment_text, created_date
            from requisition_comments
            where id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("find_comment failed")?;

        row.as_ref().map(comment_from_row).transpose()
    }

    async fn comments_for(&self, requisition: Uuid) -> Result<Vec<Comment>> {
        let rows = sqlx::query(
            r#"
            select id, requisition_id, author_id, comment_text, created_date
            from requisition_comments
            where requisition_id = $1
            order by created_date, seq
            "#,
        )
        .bind(requisition)
        .fetch_all(&self.pool)
        .await
        .context("comments_for failed")?;

        rows.iter().map(comment_from_row).collect()
    }

    async fn delete_comment(&self, id: Uuid) -> Result<bool> {
        let res = sqlx::query("delete from requisition_comments where id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("delete_comment failed")?;
        Ok(res.rows_affected() > 0)
    }

    async fn save_order(&self, o: &Order) -> Result<()> {
        sqlx::query(
            r#"
            insert into orders (
              id, requisition_id, order_code, quoted_cost, status, program_id,
              created_by_id, requesting_facility_id, receiving_facility_id,
              supplying_facility_id, created_date, order_line_items
            ) values (
              $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12
            )
            on conflict (id) do update set
              requisition_id = excluded.requisition_id,
              order_code = excluded.order_code,
              quoted_cost = excluded.quoted_cost,
              status = excluded.status,
              program_id = excluded.program_id,
              created_by_id = excluded.created_by_id,
              requesting_facility_id = excluded.requesting_facility_id,
              receiving_facility_id = excluded.receiving_facility_id,
              supplying_facility_id = excluded.supplying_facility_id,
              created_date = excluded.created_date,
              order_line_items = excluded.order_line_items
            "#,
        )
        .bind(o.id)
        .bind(o.requisition)
        .bind(&o.order_code)
        .bind(&o.quoted_cost)
        .bind(o.status.as_str())
        .bind(o.program)
        .bind(o.created_by_id)
        .bind(o.requesting_facility)
        .bind(o.receiving_facility)
        .bind(o.supplying_facility)
        .bind(o.created_date)
        .bind(Json(&o.order_line_items))
        .execute(&self.pool)
        .await
        .context("save_order failed")?;
        Ok(())
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("select {ORDER_COLUMNS} from orders where id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("find_order failed")?;

        row.as_ref().map(order_from_row).transpose()
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        self.search_orders(&OrderSearchParams::default()).await
    }

    async fn search_orders(&self, params: &OrderSearchParams) -> Result<Vec<Order>> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("select {ORDER_COLUMNS} from orders where true"));
        if let Some(v) = params.supplying_facility {
            qb.push(" and supplying_facility_id = ").push_bind(v);
        }
        if let Some(v) = params.requesting_facility {
            qb.push(" and requesting_facility_id = ").push_bind(v);
        }
        if let Some(v) = params.program {
            qb.push(" and program_id = ").push_bind(v);
        }
        qb.push(" order by created_date, id");

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .context("search_orders failed")?;
        rows.iter().map(order_from_row).collect()
    }

    async fn delete_order(&self, id: Uuid) -> Result<bool> {
        let res = sqlx::query("delete from orders where id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("delete_order failed")?;
        Ok(res.rows_affected() > 0)
    }
}
