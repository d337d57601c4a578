//! Scenario: Postgres store persists what the memory store persists
//!
//! # Coverage
//! 1. Requisition upsert keeps lines and status.
//! 2. Conjunctive search uses the same filters and ordering as `MemStore`.
//! 3. Comments come back in creation order; deleting the requisition cascades.
//! 4. Orders upsert and filter by supplying facility.
//!
//! DB-backed test. Skips if RQS_DATABASE_URL is not set.

use chrono::{TimeZone, Utc};
use rqs_db::{PgStore, RequisitionStore};
use rqs_schemas::{
    Comment, Order, OrderLineItem, OrderStatus, Requisition, RequisitionLine, RequisitionStatus,
};
use rqs_workflow::{OrderSearchParams, RequisitionSearchParams};
use uuid::Uuid;

async fn store_or_skip() -> anyhow::Result<Option<PgStore>> {
    let url = match std::env::var(rqs_db::ENV_DB_URL) {
        Ok(v) => v,
        Err(_) => {
            eprintln!("SKIP: RQS_DATABASE_URL not set");
            return Ok(None);
        }
    };

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await?;
    rqs_db::migrate(&pool).await?;
    Ok(Some(PgStore::new(pool)))
}

#[tokio::test]
async fn requisition_upsert_and_search() -> anyhow::Result<()> {
    let Some(store) = store_or_skip().await? else {
        return Ok(());
    };

    // Unique facility per run so leftover rows in a developer DB never match.
    let facility = Uuid::new_v4();
    let program = Uuid::new_v4();

    let mut older = Requisition::initiated(facility, program, Uuid::new_v4(), false);
    older.created_date = Utc.with_ymd_and_hms(2015, 4, 1, 12, 0, 0).unwrap();
    let mut line = RequisitionLine::empty(Uuid::new_v4());
    line.requested_quantity = Some(5);
    older.requisition_lines = vec![line];
    store.save_requisition(&older).await?;

    older.status = RequisitionStatus::Submitted;
    store.save_requisition(&older).await?;

    let newer = Requisition::initiated(facility, Uuid::new_v4(), Uuid::new_v4(), false);
    store.save_requisition(&newer).await?;

    let got = store.find_requisition(older.id).await?.expect("saved");
    assert_eq!(got.status, RequisitionStatus::Submitted);
    assert_eq!(got.requisition_lines[0].requested_quantity, Some(5));

    let by_facility = store
        .search_requisitions(&RequisitionSearchParams {
            facility: Some(facility),
            ..Default::default()
        })
        .await?;
    let ids: Vec<Uuid> = by_facility.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![older.id, newer.id]);

    let narrowed = store
        .search_requisitions(&RequisitionSearchParams {
            facility: Some(facility),
            program: Some(program),
            status: Some(RequisitionStatus::Submitted),
            ..Default::default()
        })
        .await?;
    assert_eq!(narrowed.len(), 1);

    assert!(store.delete_requisition(newer.id).await?);
    assert!(!store.delete_requisition(newer.id).await?);
    store.delete_requisition(older.id).await?;
    Ok(())
}

#[tokio::test]
async fn comments_cascade_with_requisition() -> anyhow::Result<()> {
    let Some(store) = store_or_skip().await? else {
        return Ok(());
    };

    let r = Requisition::initiated(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), false);
    store.save_requisition(&r).await?;

    let first = Comment::new(r.id, Uuid::new_v4(), "first");
    let mut second = Comment::new(r.id, Uuid::new_v4(), "second");
    second.created_date = first.created_date;
    store.save_comment(&first).await?;
    store.save_comment(&second).await?;

    let texts: Vec<String> = store
        .comments_for(r.id)
        .await?
        .into_iter()
        .map(|c| c.comment_text)
        .collect();
    assert_eq!(texts, vec!["first", "second"]);

    store.delete_requisition(r.id).await?;
    assert!(store.find_comment(first.id).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn orders_upsert_and_filter() -> anyhow::Result<()> {
    let Some(store) = store_or_skip().await? else {
        return Ok(());
    };

    let supplying = Uuid::new_v4();
    let facility = Uuid::new_v4();
    let mut order = Order {
        id: Uuid::new_v4(),
        requisition: None,
        order_code: "ORDER-TEST".to_string(),
        quoted_cost: "0".to_string(),
        status: OrderStatus::Ordered,
        program: Uuid::new_v4(),
        created_by_id: Uuid::new_v4(),
        requesting_facility: facility,
        receiving_facility: facility,
        supplying_facility: supplying,
        created_date: Utc::now(),
        order_line_items: vec![OrderLineItem {
            orderable_product: Uuid::new_v4(),
            ordered_quantity: 7,
            filled_quantity: 0,
            approved_quantity: Some(7),
        }],
    };
    store.save_order(&order).await?;
    order.status = OrderStatus::Shipped;
    store.save_order(&order).await?;

    let hits = store
        .search_orders(&OrderSearchParams {
            supplying_facility: Some(supplying),
            ..Default::default()
        })
        .await?;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].status, OrderStatus::Shipped);
    assert_eq!(hits[0].order_line_items[0].ordered_quantity, 7);

    assert!(store.delete_order(order.id).await?);
    assert!(store.find_order(order.id).await?.is_none());
    Ok(())
}
