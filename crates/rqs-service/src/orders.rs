use crate::error::{export_err, refdata_err, store_err};
use crate::{RequisitionError, RequisitionService, ServiceResult};
use anyhow::Context;
use rqs_schemas::{now_utc, Order, OrderLineItem, OrderStatus, Requisition};
use rqs_workflow::{finalize_order, OrderSearchParams};
use tracing::{debug, info};
use uuid::Uuid;

pub const ORDER_CODE_PREFIX: &str = "ORDER-";
pub const ORDER_CSV_HEADER: [&str; 3] = ["productName", "filledQuantity", "orderedQuantity"];

impl RequisitionService {
    // -----------------------------------------------------------------------
    // Conversion
    // -----------------------------------------------------------------------

    /// Release the requisitions, then build one ORDERED order per requisition.
    ///
    /// Release runs first and is not rolled back if a later step fails.
    pub async fn convert_to_order(&self, ids: &[Uuid], user: Uuid) -> ServiceResult<Vec<Order>> {
        let released = self.release_requisitions_as_order(ids).await?;

        let mut orders = Vec::with_capacity(released.len());
        for r in &released {
            let supplying = self.supplying_facility(r).await?;
            let order = order_from_requisition(r, user, supplying);
            self.store.save_order(&order).await.map_err(store_err)?;
            info!(
                order = %order.id,
                requisition = %r.id,
                code = %order.order_code,
                supplying = %supplying,
                "requisition converted to order"
            );
            orders.push(order);
        }
        Ok(orders)
    }

    /// First supply line for (program, node); the requisition's own facility
    /// when there is none.
    async fn supplying_facility(&self, r: &Requisition) -> ServiceResult<Uuid> {
        let Some(node) = r.supervisory_node else {
            return Ok(r.facility);
        };
        let lines = self
            .refdata
            .supply_lines(r.program, node)
            .await
            .map_err(refdata_err)?;
        Ok(lines
            .first()
            .map(|s| s.supplying_facility)
            .unwrap_or(r.facility))
    }

    // -----------------------------------------------------------------------
    // CRUD
    // -----------------------------------------------------------------------

    /// Stores `order` under a fresh id; any supplied id is ignored.
    pub async fn create_order(&self, mut order: Order) -> ServiceResult<Order> {
        order.id = Uuid::new_v4();
        self.store.save_order(&order).await.map_err(store_err)?;
        debug!(order = %order.id, "order created");
        Ok(order)
    }

    pub async fn get_order(&self, id: Uuid) -> ServiceResult<Order> {
        self.store
            .find_order(id)
            .await
            .map_err(store_err)?
            .ok_or_else(|| RequisitionError::not_found("order", id))
    }

    pub async fn list_orders(&self) -> ServiceResult<Vec<Order>> {
        self.store.list_orders().await.map_err(store_err)
    }

    /// Upsert under the path id.
    pub async fn update_order(&self, id: Uuid, mut order: Order) -> ServiceResult<Order> {
        order.id = id;
        self.store.save_order(&order).await.map_err(store_err)?;
        debug!(order = %id, "order saved");
        Ok(order)
    }

    pub async fn delete_order(&self, id: Uuid) -> ServiceResult<()> {
        if !self.store.delete_order(id).await.map_err(store_err)? {
            return Err(RequisitionError::not_found("order", id));
        }
        debug!(order = %id, "order deleted");
        Ok(())
    }

    pub async fn search_orders(&self, params: &OrderSearchParams) -> ServiceResult<Vec<Order>> {
        self.store.search_orders(params).await.map_err(store_err)
    }

    /// ORDERED → SHIPPED.
    pub async fn finalize_order(&self, id: Uuid) -> ServiceResult<Order> {
        let mut order = self.get_order(id).await?;
        order.status = finalize_order(order.status)
            .map_err(|e| RequisitionError::BadRequest(e.to_string()))?;
        self.store.save_order(&order).await.map_err(store_err)?;
        info!(order = %id, "order finalized");
        Ok(order)
    }

    // -----------------------------------------------------------------------
    // Export
    // -----------------------------------------------------------------------

    /// Render the order in `format`. Only `csv` is supported.
    pub async fn print_order(&self, id: Uuid, format: &str) -> ServiceResult<String> {
        if !format.eq_ignore_ascii_case("csv") {
            return Err(RequisitionError::BadRequest(format!(
                "unsupported print format '{format}'. expected: csv"
            )));
        }
        self.print_order_csv(id).await
    }

    /// One row per line item, in order. Unresolved products print their id.
    pub async fn print_order_csv(&self, id: Uuid) -> ServiceResult<String> {
        let order = self.get_order(id).await?;

        let mut rows = Vec::with_capacity(order.order_line_items.len());
        for item in &order.order_line_items {
            let name = self
                .refdata
                .product(item.orderable_product)
                .await
                .map_err(refdata_err)?
                .map(|p| p.name)
                .unwrap_or_else(|| item.orderable_product.to_string());
            rows.push((name, item.filled_quantity, item.ordered_quantity));
        }

        encode_csv(&rows).map_err(export_err)
    }
}

fn order_from_requisition(r: &Requisition, user: Uuid, supplying: Uuid) -> Order {
    let code = r.id.simple().to_string()[..8].to_uppercase();
    Order {
        id: Uuid::new_v4(),
        requisition: Some(r.id),
        order_code: format!("{ORDER_CODE_PREFIX}{code}"),
        quoted_cost: "0".to_string(),
        status: OrderStatus::Ordered,
        program: r.program,
        created_by_id: user,
        requesting_facility: r.facility,
        receiving_facility: r.facility,
        supplying_facility: supplying,
        created_date: now_utc(),
        order_line_items: r
            .requisition_lines
            .iter()
            .map(|l| OrderLineItem {
                orderable_product: l.product,
                ordered_quantity: l.approved_quantity.or(l.requested_quantity).unwrap_or(0),
                filled_quantity: 0,
                approved_quantity: l.approved_quantity,
            })
            .collect(),
    }
}

fn encode_csv(rows: &[(String, i64, i64)]) -> anyhow::Result<String> {
    let mut w = csv::Writer::from_writer(Vec::new());
    w.write_record(ORDER_CSV_HEADER)
        .context("order csv header failed")?;
    for (name, filled, ordered) in rows {
        w.write_record([name.clone(), filled.to_string(), ordered.to_string()])
            .context("order csv row failed")?;
    }
    let bytes = w
        .into_inner()
        .map_err(|e| anyhow::anyhow!("order csv flush failed: {}", e.error()))?;
    String::from_utf8(bytes).context("order csv is not utf-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rqs_schemas::RequisitionLine;

    #[test]
    fn order_takes_approved_then_requested_then_zero() {
        let mut r = Requisition::initiated(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), false);
        let mut approved = RequisitionLine::empty(Uuid::new_v4());
        approved.approved_quantity = Some(4);
        approved.requested_quantity = Some(9);
        let mut requested = RequisitionLine::empty(Uuid::new_v4());
        requested.requested_quantity = Some(9);
        let bare = RequisitionLine::empty(Uuid::new_v4());
        r.requisition_lines = vec![approved, requested, bare];

        let user = Uuid::new_v4();
        let o = order_from_requisition(&r, user, r.facility);

        let qty: Vec<i64> = o.order_line_items.iter().map(|i| i.ordered_quantity).collect();
        assert_eq!(qty, vec![4, 9, 0]);
        assert!(o.order_line_items.iter().all(|i| i.filled_quantity == 0));
        assert_eq!(o.created_by_id, user);
        assert_eq!(o.status, OrderStatus::Ordered);
        assert_eq!(o.quoted_cost, "0");
    }

    #[test]
    fn order_code_is_prefix_plus_upper_hex() {
        let mut r = Requisition::initiated(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), false);
        r.id = Uuid::parse_str("abcdef12-3456-7890-abcd-ef1234567890").unwrap();
        let o = order_from_requisition(&r, Uuid::new_v4(), r.facility);
        assert_eq!(o.order_code, "ORDER-ABCDEF12");
    }

    #[test]
    fn csv_quotes_names_with_commas() {
        let out = encode_csv(&[("Gloves, latex".to_string(), 0, 12)]).unwrap();
        assert_eq!(
            out,
            "productName,filledQuantity,orderedQuantity\n\"Gloves, latex\",0,12\n"
        );
    }
}
