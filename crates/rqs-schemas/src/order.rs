use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Ordered,
    Shipped,
    Received,
    TransferFailed,
    InRoute,
    ReadyToPack,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Ordered => "ORDERED",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Received => "RECEIVED",
            OrderStatus::TransferFailed => "TRANSFER_FAILED",
            OrderStatus::InRoute => "IN_ROUTE",
            OrderStatus::ReadyToPack => "READY_TO_PACK",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "ORDERED" => Ok(OrderStatus::Ordered),
            "SHIPPED" => Ok(OrderStatus::Shipped),
            "RECEIVED" => Ok(OrderStatus::Received),
            "TRANSFER_FAILED" => Ok(OrderStatus::TransferFailed),
            "IN_ROUTE" => Ok(OrderStatus::InRoute),
            "READY_TO_PACK" => Ok(OrderStatus::ReadyToPack),
            other => Err(anyhow!("invalid order status: {}", other)),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
    pub orderable_product: Uuid,
    #[serde(default)]
    pub ordered_quantity: i64,
    #[serde(default)]
    pub filled_quantity: i64,
    #[serde(default)]
    pub approved_quantity: Option<i64>,
}

/// Fulfillment order. `quoted_cost` stays a decimal string so no float
/// rounding is introduced between client and store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default = "Uuid::nil")]
    pub id: Uuid,
    #[serde(default)]
    pub requisition: Option<Uuid>,
    pub order_code: String,
    #[serde(default = "zero_cost")]
    pub quoted_cost: String,
    pub status: OrderStatus,
    pub program: Uuid,
    pub created_by_id: Uuid,
    pub requesting_facility: Uuid,
    pub receiving_facility: Uuid,
    pub supplying_facility: Uuid,
    #[serde(default = "crate::now_utc")]
    pub created_date: DateTime<Utc>,
    #[serde(default)]
    pub order_line_items: Vec<OrderLineItem>,
}

fn zero_cost() -> String {
    "0".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_defaults_fill_in_missing_fields() {
        let json = serde_json::json!({
            "orderCode": "O1",
            "status": "ORDERED",
            "program": Uuid::new_v4(),
            "createdById": Uuid::new_v4(),
            "requestingFacility": Uuid::new_v4(),
            "receivingFacility": Uuid::new_v4(),
            "supplyingFacility": Uuid::new_v4(),
        });
        let o: Order = serde_json::from_value(json).unwrap();
        assert!(o.id.is_nil());
        assert_eq!(o.quoted_cost, "0");
        assert!(o.order_line_items.is_empty());
        assert_eq!(o.status, OrderStatus::Ordered);
    }

    #[test]
    fn status_parse_rejects_unknown() {
        assert_eq!(OrderStatus::parse("SHIPPED").unwrap(), OrderStatus::Shipped);
        assert!(OrderStatus::parse("LOST").is_err());
    }
}
