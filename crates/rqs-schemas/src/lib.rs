//! Wire and storage records for the requisition service.
//!
//! Everything here serializes as camelCase JSON. Statuses serialize in upper
//! case and round-trip through `as_str` / `parse` for the SQL layer.

pub mod order;
pub mod refdata;

pub use order::{Order, OrderLineItem, OrderStatus};
pub use refdata::{
    Facility, ProcessingPeriod, Product, Program, ProgramProduct, RoleAssignment,
    SupervisoryNode, SupplyLine, User, UserBasic, RIGHT_APPROVE_REQUISITION,
};

use anyhow::{anyhow, Result};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RequisitionStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequisitionStatus {
    Initiated,
    Submitted,
    Authorized,
    Approved,
    Released,
    Skipped,
}

impl RequisitionStatus {
    pub const ALL: [RequisitionStatus; 6] = [
        RequisitionStatus::Initiated,
        RequisitionStatus::Submitted,
        RequisitionStatus::Authorized,
        RequisitionStatus::Approved,
        RequisitionStatus::Released,
        RequisitionStatus::Skipped,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequisitionStatus::Initiated => "INITIATED",
            RequisitionStatus::Submitted => "SUBMITTED",
            RequisitionStatus::Authorized => "AUTHORIZED",
            RequisitionStatus::Approved => "APPROVED",
            RequisitionStatus::Released => "RELEASED",
            RequisitionStatus::Skipped => "SKIPPED",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "INITIATED" => Ok(RequisitionStatus::Initiated),
            "SUBMITTED" => Ok(RequisitionStatus::Submitted),
            "AUTHORIZED" => Ok(RequisitionStatus::Authorized),
            "APPROVED" => Ok(RequisitionStatus::Approved),
            "RELEASED" => Ok(RequisitionStatus::Released),
            "SKIPPED" => Ok(RequisitionStatus::Skipped),
            other => Err(anyhow!("invalid requisition status: {}", other)),
        }
    }

    /// RELEASED and SKIPPED accept no further lifecycle actions except release.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Released | Self::Skipped)
    }
}

impl std::fmt::Display for RequisitionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RequisitionLine
// ---------------------------------------------------------------------------

/// Quantity data for one product. Every quantity stays optional until submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequisitionLine {
    pub product: Uuid,
    #[serde(default)]
    pub requested_quantity: Option<i64>,
    #[serde(default)]
    pub beginning_balance: Option<i64>,
    #[serde(default)]
    pub stock_on_hand: Option<i64>,
    #[serde(default)]
    pub total_consumed_quantity: Option<i64>,
    #[serde(default)]
    pub total_received_quantity: Option<i64>,
    #[serde(default)]
    pub total_losses_and_adjustments: Option<i64>,
    #[serde(default)]
    pub approved_quantity: Option<i64>,
}

impl RequisitionLine {
    /// A line with no quantities entered, as produced at initiation.
    pub fn empty(product: Uuid) -> Self {
        Self {
            product,
            requested_quantity: None,
            beginning_balance: None,
            stock_on_hand: None,
            total_consumed_quantity: None,
            total_received_quantity: None,
            total_losses_and_adjustments: None,
            approved_quantity: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Requisition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requisition {
    pub id: Uuid,
    pub status: RequisitionStatus,
    pub created_date: DateTime<Utc>,
    #[serde(default)]
    pub emergency: bool,
    pub facility: Uuid,
    pub program: Uuid,
    pub processing_period: Uuid,
    #[serde(default)]
    pub supervisory_node: Option<Uuid>,
    #[serde(default)]
    pub creator: Option<Uuid>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub requisition_lines: Vec<RequisitionLine>,
}

impl Requisition {
    /// Fresh INITIATED requisition with a new id and `created_date = now`.
    pub fn initiated(facility: Uuid, program: Uuid, processing_period: Uuid, emergency: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: RequisitionStatus::Initiated,
            created_date: now_utc(),
            emergency,
            facility,
            program,
            processing_period,
            supervisory_node: None,
            creator: None,
            requisition_lines: Vec::new(),
        }
    }

    /// Replace the line collection, keeping the first line seen per product.
    pub fn set_lines(&mut self, lines: Vec<RequisitionLine>) {
        self.requisition_lines = dedup_lines(lines);
    }

    pub fn basic_information(&self) -> RequisitionBasic {
        RequisitionBasic {
            id: self.id,
            status: self.status,
            created_date: self.created_date,
            emergency: self.emergency,
        }
    }
}

/// Lines are a set keyed by product; first occurrence wins.
pub fn dedup_lines(lines: Vec<RequisitionLine>) -> Vec<RequisitionLine> {
    let mut seen = HashSet::new();
    lines
        .into_iter()
        .filter(|l| seen.insert(l.product))
        .collect()
}

/// Current time truncated to microseconds, the precision Postgres keeps, so a
/// stored timestamp reads back unchanged.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Serde helper: a JSON `null` collection reads as empty.
pub fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Serde helper for optional collections: a present `null` reads as
/// `Some(vec![])`. Pair with `#[serde(default)]` so an absent field stays
/// `None`.
pub fn present_or_null<'de, D, T>(deserializer: D) -> std::result::Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    null_as_empty(deserializer).map(Some)
}

/// Reduced requisition projection embedded in comment responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequisitionBasic {
    pub id: Uuid,
    pub status: RequisitionStatus,
    pub created_date: DateTime<Utc>,
    pub emergency: bool,
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub author: Uuid,
    pub requisition: Uuid,
    pub comment_text: String,
    pub created_date: DateTime<Utc>,
}

impl Comment {
    pub fn new(requisition: Uuid, author: Uuid, comment_text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author,
            requisition,
            comment_text: comment_text.into(),
            created_date: now_utc(),
        }
    }
}

/// Comment with author and requisition reduced to basic information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: Uuid,
    pub author: UserBasic,
    pub requisition: RequisitionBasic,
    pub comment_text: String,
    pub created_date: DateTime<Utc>,
}
