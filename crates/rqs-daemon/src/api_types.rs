//! Request and response types for the rqs-daemon HTTP endpoints.
//!
//! Query structs keep every field as an optional string and parse in one
//! place, so a malformed parameter is a JSON 400 like every other refusal.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rqs_schemas::{RequisitionLine, RequisitionStatus};
use rqs_workflow::{ApprovedSearch, OrderSearchParams, RequisitionSearchParams};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

// ---------------------------------------------------------------------------
// /health, /version
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub build: &'static str,
}

// ---------------------------------------------------------------------------
// Bodies
// ---------------------------------------------------------------------------

/// PUT /requisitions/{id}/submit. Absent `requisitionLines` keeps the stored
/// lines; an explicit `null` replaces them with nothing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    #[serde(default, deserialize_with = "rqs_schemas::present_or_null")]
    pub requisition_lines: Option<Vec<RequisitionLine>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    pub comment_text: String,
}

/// One element of POST /orders/requisitions: a bare id or `{"id": ..}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RequisitionRef {
    Id(Uuid),
    Object { id: Uuid },
}

impl RequisitionRef {
    pub fn id(&self) -> Uuid {
        match self {
            RequisitionRef::Id(id) | RequisitionRef::Object { id } => *id,
        }
    }
}

// ---------------------------------------------------------------------------
// Query strings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequisitionSearchQuery {
    pub facility: Option<String>,
    pub program: Option<String>,
    pub created_date_from: Option<String>,
    pub created_date_to: Option<String>,
    pub processing_period: Option<String>,
    pub supervisory_node: Option<String>,
    pub requisition_status: Option<String>,
}

impl RequisitionSearchQuery {
    pub fn into_params(self) -> Result<RequisitionSearchParams, ApiError> {
        Ok(RequisitionSearchParams {
            facility: opt_uuid("facility", self.facility)?,
            program: opt_uuid("program", self.program)?,
            processing_period: opt_uuid("processingPeriod", self.processing_period)?,
            supervisory_node: opt_uuid("supervisoryNode", self.supervisory_node)?,
            status: self
                .requisition_status
                .filter(|s| !s.is_empty())
                .map(|s| RequisitionStatus::parse(&s))
                .transpose()
                .map_err(ApiError::bad_request)?,
            created_from: opt_datetime("createdDateFrom", self.created_date_from)?,
            created_to: opt_datetime("createdDateTo", self.created_date_to)?,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovedSearchQuery {
    pub filter_value: Option<String>,
    pub filter_by: Option<String>,
    pub sort_by: Option<String>,
    pub descending: Option<String>,
    pub page_number: Option<String>,
    pub page_size: Option<String>,
}

pub const DEFAULT_PAGE_SIZE: usize = 10;

impl ApprovedSearchQuery {
    pub fn into_search(self) -> Result<ApprovedSearch, ApiError> {
        let descending = match self.descending.as_deref() {
            None | Some("") => false,
            Some(s) => s
                .parse::<bool>()
                .map_err(|_| ApiError::bad_request(format!("descending: not a boolean: {s}")))?,
        };
        let page_number = opt_usize("pageNumber", self.page_number)?.unwrap_or(0);
        let page_size = opt_usize("pageSize", self.page_size)?.unwrap_or(DEFAULT_PAGE_SIZE);

        ApprovedSearch::new(
            self.filter_value.unwrap_or_default(),
            self.filter_by.as_deref().unwrap_or("all"),
            self.sort_by.as_deref().unwrap_or("programName"),
            descending,
            page_number,
            page_size,
        )
        .map_err(ApiError::bad_request)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSearchQuery {
    pub supplying_facility: Option<String>,
    pub requesting_facility: Option<String>,
    pub program: Option<String>,
}

impl OrderSearchQuery {
    pub fn into_params(self) -> Result<OrderSearchParams, ApiError> {
        Ok(OrderSearchParams {
            supplying_facility: opt_uuid("supplyingFacility", self.supplying_facility)?,
            requesting_facility: opt_uuid("requestingFacility", self.requesting_facility)?,
            program: opt_uuid("program", self.program)?,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrintQuery {
    pub format: Option<String>,
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

fn opt_uuid(name: &str, raw: Option<String>) -> Result<Option<Uuid>, ApiError> {
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => Uuid::parse_str(s)
            .map(Some)
            .map_err(|_| ApiError::bad_request(format!("{name}: not a uuid: {s}"))),
    }
}

fn opt_usize(name: &str, raw: Option<String>) -> Result<Option<usize>, ApiError> {
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|_| ApiError::bad_request(format!("{name}: not a non-negative integer: {s}"))),
    }
}

fn opt_datetime(name: &str, raw: Option<String>) -> Result<Option<DateTime<Utc>>, ApiError> {
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => parse_datetime(s)
            .map(Some)
            .ok_or_else(|| ApiError::bad_request(format!("{name}: not an ISO date-time: {s}"))),
    }
}

/// RFC 3339, or a naive ISO date-time / date read as UTC.
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
