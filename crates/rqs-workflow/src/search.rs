//! Search criteria.
//!
//! Each criteria struct is a set of independently optional filters combined
//! with AND. `matches` is the in-memory evaluation; the Postgres store builds
//! the equivalent WHERE clause from the same fields.

use chrono::{DateTime, Utc};
use rqs_schemas::{Order, Requisition, RequisitionStatus};
use std::cmp::Ordering;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchParamError {
    #[error("unsupported filterBy '{0}'. expected one of: programName | facilityCode | facilityName | all")]
    FilterBy(String),
    #[error("unsupported sortBy '{0}'. expected one of: programName | facilityCode | facilityName")]
    SortBy(String),
    #[error("pageSize must be > 0")]
    PageSize,
}

// ---------------------------------------------------------------------------
// Requisition search
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequisitionSearchParams {
    pub facility: Option<Uuid>,
    pub program: Option<Uuid>,
    pub processing_period: Option<Uuid>,
    pub supervisory_node: Option<Uuid>,
    pub status: Option<RequisitionStatus>,
    /// Inclusive lower bound on `created_date`.
    pub created_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_date`.
    pub created_to: Option<DateTime<Utc>>,
}

impl RequisitionSearchParams {
    pub fn with_status(status: RequisitionStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn matches(&self, r: &Requisition) -> bool {
        self.facility.map_or(true, |f| r.facility == f)
            && self.program.map_or(true, |p| r.program == p)
            && self
                .processing_period
                .map_or(true, |p| r.processing_period == p)
            && self
                .supervisory_node
                .map_or(true, |n| r.supervisory_node == Some(n))
            && self.status.map_or(true, |s| r.status == s)
            && self.created_from.map_or(true, |from| r.created_date >= from)
            && self.created_to.map_or(true, |to| r.created_date <= to)
    }
}

/// Stable result order shared by every store: created date, then id.
pub fn search_order(a: &Requisition, b: &Requisition) -> Ordering {
    a.created_date
        .cmp(&b.created_date)
        .then_with(|| a.id.cmp(&b.id))
}

// ---------------------------------------------------------------------------
// Order search
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderSearchParams {
    pub supplying_facility: Option<Uuid>,
    pub requesting_facility: Option<Uuid>,
    pub program: Option<Uuid>,
}

impl OrderSearchParams {
    pub fn matches(&self, o: &Order) -> bool {
        self.supplying_facility
            .map_or(true, |f| o.supplying_facility == f)
            && self
                .requesting_facility
                .map_or(true, |f| o.requesting_facility == f)
            && self.program.map_or(true, |p| o.program == p)
    }
}

// ---------------------------------------------------------------------------
// Approved search (filter + sort + page)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovedFilterBy {
    ProgramName,
    FacilityCode,
    FacilityName,
    All,
}

impl ApprovedFilterBy {
    pub fn parse(s: &str) -> Result<Self, SearchParamError> {
        match s {
            "programName" => Ok(Self::ProgramName),
            "facilityCode" => Ok(Self::FacilityCode),
            "facilityName" => Ok(Self::FacilityName),
            "all" => Ok(Self::All),
            other => Err(SearchParamError::FilterBy(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovedSortBy {
    ProgramName,
    FacilityCode,
    FacilityName,
}

impl ApprovedSortBy {
    pub fn parse(s: &str) -> Result<Self, SearchParamError> {
        match s {
            "programName" => Ok(Self::ProgramName),
            "facilityCode" => Ok(Self::FacilityCode),
            "facilityName" => Ok(Self::FacilityName),
            other => Err(SearchParamError::SortBy(other.to_string())),
        }
    }
}

/// An APPROVED requisition joined with the reference fields it is filtered
/// and sorted on.
#[derive(Debug, Clone)]
pub struct ApprovedCandidate {
    pub requisition: Requisition,
    pub program_name: String,
    pub facility_code: String,
    pub facility_name: String,
}

impl ApprovedCandidate {
    fn key(&self, sort_by: ApprovedSortBy) -> &str {
        match sort_by {
            ApprovedSortBy::ProgramName => &self.program_name,
            ApprovedSortBy::FacilityCode => &self.facility_code,
            ApprovedSortBy::FacilityName => &self.facility_name,
        }
    }

    fn matches(&self, filter_by: ApprovedFilterBy, needle: &str) -> bool {
        let hit = |s: &str| s.to_lowercase().contains(needle);
        match filter_by {
            ApprovedFilterBy::ProgramName => hit(&self.program_name),
            ApprovedFilterBy::FacilityCode => hit(&self.facility_code),
            ApprovedFilterBy::FacilityName => hit(&self.facility_name),
            ApprovedFilterBy::All => {
                hit(&self.program_name) || hit(&self.facility_code) || hit(&self.facility_name)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovedSearch {
    pub filter_value: String,
    pub filter_by: ApprovedFilterBy,
    pub sort_by: ApprovedSortBy,
    pub descending: bool,
    /// 0-based.
    pub page_number: usize,
    pub page_size: usize,
}

impl ApprovedSearch {
    pub fn new(
        filter_value: impl Into<String>,
        filter_by: &str,
        sort_by: &str,
        descending: bool,
        page_number: usize,
        page_size: usize,
    ) -> Result<Self, SearchParamError> {
        if page_size == 0 {
            return Err(SearchParamError::PageSize);
        }
        Ok(Self {
            filter_value: filter_value.into(),
            filter_by: ApprovedFilterBy::parse(filter_by)?,
            sort_by: ApprovedSortBy::parse(sort_by)?,
            descending,
            page_number,
            page_size,
        })
    }

    /// Filter to APPROVED + `filter_value` (case-insensitive substring), sort,
    /// then cut one page. A page past the end is empty.
    pub fn apply(&self, candidates: Vec<ApprovedCandidate>) -> Vec<Requisition> {
        let needle = self.filter_value.to_lowercase();
        let mut hits: Vec<ApprovedCandidate> = candidates
            .into_iter()
            .filter(|c| c.requisition.status == RequisitionStatus::Approved)
            .filter(|c| c.matches(self.filter_by, &needle))
            .collect();

        hits.sort_by(|a, b| {
            let ord = a
                .key(self.sort_by)
                .cmp(b.key(self.sort_by))
                .then_with(|| search_order(&a.requisition, &b.requisition));
            if self.descending {
                ord.reverse()
            } else {
                ord
            }
        });

        hits.into_iter()
            .skip(self.page_number.saturating_mul(self.page_size))
            .take(self.page_size)
            .map(|c| c.requisition)
            .collect()
    }
}
