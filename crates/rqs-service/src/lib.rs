//! rqs-service
//!
//! The requisition service: loads an entity from the store, runs it through
//! the `rqs-workflow` tables, and writes the result back. Reference data and
//! settings are injected collaborators.
//!
//! Hard failures are `RequisitionError`. `skip` and `delete` keep a soft-fail
//! `Ok(false)` for unmet preconditions.

mod approval;
pub mod bootstrap;
mod comments;
mod error;
mod orders;

pub use error::{RequisitionError, ServiceResult};
pub use orders::{ORDER_CSV_HEADER, ORDER_CODE_PREFIX};

use error::{refdata_err, store_err};
use rqs_config::{SettingsProvider, SKIP_AUTHORIZATION};
use rqs_db::RequisitionStore;
use rqs_refdata::ReferenceDataProvider;
use rqs_schemas::{Requisition, RequisitionLine, RequisitionStatus};
use rqs_workflow::{next_status, validate_for_submit, RequisitionAction, RequisitionSearchParams};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Input to [`RequisitionService::initiate`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRequisition {
    pub facility: Uuid,
    pub program: Uuid,
    pub processing_period: Uuid,
    #[serde(default)]
    pub emergency: bool,
    #[serde(default)]
    pub supervisory_node: Option<Uuid>,
}

/// Fields a plain update may change. Status only moves through the
/// lifecycle operations. An absent field keeps the stored value; an explicit
/// `null` for `requisitionLines` clears the lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequisitionUpdate {
    #[serde(default, deserialize_with = "rqs_schemas::present_or_null")]
    pub requisition_lines: Option<Vec<RequisitionLine>>,
    #[serde(default)]
    pub emergency: Option<bool>,
    #[serde(default)]
    pub supervisory_node: Option<Uuid>,
}

pub struct RequisitionService {
    store: Arc<dyn RequisitionStore>,
    refdata: Arc<dyn ReferenceDataProvider>,
    settings: Arc<dyn SettingsProvider>,
}

impl RequisitionService {
    pub fn new(
        store: Arc<dyn RequisitionStore>,
        refdata: Arc<dyn ReferenceDataProvider>,
        settings: Arc<dyn SettingsProvider>,
    ) -> Self {
        Self {
            store,
            refdata,
            settings,
        }
    }

    // -----------------------------------------------------------------------
    // Store helpers
    // -----------------------------------------------------------------------

    async fn find(&self, id: Uuid) -> ServiceResult<Option<Requisition>> {
        self.store.find_requisition(id).await.map_err(store_err)
    }

    async fn load(&self, id: Uuid) -> ServiceResult<Requisition> {
        self.find(id)
            .await?
            .ok_or_else(|| RequisitionError::not_found("requisition", id))
    }

    async fn save(&self, r: &Requisition) -> ServiceResult<()> {
        self.store.save_requisition(r).await.map_err(store_err)
    }

    /// Load, apply one table transition, persist.
    async fn transition(&self, id: Uuid, action: RequisitionAction) -> ServiceResult<Requisition> {
        let mut r = self.load(id).await?;
        let next = next_status(r.status, action)?;
        debug!(requisition = %id, from = %r.status, to = %next, ?action, "transition");
        r.status = next;
        self.save(&r).await?;
        Ok(r)
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Create an INITIATED requisition with one empty line per catalog product.
    pub async fn initiate(
        &self,
        new: NewRequisition,
        creator: Option<Uuid>,
    ) -> ServiceResult<Requisition> {
        if self
            .refdata
            .facility(new.facility)
            .await
            .map_err(refdata_err)?
            .is_none()
        {
            return Err(RequisitionError::not_found("facility", new.facility));
        }
        if self
            .refdata
            .program(new.program)
            .await
            .map_err(refdata_err)?
            .is_none()
        {
            return Err(RequisitionError::not_found("program", new.program));
        }
        if self
            .refdata
            .processing_period(new.processing_period)
            .await
            .map_err(refdata_err)?
            .is_none()
        {
            return Err(RequisitionError::not_found(
                "processing period",
                new.processing_period,
            ));
        }

        if !new.emergency {
            let existing = self
                .store
                .find_regular_requisition(new.facility, new.program, new.processing_period)
                .await
                .map_err(store_err)?;
            if let Some(existing) = existing {
                return Err(RequisitionError::Conflict(format!(
                    "non-emergency requisition {} already exists for this facility, program and period",
                    existing.id
                )));
            }
        }

        let catalog = self
            .refdata
            .program_products(new.program)
            .await
            .map_err(refdata_err)?;

        let mut r = Requisition::initiated(
            new.facility,
            new.program,
            new.processing_period,
            new.emergency,
        );
        r.supervisory_node = new.supervisory_node;
        r.creator = creator;
        r.set_lines(
            catalog
                .into_iter()
                .map(|pp| RequisitionLine::empty(pp.product))
                .collect(),
        );

        self.save(&r).await?;
        info!(
            requisition = %r.id,
            facility = %r.facility,
            program = %r.program,
            emergency = r.emergency,
            lines = r.requisition_lines.len(),
            "requisition initiated"
        );
        Ok(r)
    }

    /// Validate the lines, then INITIATED → SUBMITTED.
    ///
    /// `lines`, when given, replaces the stored collection before validation.
    pub async fn submit(
        &self,
        id: Uuid,
        lines: Option<Vec<RequisitionLine>>,
    ) -> ServiceResult<Requisition> {
        let mut r = self.load(id).await?;
        if let Some(lines) = lines {
            r.set_lines(lines);
        }

        if let Err(e) = validate_for_submit(&r.requisition_lines) {
            debug!(requisition = %id, reason = e.message, "submit refused");
            return Err(e.into());
        }

        // Stricter than the legacy service, which accepted submit from any
        // status: only INITIATED moves to SUBMITTED.
        let next = next_status(r.status, RequisitionAction::Submit).map_err(|_| {
            RequisitionError::Validation {
                field: "status".to_string(),
                message: format!(
                    "requisition is {}; only INITIATED requisitions can be submitted",
                    r.status
                ),
            }
        })?;
        r.status = next;
        self.save(&r).await?;
        debug!(requisition = %id, "requisition submitted");
        Ok(r)
    }

    /// INITIATED → SKIPPED when the program allows it. `Ok(false)` otherwise.
    pub async fn skip(&self, id: Uuid) -> ServiceResult<bool> {
        let Some(mut r) = self.find(id).await? else {
            debug!(requisition = %id, "skip refused: requisition missing");
            return Ok(false);
        };
        if r.status != RequisitionStatus::Initiated {
            debug!(requisition = %id, status = %r.status, "skip refused: bad status");
            return Ok(false);
        }

        let skippable = self
            .refdata
            .program(r.program)
            .await
            .map_err(refdata_err)?
            .map(|p| p.periods_skippable)
            .unwrap_or(false);
        if !skippable {
            debug!(requisition = %id, program = %r.program, "skip refused: program does not allow skipping");
            return Ok(false);
        }

        r.status = next_status(r.status, RequisitionAction::Skip)?;
        self.save(&r).await?;
        debug!(requisition = %id, "requisition skipped");
        Ok(true)
    }

    /// SUBMITTED → AUTHORIZED.
    pub async fn authorize(&self, id: Uuid) -> ServiceResult<Requisition> {
        let r = self.transition(id, RequisitionAction::Authorize).await?;
        info!(requisition = %id, "requisition authorized");
        Ok(r)
    }

    /// AUTHORIZED → INITIATED.
    pub async fn reject(&self, id: Uuid) -> ServiceResult<Requisition> {
        self.transition(id, RequisitionAction::Reject).await
    }

    /// AUTHORIZED → APPROVED, or SUBMITTED → APPROVED when authorization is
    /// skipped by configuration.
    pub async fn approve(&self, id: Uuid) -> ServiceResult<Requisition> {
        let mut r = self.load(id).await?;
        let skip_authorization = self.settings.bool_value(SKIP_AUTHORIZATION);
        let next = next_status(
            r.status,
            RequisitionAction::Approve { skip_authorization },
        )
        .map_err(|e| RequisitionError::BadRequest(e.to_string()))?;

        r.status = next;
        self.save(&r).await?;
        info!(requisition = %id, skip_authorization, "requisition approved");
        Ok(r)
    }

    /// Remove an INITIATED requisition and its comments. `Ok(false)` for any
    /// other status.
    pub async fn delete(&self, id: Uuid) -> ServiceResult<bool> {
        let r = self.load(id).await?;
        if let Err(e) = next_status(r.status, RequisitionAction::Delete) {
            debug!(requisition = %id, reason = %e, "delete refused");
            return Ok(false);
        }
        let removed = self.store.delete_requisition(id).await.map_err(store_err)?;
        debug!(requisition = %id, removed, "requisition deleted");
        Ok(removed)
    }

    /// Mark each requisition RELEASED, in order. Not atomic: a failure part
    /// way through leaves the earlier ones released.
    pub async fn release_requisitions_as_order(
        &self,
        ids: &[Uuid],
    ) -> ServiceResult<Vec<Requisition>> {
        let mut released = Vec::with_capacity(ids.len());
        for &id in ids {
            released.push(self.transition(id, RequisitionAction::Release).await?);
        }
        info!(count = released.len(), "requisitions released");
        Ok(released)
    }

    // -----------------------------------------------------------------------
    // Reads and plain updates
    // -----------------------------------------------------------------------

    pub async fn get(&self, id: Uuid) -> ServiceResult<Requisition> {
        self.load(id).await
    }

    pub async fn list(&self) -> ServiceResult<Vec<Requisition>> {
        self.store.list_requisitions().await.map_err(store_err)
    }

    pub async fn search(&self, params: &RequisitionSearchParams) -> ServiceResult<Vec<Requisition>> {
        self.store
            .search_requisitions(params)
            .await
            .map_err(store_err)
    }

    pub async fn submitted(&self) -> ServiceResult<Vec<Requisition>> {
        self.search(&RequisitionSearchParams::with_status(RequisitionStatus::Submitted))
            .await
    }

    pub async fn search_by_creator(&self, creator: Uuid) -> ServiceResult<Vec<Requisition>> {
        self.store
            .requisitions_by_creator(creator)
            .await
            .map_err(store_err)
    }

    /// Replace whichever of lines, emergency flag and supervisory node the
    /// update carries. Status is kept.
    pub async fn update(&self, id: Uuid, update: RequisitionUpdate) -> ServiceResult<Requisition> {
        let mut r = self.load(id).await?;
        if let Some(lines) = update.requisition_lines {
            r.set_lines(lines);
        }
        if let Some(emergency) = update.emergency {
            r.emergency = emergency;
        }
        if update.supervisory_node.is_some() {
            r.supervisory_node = update.supervisory_node;
        }
        self.save(&r).await?;
        debug!(requisition = %id, "requisition updated");
        Ok(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_body_reads_null_lines_as_empty() {
        let u: RequisitionUpdate =
            serde_json::from_str(r#"{"requisitionLines": null, "emergency": true}"#).unwrap();
        assert_eq!(u.requisition_lines, Some(vec![]));
        assert_eq!(u.emergency, Some(true));
        assert_eq!(u.supervisory_node, None);
    }

    #[test]
    fn update_body_without_lines_leaves_them_alone() {
        let u: RequisitionUpdate = serde_json::from_str(r#"{"emergency": true}"#).unwrap();
        assert_eq!(u.requisition_lines, None);
    }

    #[test]
    fn new_requisition_defaults_to_regular() {
        let id = Uuid::new_v4();
        let n: NewRequisition = serde_json::from_value(serde_json::json!({
            "facility": id,
            "program": id,
            "processingPeriod": id,
        }))
        .unwrap();
        assert!(!n.emergency);
        assert!(n.supervisory_node.is_none());
    }
}
