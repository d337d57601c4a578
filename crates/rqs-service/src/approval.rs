use crate::error::{refdata_err, store_err};
use crate::{RequisitionError, RequisitionService, ServiceResult};
use rqs_schemas::{Requisition, RequisitionStatus, RIGHT_APPROVE_REQUISITION};
use rqs_workflow::{ApprovedCandidate, ApprovedSearch, RequisitionSearchParams};
use std::collections::HashSet;
use uuid::Uuid;

impl RequisitionService {
    /// AUTHORIZED requisitions under every node the user may approve for,
    /// including each node's direct children. Role order, deduplicated.
    pub async fn requisitions_for_approval(&self, user: Uuid) -> ServiceResult<Vec<Requisition>> {
        let user = self
            .refdata
            .user(user)
            .await
            .map_err(refdata_err)?
            .ok_or_else(|| RequisitionError::not_found("user", user))?;

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for role in &user.role_assignments {
            let Some(node_id) = role.supervised_node else {
                continue;
            };
            if !role.has_right(RIGHT_APPROVE_REQUISITION) {
                continue;
            }

            let mut nodes = vec![node_id];
            if let Some(node) = self
                .refdata
                .supervisory_node(node_id)
                .await
                .map_err(refdata_err)?
            {
                nodes.extend(node.child_nodes);
            }

            for node in nodes {
                let hits = self
                    .store
                    .requisitions_by_supervisory_node(node, RequisitionStatus::Authorized)
                    .await
                    .map_err(store_err)?;
                for r in hits {
                    if seen.insert(r.id) {
                        out.push(r);
                    }
                }
            }
        }
        Ok(out)
    }

    /// Filtered, sorted, paged view over APPROVED requisitions.
    pub async fn approved_search(&self, search: &ApprovedSearch) -> ServiceResult<Vec<Requisition>> {
        let approved = self
            .search(&RequisitionSearchParams::with_status(
                RequisitionStatus::Approved,
            ))
            .await?;

        let mut candidates = Vec::with_capacity(approved.len());
        for r in approved {
            let program_name = self
                .refdata
                .program(r.program)
                .await
                .map_err(refdata_err)?
                .map(|p| p.name)
                .unwrap_or_default();
            let (facility_code, facility_name) = self
                .refdata
                .facility(r.facility)
                .await
                .map_err(refdata_err)?
                .map(|f| (f.code, f.name))
                .unwrap_or_default();
            candidates.push(ApprovedCandidate {
                requisition: r,
                program_name,
                facility_code,
                facility_name,
            });
        }
        Ok(search.apply(candidates))
    }
}
