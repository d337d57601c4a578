//! rqs-testkit
//!
//! Shared fixtures for scenario tests: a small reference-data world, a
//! service wired to the in-memory store, the four-requisition search
//! scenario, and a bearer-token minter.

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use rqs_config::{SettingsProvider, StaticSettings, SKIP_AUTHORIZATION};
use rqs_db::{MemStore, RequisitionStore};
use rqs_refdata::StaticReferenceData;
use rqs_schemas::{
    Facility, ProcessingPeriod, Product, Program, Requisition, RequisitionLine, RoleAssignment,
    SupervisoryNode, SupplyLine, User, RIGHT_APPROVE_REQUISITION,
};
use rqs_service::RequisitionService;
use uuid::Uuid;

pub mod tokens;

pub use tokens::{mint_token, TEST_TOKEN_SECRET};

/// Stable fixture id derived from a name, so failures print the same ids
/// run to run.
pub fn fixture_id(name: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("rqs-testkit/{name}").as_bytes())
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// Two facilities, two programs (only `program1` allows skipping), one
/// period, a parent/child node pair with a supply line, an approver and a
/// plain user.
#[derive(Debug, Clone)]
pub struct World {
    pub facility1: Facility,
    pub facility2: Facility,
    pub warehouse: Facility,
    pub program1: Program,
    pub program2: Program,
    pub period: ProcessingPeriod,
    pub products: Vec<Product>,
    pub node: SupervisoryNode,
    pub child_node: SupervisoryNode,
    pub approver: User,
    pub clerk: User,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        let facility = |key: &str, code: &str, name: &str| Facility {
            id: fixture_id(key),
            code: code.to_string(),
            name: name.to_string(),
        };
        let child_node = SupervisoryNode {
            id: fixture_id("node/child"),
            code: "SN1.1".to_string(),
            child_nodes: vec![],
        };
        let node = SupervisoryNode {
            id: fixture_id("node/parent"),
            code: "SN1".to_string(),
            child_nodes: vec![child_node.id],
        };

        Self {
            facility1: facility("facility/1", "HC01", "Comfort Health Clinic"),
            facility2: facility("facility/2", "HC02", "Nandumbo Health Center"),
            warehouse: facility("facility/warehouse", "W001", "Ninitiative Warehouse"),
            program1: Program {
                id: fixture_id("program/1"),
                code: "PRG001".to_string(),
                name: "Family Planning".to_string(),
                periods_skippable: true,
            },
            program2: Program {
                id: fixture_id("program/2"),
                code: "PRG002".to_string(),
                name: "Essential Meds".to_string(),
                periods_skippable: false,
            },
            period: ProcessingPeriod {
                id: fixture_id("period/2016-01"),
                name: "Jan2016".to_string(),
                start_date: NaiveDate::from_ymd_opt(2016, 1, 1).expect("valid date"),
                end_date: NaiveDate::from_ymd_opt(2016, 1, 31).expect("valid date"),
            },
            products: vec![
                Product {
                    id: fixture_id("product/condoms"),
                    code: "C100".to_string(),
                    name: "Male Condom".to_string(),
                },
                Product {
                    id: fixture_id("product/levonorgestrel"),
                    code: "C200".to_string(),
                    name: "Levonorgestrel".to_string(),
                },
            ],
            approver: User {
                id: fixture_id("user/approver"),
                username: "approver".to_string(),
                first_name: Some("Ada".to_string()),
                last_name: Some("Approver".to_string()),
                role_assignments: vec![RoleAssignment {
                    supervised_node: Some(node.id),
                    rights: vec![RIGHT_APPROVE_REQUISITION.to_string()],
                }],
            },
            clerk: User {
                id: fixture_id("user/clerk"),
                username: "clerk".to_string(),
                first_name: None,
                last_name: None,
                role_assignments: vec![],
            },
            node,
            child_node,
        }
    }

    /// Reference data for this world. Both products are in `program1`'s
    /// catalog; `program2` has none.
    pub fn refdata(&self) -> StaticReferenceData {
        let mut data = StaticReferenceData::default()
            .with_facility(self.facility1.clone())
            .with_facility(self.facility2.clone())
            .with_facility(self.warehouse.clone())
            .with_program(self.program1.clone())
            .with_program(self.program2.clone())
            .with_period(self.period.clone())
            .with_supervisory_node(self.node.clone())
            .with_supervisory_node(self.child_node.clone())
            .with_user(self.approver.clone())
            .with_user(self.clerk.clone())
            .with_supply_line(SupplyLine {
                program: self.program1.id,
                supervisory_node: self.node.id,
                supplying_facility: self.warehouse.id,
            });
        for p in &self.products {
            data = data.with_program_product(self.program1.id, p.clone());
        }
        data
    }

    pub fn harness(&self) -> Harness {
        Harness::new(self, false)
    }

    /// Harness whose settings skip the AUTHORIZED step on approve.
    pub fn harness_skipping_authorization(&self) -> Harness {
        Harness::new(self, true)
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// A service over a fresh `MemStore`. The store stays reachable so tests can
/// seed and inspect rows directly.
pub struct Harness {
    pub store: Arc<MemStore>,
    pub service: Arc<RequisitionService>,
}

impl Harness {
    fn new(world: &World, skip_authorization: bool) -> Self {
        let settings: Arc<dyn SettingsProvider> =
            Arc::new(StaticSettings::default().with(SKIP_AUTHORIZATION, skip_authorization));
        Self::with_settings(world, settings)
    }

    pub fn with_settings(world: &World, settings: Arc<dyn SettingsProvider>) -> Self {
        let store = Arc::new(MemStore::new());
        let service = RequisitionService::new(
            Arc::clone(&store) as Arc<dyn RequisitionStore>,
            Arc::new(world.refdata()),
            settings,
        );
        Self {
            store,
            service: Arc::new(service),
        }
    }

    /// Store a requisition as-is, bypassing the lifecycle.
    pub async fn seed(&self, r: &Requisition) -> anyhow::Result<()> {
        self.store.save_requisition(r).await
    }
}

// ---------------------------------------------------------------------------
// Lines
// ---------------------------------------------------------------------------

/// A line that passes submit validation: every quantity is 1.
pub fn complete_line(product: Uuid) -> RequisitionLine {
    RequisitionLine {
        product,
        requested_quantity: Some(1),
        beginning_balance: Some(1),
        stock_on_hand: Some(1),
        total_consumed_quantity: Some(1),
        total_received_quantity: Some(1),
        total_losses_and_adjustments: Some(1),
        approved_quantity: None,
    }
}

// ---------------------------------------------------------------------------
// Four-requisition search scenario
// ---------------------------------------------------------------------------

/// req1 facility1/program1 now, req2 facility2/program1 2015-04-01,
/// req3 facility1/program2 2015-12-01, req4 facility2/program2 2015-02-01.
#[derive(Debug, Clone)]
pub struct SearchScenario {
    pub req1: Requisition,
    pub req2: Requisition,
    pub req3: Requisition,
    pub req4: Requisition,
}

pub async fn seed_search_scenario(
    store: &dyn RequisitionStore,
    world: &World,
) -> anyhow::Result<SearchScenario> {
    let at = |facility: &Facility, program: &Program, created: Option<(i32, u32, u32)>| {
        let mut r = Requisition::initiated(facility.id, program.id, world.period.id, false);
        if let Some((y, m, d)) = created {
            if let Some(ts) = Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).single() {
                r.created_date = ts;
            }
        }
        r
    };

    let scenario = SearchScenario {
        req1: at(&world.facility1, &world.program1, None),
        req2: at(&world.facility2, &world.program1, Some((2015, 4, 1))),
        req3: at(&world.facility1, &world.program2, Some((2015, 12, 1))),
        req4: at(&world.facility2, &world.program2, Some((2015, 2, 1))),
    };
    for r in [
        &scenario.req1,
        &scenario.req2,
        &scenario.req3,
        &scenario.req4,
    ] {
        store.save_requisition(r).await?;
    }
    Ok(scenario)
}
