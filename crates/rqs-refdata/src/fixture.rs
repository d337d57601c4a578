//! In-process reference data loaded from a YAML/JSON fixture or built up in
//! code. Used for local runs and by every test that does not exercise HTTP.

use crate::ReferenceDataProvider;
use anyhow::{Context, Result};
use rqs_schemas::{
    Facility, ProcessingPeriod, Product, Program, ProgramProduct, SupervisoryNode, SupplyLine,
    User,
};
use serde::{Deserialize, Serialize};
use std::fs;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StaticReferenceData {
    pub facilities: Vec<Facility>,
    pub programs: Vec<Program>,
    pub processing_periods: Vec<ProcessingPeriod>,
    pub products: Vec<Product>,
    pub program_products: Vec<ProgramProduct>,
    pub users: Vec<User>,
    pub supervisory_nodes: Vec<SupervisoryNode>,
    pub supply_lines: Vec<SupplyLine>,
}

impl StaticReferenceData {
    /// YAML is a superset of JSON, so either format loads.
    pub fn from_path(path: &str) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read referencedata fixture: {path}"))?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw).context("referencedata fixture parse failed")
    }

    pub fn with_facility(mut self, f: Facility) -> Self {
        self.facilities.push(f);
        self
    }

    pub fn with_program(mut self, p: Program) -> Self {
        self.programs.push(p);
        self
    }

    pub fn with_period(mut self, p: ProcessingPeriod) -> Self {
        self.processing_periods.push(p);
        self
    }

    /// Adds the product and its catalog entry under `program`.
    pub fn with_program_product(mut self, program: Uuid, product: Product) -> Self {
        self.program_products.push(ProgramProduct {
            program,
            product: product.id,
        });
        self.products.push(product);
        self
    }

    pub fn with_user(mut self, u: User) -> Self {
        self.users.push(u);
        self
    }

    pub fn with_supervisory_node(mut self, n: SupervisoryNode) -> Self {
        self.supervisory_nodes.push(n);
        self
    }

    pub fn with_supply_line(mut self, s: SupplyLine) -> Self {
        self.supply_lines.push(s);
        self
    }
}

#[async_trait::async_trait]
impl ReferenceDataProvider for StaticReferenceData {
    fn source_name(&self) -> &'static str {
        "static"
    }

    async fn facility(&self, id: Uuid) -> Result<Option<Facility>> {
        Ok(self.facilities.iter().find(|f| f.id == id).cloned())
    }

    async fn program(&self, id: Uuid) -> Result<Option<Program>> {
        Ok(self.programs.iter().find(|p| p.id == id).cloned())
    }

    async fn processing_period(&self, id: Uuid) -> Result<Option<ProcessingPeriod>> {
        Ok(self.processing_periods.iter().find(|p| p.id == id).cloned())
    }

    async fn product(&self, id: Uuid) -> Result<Option<Product>> {
        Ok(self.products.iter().find(|p| p.id == id).cloned())
    }

    async fn user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.iter().find(|u| u.id == id).cloned())
    }

    async fn supervisory_node(&self, id: Uuid) -> Result<Option<SupervisoryNode>> {
        Ok(self.supervisory_nodes.iter().find(|n| n.id == id).cloned())
    }

    async fn program_products(&self, program: Uuid) -> Result<Vec<ProgramProduct>> {
        Ok(self
            .program_products
            .iter()
            .filter(|pp| pp.program == program)
            .cloned()
            .collect())
    }

    async fn supply_lines(&self, program: Uuid, supervisory_node: Uuid) -> Result<Vec<SupplyLine>> {
        Ok(self
            .supply_lines
            .iter()
            .filter(|s| s.program == program && s.supervisory_node == supervisory_node)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixture_yaml_loads_and_resolves() {
        let facility = Uuid::new_v4();
        let program = Uuid::new_v4();
        let raw = format!(
            r#"
facilities:
  - id: "{facility}"
    code: "HC01"
    name: "Comfort Health Clinic"
programs:
  - id: "{program}"
    code: "PRG001"
    name: "Family Planning"
    periodsSkippable: true
"#
        );
        let data = StaticReferenceData::from_yaml_str(&raw).unwrap();

        let f = data.facility(facility).await.unwrap().unwrap();
        assert_eq!(f.code, "HC01");
        let p = data.program(program).await.unwrap().unwrap();
        assert!(p.periods_skippable);
        assert!(data.user(Uuid::new_v4()).await.unwrap().is_none());
        assert!(data.program_products(program).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn supply_lines_match_program_and_node() {
        let program = Uuid::new_v4();
        let node = Uuid::new_v4();
        let line = SupplyLine {
            program,
            supervisory_node: node,
            supplying_facility: Uuid::new_v4(),
        };
        let data = StaticReferenceData::default().with_supply_line(line.clone());

        assert_eq!(data.supply_lines(program, node).await.unwrap(), vec![line]);
        assert!(data
            .supply_lines(program, Uuid::new_v4())
            .await
            .unwrap()
            .is_empty());
    }
}
