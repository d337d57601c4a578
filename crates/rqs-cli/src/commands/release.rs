//! `rqs release`: mark requisitions RELEASED through the service.

use anyhow::Result;
use uuid::Uuid;

use super::{parse_id, pg_service};

pub async fn run(raw_ids: &[String], yes: bool) -> Result<()> {
    let ids: Vec<Uuid> = raw_ids
        .iter()
        .map(|raw| parse_id("requisition", raw))
        .collect::<Result<_>>()?;

    if !yes {
        anyhow::bail!(
            "REFUSING RELEASE: {} requisition(s) would become RELEASED with no way back. Re-run with: `rqs release --ids ... --yes`",
            ids.len()
        );
    }

    let service = pg_service().await?;
    let released = service.release_requisitions_as_order(&ids).await?;
    for r in &released {
        println!("released=true requisition_id={} status={}", r.id, r.status);
    }
    Ok(())
}
