//! `rqs order csv <id>`.

use anyhow::Result;

use super::{parse_id, pg_service};

pub async fn csv(raw_id: &str) -> Result<()> {
    let id = parse_id("order", raw_id)?;
    let service = pg_service().await?;
    let out = service.print_order_csv(id).await?;
    print!("{out}");
    Ok(())
}
