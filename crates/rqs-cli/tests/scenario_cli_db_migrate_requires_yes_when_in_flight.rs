use predicates::prelude::*;
use rqs_db::RequisitionStore;
use uuid::Uuid;

/// `rqs db migrate` must refuse while requisitions await approval unless --yes.
///
/// DB-backed test, skipped if RQS_DATABASE_URL is not set.
#[allow(deprecated)]
#[tokio::test]
async fn cli_db_migrate_requires_yes_when_in_flight() -> anyhow::Result<()> {
    let url = match std::env::var(rqs_db::ENV_DB_URL) {
        Ok(v) => v,
        Err(_) => {
            eprintln!("SKIP: RQS_DATABASE_URL not set");
            return Ok(());
        }
    };

    let pool = match rqs_db::connect(&url).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("SKIP: cannot connect to DB: {e}");
            return Ok(());
        }
    };
    rqs_db::migrate(&pool).await?;

    // Unique facility keeps this row clear of other tests.
    let store = rqs_db::PgStore::new(pool);
    let mut r = rqs_schemas::Requisition::initiated(
        Uuid::new_v4(),
        Uuid::new_v4(),
        Uuid::new_v4(),
        false,
    );
    r.status = rqs_schemas::RequisitionStatus::Submitted;
    store.save_requisition(&r).await?;

    let mut cmd = assert_cmd::Command::cargo_bin("rqs")?;
    cmd.env(rqs_db::ENV_DB_URL, &url).args(["db", "migrate"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("REFUSING MIGRATE"));

    let mut cmd2 = assert_cmd::Command::cargo_bin("rqs")?;
    cmd2.env(rqs_db::ENV_DB_URL, &url)
        .args(["db", "migrate", "--yes"]);
    cmd2.assert()
        .success()
        .stdout(predicate::str::contains("migrations_applied=true"));

    store.delete_requisition(r.id).await?;
    Ok(())
}
