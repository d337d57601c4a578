//! Scenario: CLI guardrails that need no database.
//!
//! # Coverage
//! 1. `config-hash` prints a stable hash; a later layer changes it.
//! 2. `config-hash` refuses a literal secret in YAML.
//! 3. `release` without `--yes` refuses before touching the database.
//! 4. Malformed ids are rejected with the argument named.

use predicates::prelude::*;

fn fixture(name: &str) -> String {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

fn hash_of(output: &[u8]) -> String {
    String::from_utf8_lossy(output)
        .lines()
        .find_map(|l| l.strip_prefix("config_hash="))
        .expect("config_hash line")
        .to_string()
}

#[allow(deprecated)]
#[test]
fn config_hash_is_stable_and_layer_sensitive() -> anyhow::Result<()> {
    let base = fixture("base.yaml");
    let local = fixture("local.yaml");

    let first = assert_cmd::Command::cargo_bin("rqs")?
        .args(["config-hash", &base])
        .assert()
        .success()
        .stdout(predicate::str::contains("config_hash="))
        .get_output()
        .stdout
        .clone();
    let second = assert_cmd::Command::cargo_bin("rqs")?
        .args(["config-hash", &base])
        .output()?
        .stdout;
    assert_eq!(hash_of(&first), hash_of(&second));

    let layered = assert_cmd::Command::cargo_bin("rqs")?
        .args(["config-hash", &base, &local])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""skip_authorization":true"#))
        .get_output()
        .stdout
        .clone();
    assert_ne!(hash_of(&first), hash_of(&layered));
    Ok(())
}

#[allow(deprecated)]
#[test]
fn config_hash_refuses_literal_secrets() -> anyhow::Result<()> {
    assert_cmd::Command::cargo_bin("rqs")?
        .args(["config-hash", &fixture("literal_secret.yaml")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CONFIG_SECRET_DETECTED"))
        .stderr(predicate::str::contains("hunter2").not());
    Ok(())
}

#[allow(deprecated)]
#[test]
fn release_requires_yes() -> anyhow::Result<()> {
    let id = uuid::Uuid::new_v4().to_string();
    assert_cmd::Command::cargo_bin("rqs")?
        .env_remove(rqs_db::ENV_DB_URL)
        .args(["release", "--ids", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("REFUSING RELEASE"));
    Ok(())
}

#[allow(deprecated)]
#[test]
fn malformed_ids_are_named() -> anyhow::Result<()> {
    assert_cmd::Command::cargo_bin("rqs")?
        .args(["release", "--ids", "not-a-uuid", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid requisition id: not-a-uuid"));

    assert_cmd::Command::cargo_bin("rqs")?
        .args(["order", "csv", "42"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid order id: 42"));
    Ok(())
}
