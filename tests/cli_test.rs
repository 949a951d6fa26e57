//! Command-line tests: each test runs the `tether` binary against an isolated
//! working directory and config file.

mod common;

use std::collections::BTreeMap;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use tether::state::Snapshot;

const CONFIG: &str = r#"
project:
  engine:
    amis:
      arm64: ami-0abcdef1234567890
  settings:
    parallelism: 4
    max_retries: 0
"#;

/// Builds a `tether` Command with its own config and engine database.
fn tether_cmd(work_dir: &Path) -> Command {
    let config = work_dir.join("tether.yaml");
    if !config.exists() {
        std::fs::write(&config, CONFIG).unwrap();
    }

    let mut cmd = assert_cmd::cargo_bin_cmd!("tether");
    cmd.current_dir(work_dir)
        .arg("-c")
        .arg(&config)
        .arg("-w")
        .arg(work_dir.join(".tether"))
        .env("NO_COLOR", "1");
    for var in [
        "TETHER_ENV",
        "AWS_REGION",
        "CDK_DEFAULT_ACCOUNT",
        "CPU_TYPE",
        "INSTANCE_SIZE",
        "LOG_LEVEL",
        "SSH_PUB_KEY",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// Write a snapshot of the dev objects as they existed before adoption.
fn write_dev_snapshot(work_dir: &Path) -> std::path::PathBuf {
    let seeded = common::engine();
    common::seed_existing(&seeded, &common::dev(), true);

    let snapshot = Snapshot {
        zones: BTreeMap::from([(
            common::REGION.to_string(),
            vec!["us-west-2a".to_string(), "us-west-2b".to_string()],
        )]),
        images: BTreeMap::new(),
        resources: seeded.resources(),
    };
    let path = work_dir.join("snapshot.json");
    std::fs::write(&path, serde_json::to_string_pretty(&snapshot).unwrap()).unwrap();
    path
}

#[test]
fn test_validate() {
    let work = TempDir::new().unwrap();
    tether_cmd(work.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Catalog: 3 environment(s)"))
        .stdout(predicate::str::contains("m7g.large"))
        .stdout(predicate::str::contains("16 resource(s): 16 to adopt, 0 to create"))
        .stdout(predicate::str::contains("Configuration is valid."));
}

#[test]
fn test_validate_with_create_strategy() {
    let work = TempDir::new().unwrap();
    tether_cmd(work.path())
        .args(["--strategy", "create", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 to adopt, 16 to create"));
}

#[test]
fn test_catalog_list() {
    let work = TempDir::new().unwrap();
    tether_cmd(work.path())
        .args(["catalog", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("EC2-Dev"))
        .stdout(predicate::str::contains("EC2-Stg"))
        .stdout(predicate::str::contains("EC2-Prod"));
}

#[test]
fn test_catalog_show() {
    let work = TempDir::new().unwrap();
    let prod = tether::catalog::lookup("prod").unwrap();
    tether_cmd(work.path())
        .args(["catalog", "show", "PROD"])
        .assert()
        .success()
        .stdout(predicate::str::contains("EC2-Prod"))
        .stdout(predicate::str::contains(prod.vpc.as_str()))
        .stdout(predicate::str::contains(prod.ec2_instance.as_str()));
}

#[test]
fn test_unknown_environment_fails() {
    let work = TempDir::new().unwrap();
    tether_cmd(work.path())
        .args(["--env", "qa", "plan"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no resource mapping for environment 'qa'"));
}

#[test]
fn test_plan_create_strategy() {
    let work = TempDir::new().unwrap();
    tether_cmd(work.path())
        .args(["--strategy", "create", "plan"])
        .assert()
        .success()
        .stdout(predicate::str::contains("EC2-Dev"))
        .stdout(predicate::str::contains("Plan: 16 to add."));
}

#[test]
fn test_plan_adopt_without_objects_fails() {
    let work = TempDir::new().unwrap();
    tether_cmd(work.path())
        .arg("plan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("which does not exist"));
}

#[test]
fn test_graph() {
    let work = TempDir::new().unwrap();
    tether_cmd(work.path())
        .arg("graph")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("digraph"))
        .stdout(predicate::str::contains("adopt-implicit"));
}

#[test]
fn test_state_list_empty() {
    let work = TempDir::new().unwrap();
    tether_cmd(work.path())
        .args(["state", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No resources in state."));
}

#[test]
fn test_create_apply_then_output() {
    let work = TempDir::new().unwrap();
    tether_cmd(work.path())
        .args(["--strategy", "create", "apply", "--auto-approve"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Apply complete! Resources: 16 added"))
        .stdout(predicate::str::contains("aws ssm start-session --target i-"));

    tether_cmd(work.path())
        .args(["output", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"vpc_id\""))
        .stdout(predicate::str::contains("\"instance_public_ip\": \"203.0.113."));

    tether_cmd(work.path())
        .args(["--strategy", "create", "apply", "--auto-approve"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No changes. Infrastructure is up-to-date."));
}

#[test]
fn test_output_before_apply_fails() {
    let work = TempDir::new().unwrap();
    tether_cmd(work.path())
        .arg("output")
        .assert()
        .failure()
        .stderr(predicate::str::contains("vpc_id"));
}

#[test]
fn test_adopt_from_snapshot() {
    let work = TempDir::new().unwrap();
    let snapshot = write_dev_snapshot(work.path());

    tether_cmd(work.path())
        .args(["state", "load"])
        .arg(&snapshot)
        .assert()
        .success()
        .stdout(predicate::str::contains("Loaded 16 object(s)"));

    tether_cmd(work.path())
        .args(["state", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("vpc-00670458d2ea5bd69"));

    tether_cmd(work.path())
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("Plan: 16 to import."));

    let instance = tether::catalog::lookup("dev").unwrap().ec2_instance.clone();
    tether_cmd(work.path())
        .args(["apply", "--auto-approve"])
        .assert()
        .success()
        .stdout(predicate::str::contains("16 imported"))
        .stdout(predicate::str::contains(format!(
            "aws ssm start-session --target {}",
            instance
        )));

    tether_cmd(work.path())
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("No changes."));
}
