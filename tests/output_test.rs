mod common;

use std::collections::HashMap;

use serde_json::json;
use tether::output::formatter::short_digest;
use tether::output::report::StateReport;
use tether::output::{OutputError, StackOutputs};
use tether::planner::diff::compute_changes;
use tether::planner::{reconcile, AdoptionStrategy};
use tether::provider::ObservedResource;
use tether::resource::{Attributes, ResourceKind};
use tether::stack;

fn observed(kind: ResourceKind, id: &str, attributes: serde_json::Value) -> ObservedResource {
    ObservedResource::unmanaged(kind, id, attributes.as_object().cloned().unwrap_or_default())
}

fn full_stack() -> HashMap<String, ObservedResource> {
    let mut map = HashMap::new();
    let mut put = |address: &str, resource: ObservedResource| {
        map.insert(address.to_string(), resource);
    };
    put(stack::VPC, observed(ResourceKind::Vpc, "vpc-1", json!({})));
    put(stack::PUBLIC_SUBNET1, observed(ResourceKind::Subnet, "subnet-1", json!({})));
    put(stack::PUBLIC_SUBNET2, observed(ResourceKind::Subnet, "subnet-2", json!({})));
    put(stack::SSH_SECURITY_GROUP, observed(ResourceKind::SecurityGroup, "sg-ssh", json!({})));
    put(stack::EC2_SECURITY_GROUP, observed(ResourceKind::SecurityGroup, "sg-ec2", json!({})));
    put(stack::EC2_ROLE, observed(ResourceKind::IamRole, "EC2-Dev-role", json!({})));
    put(stack::INSTANCE_PROFILE, observed(ResourceKind::InstanceProfile, "EC2-Dev-profile", json!({})));
    put(stack::ASSET_BUCKET, observed(ResourceKind::Bucket, "ec2-dev-bucket", json!({})));
    put(
        stack::INSTANCE,
        observed(
            ResourceKind::Instance,
            "i-0abc",
            json!({ "public_ip": "203.0.113.10", "public_dns": "ec2-203-0-113-10.us-west-2.compute.amazonaws.com" }),
        ),
    );
    map
}

#[test]
fn test_outputs_from_observed_objects() {
    let outputs = StackOutputs::from_observed(&full_stack()).unwrap();
    assert_eq!(outputs.vpc_id, "vpc-1");
    assert_eq!(outputs.ec2_role_name, "EC2-Dev-role");
    assert_eq!(outputs.instance_profile_name, "EC2-Dev-profile");
    assert_eq!(outputs.asset_bucket_name, "ec2-dev-bucket");
    assert_eq!(outputs.ssm_command, "aws ssm start-session --target i-0abc");
    assert_eq!(
        outputs.ssh_command,
        "ssh ec2-user@ec2-203-0-113-10.us-west-2.compute.amazonaws.com"
    );
    assert_eq!(outputs.entries().len(), 13);
    assert_eq!(outputs.entries()[0], ("vpc_id", "vpc-1"));
}

#[test]
fn test_missing_instance_fails_with_output_name() {
    let mut objects = full_stack();
    objects.remove(stack::INSTANCE);
    assert_eq!(
        StackOutputs::from_observed(&objects).unwrap_err(),
        OutputError::MissingValue("instance_id")
    );
}

#[test]
fn test_empty_attribute_counts_as_missing() {
    let mut objects = full_stack();
    objects
        .get_mut(stack::INSTANCE)
        .unwrap()
        .attributes
        .insert("public_ip".to_string(), json!(""));
    assert_eq!(
        StackOutputs::from_observed(&objects).unwrap_err(),
        OutputError::MissingValue("instance_public_ip")
    );
}

#[test]
fn test_outputs_serialize_to_json() {
    let outputs = StackOutputs::from_observed(&full_stack()).unwrap();
    let value = serde_json::to_value(&outputs).unwrap();
    assert_eq!(value["public_subnet2_id"], json!("subnet-2"));
    assert_eq!(value["instance_public_ip"], json!("203.0.113.10"));
    assert_eq!(value.as_object().unwrap().len(), 13);
}

#[test]
fn test_short_digest_is_stable() {
    assert_eq!(short_digest(""), "e3b0c44298fc");
    assert_eq!(short_digest("abc").len(), 12);
    assert_ne!(short_digest("a"), short_digest("b"));
}

#[test]
fn test_state_report_counts() {
    let mut managed = observed(ResourceKind::Vpc, "vpc-1", json!({}));
    managed.managed = true;
    managed.stack = Some("EC2-Prod".to_string());
    let resources = vec![
        managed,
        observed(ResourceKind::Subnet, "subnet-1", json!({})),
        ObservedResource::unmanaged(ResourceKind::Subnet, "subnet-2", Attributes::new()),
    ];

    let report = StateReport::from_resources(&resources);
    assert_eq!(report.total(), 3);
    assert_eq!(report.unmanaged, 2);
    assert_eq!(report.by_kind[&ResourceKind::Subnet], 2);
    assert_eq!(report.stacks["EC2-Prod"], 1);
}

#[tokio::test]
async fn test_plan_summary_display() {
    let engine = common::engine();
    let mapping = tether::catalog::lookup("dev").unwrap();

    let reconciled = reconcile(AdoptionStrategy::CreateNew, &common::dev_plan(), mapping).unwrap();
    let summary = compute_changes(&reconciled, &engine).await.unwrap();
    assert_eq!(summary.to_string(), "Plan: 16 to add.");

    common::seed_existing(&engine, &common::dev(), true);
    let reconciled =
        reconcile(AdoptionStrategy::AdoptExisting, &common::dev_plan(), mapping).unwrap();
    let summary = compute_changes(&reconciled, &engine).await.unwrap();
    assert_eq!(summary.to_string(), "Plan: 16 to import.");

    tether::output::formatter::print_plan(&summary, &[]);
}
