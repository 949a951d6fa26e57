mod common;

use serde_json::json;
use tether::resource::ResourceKind;
use tether::stack::access::{trust_policy, COMPUTE_PRINCIPAL, INLINE_POLICY_NAME, MANAGED_POLICY_ARNS};
use tether::stack::{self, build_stack};

#[test]
fn test_role_policies() {
    let plan = common::dev_plan();
    let role = plan.get(stack::EC2_ROLE).unwrap();
    assert_eq!(role.kind, ResourceKind::IamRole);

    let managed = role.attributes["managed_policy_arns"].as_array().unwrap();
    assert_eq!(managed.len(), 2);
    for arn in MANAGED_POLICY_ARNS {
        assert!(managed.contains(&json!(arn)));
    }

    let inline = role.attributes["inline_policy"].as_array().unwrap();
    assert_eq!(inline.len(), 1);
    assert_eq!(inline[0]["name"], json!(INLINE_POLICY_NAME));
    assert_eq!(
        inline[0]["policy"]["Statement"][0]["Action"],
        json!(["logs:PutRetentionPolicy"])
    );
    assert_eq!(inline[0]["policy"]["Statement"][0]["Resource"], json!(["*"]));
}

#[test]
fn test_only_compute_service_may_assume_role() {
    let policy = trust_policy();
    let statements = policy["Statement"].as_array().unwrap();
    assert_eq!(statements.len(), 1);
    assert_eq!(statements[0]["Action"], json!("sts:AssumeRole"));
    assert_eq!(statements[0]["Principal"]["Service"], json!(COMPUTE_PRINCIPAL));

    let plan = common::dev_plan();
    let role = plan.get(stack::EC2_ROLE).unwrap();
    assert_eq!(role.attributes["assume_role_policy"], policy);
}

#[test]
fn test_instance_profile_wraps_role() {
    let plan = common::dev_plan();
    let profile = plan.get(stack::INSTANCE_PROFILE).unwrap();
    assert_eq!(profile.reference_target("role").as_deref(), Some(stack::EC2_ROLE));
    assert!(plan.has_edge(stack::EC2_ROLE, stack::INSTANCE_PROFILE));
}

#[test]
fn test_ssh_group_allows_port_22_only() {
    let plan = common::dev_plan();
    let ssh = plan.get(stack::SSH_SECURITY_GROUP).unwrap();
    assert_eq!(ssh.attributes["description"], json!("Security Group for SSH"));

    let ingress = ssh.attributes["ingress"].as_array().unwrap();
    assert_eq!(ingress.len(), 1);
    assert_eq!(ingress[0]["protocol"], json!("tcp"));
    assert_eq!(ingress[0]["from_port"], json!(22));
    assert_eq!(ingress[0]["to_port"], json!(22));
    assert_eq!(ingress[0]["cidr_blocks"], json!(["0.0.0.0/0"]));

    let egress = ssh.attributes["egress"].as_array().unwrap();
    assert_eq!(egress.len(), 1);
    assert_eq!(egress[0]["protocol"], json!("-1"));
}

#[test]
fn test_instance_group_has_no_ingress() {
    let plan = common::dev_plan();
    let group = plan.get(stack::EC2_SECURITY_GROUP).unwrap();
    assert_eq!(group.attributes["ingress"], json!([]));
    assert_eq!(group.attributes["egress"].as_array().unwrap().len(), 1);
    assert_eq!(group.reference_target("vpc_id").as_deref(), Some(stack::VPC));
}

#[test]
fn test_instance_wiring() {
    let plan = common::dev_plan();
    let instance = plan.get(stack::INSTANCE).unwrap();

    let groups = instance.attributes["vpc_security_group_ids"].as_array().unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(
        groups,
        &vec![json!("${ec2InstanceSecurityGroup.id}"), json!("${SSHSecurityGroup.id}")]
    );
    assert_eq!(instance.reference_target("subnet_id").as_deref(), Some(stack::PUBLIC_SUBNET1));
    assert_eq!(
        instance.reference_target("iam_instance_profile").as_deref(),
        Some(stack::INSTANCE_PROFILE)
    );
    assert_eq!(instance.attributes["instance_type"], json!("m7g.large"));
    assert_eq!(instance.attributes["ami"], json!(common::AMI));

    for dependency in [
        stack::PUBLIC_SUBNET1,
        stack::EC2_SECURITY_GROUP,
        stack::SSH_SECURITY_GROUP,
        stack::INSTANCE_PROFILE,
        stack::EC2_ROLE,
        stack::ASSET_BUCKET,
    ] {
        assert!(plan.has_edge(dependency, stack::INSTANCE), "missing {}", dependency);
    }
}

#[test]
fn test_instance_never_enforces_boot_script_or_image() {
    let plan = common::dev_plan();
    let instance = plan.get(stack::INSTANCE).unwrap();
    assert!(instance.ignore_changes.contains("user_data"));
    assert!(instance.ignore_changes.contains("ami"));

    let user_data = instance.attributes["user_data"].as_str().unwrap();
    assert!(user_data.contains("s3://${assetBucket.id}/sample"));
    assert!(!user_data.contains("authorized_keys"));
}

#[test]
fn test_ssh_key_lands_in_boot_script() {
    let mut env = common::environment(tether::catalog::EnvName::Prod);
    env.instance_size = "XLARGE2".to_string();
    env.ssh_pub_key = Some("ssh-ed25519 AAAAC3Nza prod".to_string());

    let plan = build_stack(&env, &common::lookups()).unwrap();
    let instance = plan.get(stack::INSTANCE).unwrap();
    assert_eq!(instance.attributes["instance_type"], json!("m7g.xlarge2"));
    let user_data = instance.attributes["user_data"].as_str().unwrap();
    assert!(user_data.contains("\"STACK_ID\": \"EC2-Prod\""));
    assert!(user_data.contains("ssh-ed25519 AAAAC3Nza prod"));
}

#[test]
fn test_bucket_is_force_destroyed() {
    let plan = common::dev_plan();
    let bucket = plan.get(stack::ASSET_BUCKET).unwrap();
    assert_eq!(bucket.kind, ResourceKind::Bucket);
    assert_eq!(bucket.attributes["force_destroy"], json!(true));
    assert_eq!(bucket.tag_name(), Some("EC2-Dev/EC2/assetBucket"));
}
