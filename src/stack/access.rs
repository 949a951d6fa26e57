use serde_json::{json, Value};

use super::{EC2_ROLE, EC2_SECURITY_GROUP, INSTANCE_PROFILE, SSH_SECURITY_GROUP, VPC};
use crate::catalog::Slot;
use crate::resource::reference::reference;
use crate::resource::{name_tag, LogicalResource, ResourceKind};

pub const COMPUTE_PRINCIPAL: &str = "ec2.amazonaws.com";
pub const MANAGED_POLICY_ARNS: [&str; 2] = [
    "arn:aws:iam::aws:policy/AmazonSSMManagedInstanceCore",
    "arn:aws:iam::aws:policy/CloudWatchAgentServerPolicy",
];
pub const INLINE_POLICY_NAME: &str = "RetentionPolicy";

/// Role, instance profile, and the two security groups.
pub fn resources(stack: &str) -> Vec<LogicalResource> {
    vec![
        LogicalResource::new(EC2_ROLE, ResourceKind::IamRole)
            .bound_through(Slot::Ec2Role)
            .attr("assume_role_policy", trust_policy())
            .attr("managed_policy_arns", json!(MANAGED_POLICY_ARNS))
            .attr("inline_policy", json!([retention_policy()]))
            .name_tag(name_tag(stack, "EC2/serverEc2Role")),
        LogicalResource::new(INSTANCE_PROFILE, ResourceKind::InstanceProfile)
            .bound_through(Slot::InstanceProfile)
            .attr("role", reference(EC2_ROLE, "name"))
            .name_tag(name_tag(stack, "EC2/InstanceProfile"))
            .depends_on(EC2_ROLE),
        LogicalResource::new(SSH_SECURITY_GROUP, ResourceKind::SecurityGroup)
            .bound_through(Slot::SshSecurityGroup)
            .attr("vpc_id", reference(VPC, "id"))
            .attr("description", "Security Group for SSH")
            .attr(
                "ingress",
                json!([{
                    "protocol": "tcp",
                    "from_port": 22,
                    "to_port": 22,
                    "cidr_blocks": ["0.0.0.0/0"],
                    "description": "Allow SSH inbound traffic on TCP port 22",
                }]),
            )
            .attr("egress", json!([allow_all_egress()]))
            .name_tag(name_tag(stack, "VPC/SSHSecurityGroup"))
            .depends_on(VPC),
        LogicalResource::new(EC2_SECURITY_GROUP, ResourceKind::SecurityGroup)
            .bound_through(Slot::Ec2SecurityGroup)
            .attr("vpc_id", reference(VPC, "id"))
            .attr("description", "Security Group for EC2 Instance")
            .attr("ingress", json!([]))
            .attr("egress", json!([allow_all_egress()]))
            .name_tag(name_tag(stack, "EC2/ec2InstanceSecurityGroup"))
            .depends_on(VPC),
    ]
}

/// Only the compute service may assume the role.
pub fn trust_policy() -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Action": "sts:AssumeRole",
            "Effect": "Allow",
            "Principal": { "Service": COMPUTE_PRINCIPAL },
        }],
    })
}

fn retention_policy() -> Value {
    json!({
        "name": INLINE_POLICY_NAME,
        "policy": {
            "Version": "2012-10-17",
            "Statement": [{
                "Effect": "Allow",
                "Action": ["logs:PutRetentionPolicy"],
                "Resource": ["*"],
            }],
        },
    })
}

fn allow_all_egress() -> Value {
    json!({
        "protocol": "-1",
        "from_port": 0,
        "to_port": 0,
        "cidr_blocks": ["0.0.0.0/0"],
        "description": "Allow all outbound traffic",
    })
}
