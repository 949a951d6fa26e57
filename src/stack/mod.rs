//! Builders for the logical resources of one environment's stack.

pub mod access;
pub mod boot_script;
pub mod compute;
pub mod network;

use crate::config::types::Environment;
use crate::dag::{AdoptionPlan, PlanError};
use crate::provider::Lookups;

pub const VPC: &str = "VPC";
pub const INTERNET_GATEWAY: &str = "IGW";
pub const PUBLIC_SUBNET1: &str = "ServerPublicSubnet1";
pub const PUBLIC_SUBNET2: &str = "ServerPublicSubnet2";
pub const ROUTE_TABLE1: &str = "ServerPublicSubnet1RouteTable";
pub const ROUTE_TABLE2: &str = "ServerPublicSubnet2RouteTable";
pub const DEFAULT_ROUTE1: &str = "ServerPublicSubnet1DefaultRoute";
pub const DEFAULT_ROUTE2: &str = "ServerPublicSubnet2DefaultRoute";
pub const ASSOCIATION1: &str = "ServerPublicSubnet1RouteTableAssociation";
pub const ASSOCIATION2: &str = "ServerPublicSubnet2RouteTableAssociation";
pub const SSH_SECURITY_GROUP: &str = "SSHSecurityGroup";
pub const EC2_SECURITY_GROUP: &str = "ec2InstanceSecurityGroup";
pub const EC2_ROLE: &str = "serverEc2Role";
pub const INSTANCE_PROFILE: &str = "InstanceProfile";
pub const ASSET_BUCKET: &str = "assetBucket";
pub const INSTANCE: &str = "Instance";

/// Build the full plan for an environment from resolved lookups.
///
/// Subnets go into the first two zones, in lookup order.
pub fn build_stack(env: &Environment, lookups: &Lookups) -> Result<AdoptionPlan, PlanError> {
    if lookups.zones.len() < 2 {
        return Err(PlanError::InsufficientZones(lookups.zones.len()));
    }
    if lookups.zones[0] == lookups.zones[1] {
        return Err(PlanError::DuplicateZones(lookups.zones[0].clone()));
    }
    let stack = env.stack_name();

    let mut resources = network::resources(stack, [&lookups.zones[0], &lookups.zones[1]]);
    resources.extend(access::resources(stack));
    resources.extend(compute::resources(env, &lookups.ami));

    let plan = AdoptionPlan::from_resources(stack, resources)?;
    tracing::debug!(stack = %stack, resources = plan.len(), "Built stack");
    Ok(plan)
}
