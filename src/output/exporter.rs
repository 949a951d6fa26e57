use std::collections::HashMap;

use anyhow::Result;
use serde::Serialize;
use thiserror::Error;

use crate::provider::{ObservedResource, ProvisioningEngine};
use crate::stack;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OutputError {
    #[error("output '{0}' has no value; has the stack been applied?")]
    MissingValue(&'static str),
}

/// The stack's named outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackOutputs {
    pub vpc_id: String,
    pub public_subnet1_id: String,
    pub public_subnet2_id: String,
    pub ssh_security_group_id: String,
    pub ec2_security_group_id: String,
    pub ec2_role_name: String,
    pub instance_profile_name: String,
    pub asset_bucket_name: String,
    pub instance_id: String,
    pub instance_public_ip: String,
    pub instance_public_dns: String,
    pub ssm_command: String,
    pub ssh_command: String,
}

/// `(output name, resource address, attribute)` for every direct output.
const SOURCES: [(&str, &str, &str); 11] = [
    ("vpc_id", stack::VPC, "id"),
    ("public_subnet1_id", stack::PUBLIC_SUBNET1, "id"),
    ("public_subnet2_id", stack::PUBLIC_SUBNET2, "id"),
    ("ssh_security_group_id", stack::SSH_SECURITY_GROUP, "id"),
    ("ec2_security_group_id", stack::EC2_SECURITY_GROUP, "id"),
    ("ec2_role_name", stack::EC2_ROLE, "name"),
    ("instance_profile_name", stack::INSTANCE_PROFILE, "name"),
    ("asset_bucket_name", stack::ASSET_BUCKET, "id"),
    ("instance_id", stack::INSTANCE, "id"),
    ("instance_public_ip", stack::INSTANCE, "public_ip"),
    ("instance_public_dns", stack::INSTANCE, "public_dns"),
];

/// Session command for an instance.
pub fn ssm_command(instance_id: &str) -> String {
    format!("aws ssm start-session --target {}", instance_id)
}

/// SSH command for an instance's public DNS name.
pub fn ssh_command(public_dns: &str) -> String {
    format!("ssh ec2-user@{}", public_dns)
}

impl StackOutputs {
    /// Build outputs from `lookup(address, attribute)`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, OutputError>
    where
        F: Fn(&str, &str) -> Option<String>,
    {
        let mut values: HashMap<&'static str, String> = HashMap::new();
        for (name, address, attribute) in SOURCES {
            let value = lookup(address, attribute)
                .filter(|v| !v.is_empty())
                .ok_or(OutputError::MissingValue(name))?;
            values.insert(name, value);
        }
        let mut take = |name: &'static str| values.remove(name).ok_or(OutputError::MissingValue(name));

        let instance_id = take("instance_id")?;
        let instance_public_dns = take("instance_public_dns")?;
        Ok(Self {
            vpc_id: take("vpc_id")?,
            public_subnet1_id: take("public_subnet1_id")?,
            public_subnet2_id: take("public_subnet2_id")?,
            ssh_security_group_id: take("ssh_security_group_id")?,
            ec2_security_group_id: take("ec2_security_group_id")?,
            ec2_role_name: take("ec2_role_name")?,
            instance_profile_name: take("instance_profile_name")?,
            asset_bucket_name: take("asset_bucket_name")?,
            instance_public_ip: take("instance_public_ip")?,
            ssm_command: ssm_command(&instance_id),
            ssh_command: ssh_command(&instance_public_dns),
            instance_id,
            instance_public_dns,
        })
    }

    /// Build outputs from observed objects keyed by logical address.
    pub fn from_observed(observed: &HashMap<String, ObservedResource>) -> Result<Self, OutputError> {
        Self::from_lookup(|address, attribute| {
            observed
                .get(address)
                .and_then(|o| o.str_attribute(attribute))
        })
    }

    /// Read the stack's managed objects from the engine and build outputs.
    pub async fn collect(engine: &dyn ProvisioningEngine, stack_name: &str) -> Result<Self> {
        let mut observed = HashMap::new();
        for (_, address, _) in SOURCES {
            if observed.contains_key(address) {
                continue;
            }
            if let Some(found) = engine.find_managed(stack_name, address).await? {
                observed.insert(address.to_string(), found);
            }
        }
        Ok(Self::from_observed(&observed)?)
    }

    /// Name/value pairs in a fixed order.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("vpc_id", self.vpc_id.as_str()),
            ("public_subnet1_id", self.public_subnet1_id.as_str()),
            ("public_subnet2_id", self.public_subnet2_id.as_str()),
            ("ssh_security_group_id", self.ssh_security_group_id.as_str()),
            ("ec2_security_group_id", self.ec2_security_group_id.as_str()),
            ("ec2_role_name", self.ec2_role_name.as_str()),
            ("instance_profile_name", self.instance_profile_name.as_str()),
            ("asset_bucket_name", self.asset_bucket_name.as_str()),
            ("instance_id", self.instance_id.as_str()),
            ("instance_public_ip", self.instance_public_ip.as_str()),
            ("instance_public_dns", self.instance_public_dns.as_str()),
            ("ssm_command", self.ssm_command.as_str()),
            ("ssh_command", self.ssh_command.as_str()),
        ]
    }
}
