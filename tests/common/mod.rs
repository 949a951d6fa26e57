#![allow(dead_code)]

use std::collections::HashMap;

use serde_json::json;
use tether::catalog::{self, EnvName};
use tether::config::types::Environment;
use tether::dag::AdoptionPlan;
use tether::planner::{reconcile, AdoptionStrategy, Disposition};
use tether::provider::memory::MemoryEngine;
use tether::provider::{Lookups, ObservedResource};
use tether::resource::reference::resolve_attributes;
use tether::resource::{route_id, ResourceKind};
use tether::sizing::CpuArch;
use tether::stack::{self, build_stack};

pub const REGION: &str = "us-west-2";
pub const AMI: &str = "ami-0abcdef1234567890";
pub const LEGACY_AMI: &str = "ami-0123456789abcdef0";
pub const LEGACY_USER_DATA: &str = "#!/bin/bash\necho provisioned-by-hand";
pub const LEGACY_PUBLIC_IP: &str = "198.51.100.7";
pub const LEGACY_PUBLIC_DNS: &str = "ec2-198-51-100-7.us-west-2.compute.amazonaws.com";

pub fn environment(name: EnvName) -> Environment {
    Environment {
        name,
        region: REGION.to_string(),
        account: None,
        cpu_arch: CpuArch::Arm64,
        instance_size: "LARGE".to_string(),
        ssh_pub_key: None,
        log_level: "INFO".to_string(),
    }
}

pub fn dev() -> Environment {
    environment(EnvName::Dev)
}

pub fn lookups() -> Lookups {
    Lookups {
        zones: vec!["us-west-2a".to_string(), "us-west-2b".to_string()],
        ami: AMI.to_string(),
    }
}

pub fn dev_plan() -> AdoptionPlan {
    build_stack(&dev(), &lookups()).unwrap()
}

/// An empty engine with an image registered for ARM64.
pub fn engine() -> MemoryEngine {
    MemoryEngine::new(REGION)
        .with_zones(&["us-west-2a", "us-west-2b"])
        .with_ami(CpuArch::Arm64, AMI)
}

/// Seed the objects the catalog points at, as they were deployed before
/// adoption: matching the stack, except for the instance's boot script and
/// image and the security group descriptions.
///
/// Routes are seeded too unless `with_routes` is false.
pub fn seed_existing(engine: &MemoryEngine, env: &Environment, with_routes: bool) {
    let plan = build_stack(env, &lookups()).unwrap();
    let mapping = catalog::lookup(env.name.as_str()).unwrap();
    let reconciled = reconcile(AdoptionStrategy::AdoptExisting, &plan, mapping).unwrap();

    let mut seeded: HashMap<String, ObservedResource> = HashMap::new();
    for entry in &reconciled.resources {
        let lookup = |addr: &str, attr: &str| seeded.get(addr).and_then(|o| o.attribute(attr));
        let mut attributes = resolve_attributes(&entry.resource.attributes, &lookup);

        let id = match &entry.disposition {
            Disposition::Adopt { id } => id.clone(),
            Disposition::AdoptImplicit { via } if with_routes => {
                route_id(&seeded[via].id, "0.0.0.0/0")
            }
            _ => continue,
        };

        match entry.kind() {
            ResourceKind::Instance => {
                attributes.insert("user_data".to_string(), json!(LEGACY_USER_DATA));
                attributes.insert("ami".to_string(), json!(LEGACY_AMI));
                attributes.insert("public_ip".to_string(), json!(LEGACY_PUBLIC_IP));
                attributes.insert("public_dns".to_string(), json!(LEGACY_PUBLIC_DNS));
            }
            ResourceKind::SecurityGroup => {
                attributes.insert("description".to_string(), json!("Managed by CloudFormation"));
            }
            _ => {}
        }

        let observed = ObservedResource::unmanaged(entry.kind(), &id, attributes);
        engine.insert(observed.clone());
        seeded.insert(entry.address().to_string(), observed);
    }
}

/// Addresses of the two default routes.
pub fn routes() -> [&'static str; 2] {
    [stack::DEFAULT_ROUTE1, stack::DEFAULT_ROUTE2]
}
