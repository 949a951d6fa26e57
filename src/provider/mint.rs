//! Physical ids and computed attributes for newly created objects.
//!
//! Shared by the in-memory and SQLite engines so both hand out ids of the
//! same shape as the real cloud.

use serde_json::Value;

use crate::resource::{association_id, route_id, Attributes, ResourceKind};

/// Mint a physical id for a new object.
///
/// Routes and associations get composite ids derived from their endpoints;
/// name-keyed kinds use an explicit name when one is given.
pub fn mint_id(stack: &str, address: &str, kind: ResourceKind, attributes: &Attributes) -> String {
    let attr = |key: &str| {
        attributes
            .get(key)
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    let suffix = random_hex(17);

    match kind {
        ResourceKind::Vpc => format!("vpc-{}", suffix),
        ResourceKind::InternetGateway => format!("igw-{}", suffix),
        ResourceKind::Subnet => format!("subnet-{}", suffix),
        ResourceKind::RouteTable => format!("rtb-{}", suffix),
        ResourceKind::SecurityGroup => format!("sg-{}", suffix),
        ResourceKind::Instance => format!("i-{}", suffix),
        ResourceKind::Route => route_id(
            &attr("route_table_id").unwrap_or_default(),
            &attr("destination_cidr_block").unwrap_or_default(),
        ),
        ResourceKind::RouteTableAssociation => association_id(
            &attr("subnet_id").unwrap_or_default(),
            &attr("route_table_id").unwrap_or_default(),
        ),
        ResourceKind::IamRole | ResourceKind::InstanceProfile => attr("name")
            .unwrap_or_else(|| format!("{}-{}-{}", stack, address, random_hex(12).to_uppercase())),
        ResourceKind::Bucket => attr("bucket").unwrap_or_else(|| {
            format!("{}-{}-{}", stack, address, random_hex(12)).to_lowercase()
        }),
    }
}

/// Attributes the cloud fills in on creation.
pub fn computed_attributes(kind: ResourceKind, id: &str, region: &str) -> Attributes {
    let mut computed = Attributes::new();
    match kind {
        ResourceKind::Instance => {
            let host = public_host_octet(id);
            computed.insert(
                "public_ip".to_string(),
                Value::String(format!("203.0.113.{}", host)),
            );
            computed.insert(
                "public_dns".to_string(),
                Value::String(format!(
                    "ec2-203-0-113-{}.{}.compute.amazonaws.com",
                    host, region
                )),
            );
        }
        ResourceKind::IamRole | ResourceKind::InstanceProfile => {
            computed.insert("name".to_string(), Value::String(id.to_string()));
        }
        ResourceKind::Bucket => {
            computed.insert("bucket".to_string(), Value::String(id.to_string()));
        }
        _ => {}
    }
    computed
}

/// Overlay `changes` onto `base`, key by key.
pub fn merge_attributes(base: &mut Attributes, changes: &Attributes) {
    for (key, value) in changes {
        base.insert(key.clone(), value.clone());
    }
}

fn random_hex(len: usize) -> String {
    let mut hex = uuid::Uuid::new_v4().simple().to_string();
    hex.truncate(len);
    hex
}

/// Host octet in 1..=254, stable for a given id.
fn public_host_octet(id: &str) -> u8 {
    let sum = id.bytes().fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
    (sum % 254) as u8 + 1
}
