//! Logical resources: the fixed set of resource kinds, their desired
//! attributes, and the attribute sets that are excluded from drift.

pub mod reference;

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::Slot;

/// Attribute map of a resource. Keys are kept sorted.
pub type Attributes = serde_json::Map<String, Value>;

/// Placeholder for a value that only exists once a dependency is applied.
pub const UNKNOWN: &str = "(known after apply)";

// ─── Resource kinds ─────────────────────────────────────────────────────────

/// The fixed set of resource kinds this tool manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    #[serde(rename = "aws_vpc")]
    Vpc,
    #[serde(rename = "aws_internet_gateway")]
    InternetGateway,
    #[serde(rename = "aws_subnet")]
    Subnet,
    #[serde(rename = "aws_route_table")]
    RouteTable,
    #[serde(rename = "aws_route")]
    Route,
    #[serde(rename = "aws_route_table_association")]
    RouteTableAssociation,
    #[serde(rename = "aws_security_group")]
    SecurityGroup,
    #[serde(rename = "aws_iam_role")]
    IamRole,
    #[serde(rename = "aws_iam_instance_profile")]
    InstanceProfile,
    #[serde(rename = "aws_s3_bucket")]
    Bucket,
    #[serde(rename = "aws_instance")]
    Instance,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 11] = [
        ResourceKind::Vpc,
        ResourceKind::InternetGateway,
        ResourceKind::Subnet,
        ResourceKind::RouteTable,
        ResourceKind::Route,
        ResourceKind::RouteTableAssociation,
        ResourceKind::SecurityGroup,
        ResourceKind::IamRole,
        ResourceKind::InstanceProfile,
        ResourceKind::Bucket,
        ResourceKind::Instance,
    ];

    pub fn type_name(&self) -> &'static str {
        match self {
            ResourceKind::Vpc => "aws_vpc",
            ResourceKind::InternetGateway => "aws_internet_gateway",
            ResourceKind::Subnet => "aws_subnet",
            ResourceKind::RouteTable => "aws_route_table",
            ResourceKind::Route => "aws_route",
            ResourceKind::RouteTableAssociation => "aws_route_table_association",
            ResourceKind::SecurityGroup => "aws_security_group",
            ResourceKind::IamRole => "aws_iam_role",
            ResourceKind::InstanceProfile => "aws_iam_instance_profile",
            ResourceKind::Bucket => "aws_s3_bucket",
            ResourceKind::Instance => "aws_instance",
        }
    }

    /// Whether an existing object of this kind can be bound by its id.
    ///
    /// Routes cannot; they are only reachable through their route table.
    pub fn bindable_by_id(&self) -> bool {
        !matches!(self, ResourceKind::Route)
    }

    /// Kinds whose physical id is also their name.
    pub fn id_is_name(&self) -> bool {
        matches!(
            self,
            ResourceKind::IamRole | ResourceKind::InstanceProfile | ResourceKind::Bucket
        )
    }

    /// Attributes that cannot be changed in place.
    pub fn force_new_attributes(&self) -> &'static [&'static str] {
        match self {
            ResourceKind::Vpc => &["cidr_block"],
            ResourceKind::InternetGateway => &[],
            ResourceKind::Subnet => &["vpc_id", "cidr_block", "availability_zone"],
            ResourceKind::RouteTable => &["vpc_id"],
            ResourceKind::Route => &["route_table_id", "destination_cidr_block"],
            ResourceKind::RouteTableAssociation => &["subnet_id", "route_table_id"],
            ResourceKind::SecurityGroup => &["vpc_id", "description"],
            ResourceKind::IamRole => &["name"],
            ResourceKind::InstanceProfile => &["name"],
            ResourceKind::Bucket => &["bucket"],
            ResourceKind::Instance => &["ami", "subnet_id", "user_data"],
        }
    }

    pub fn forces_replacement(&self, attribute: &str) -> bool {
        self.force_new_attributes().contains(&attribute)
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .iter()
            .find(|kind| kind.type_name() == s)
            .copied()
            .ok_or_else(|| format!("unsupported resource type '{}'", s))
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Composite id of a route entry: `<route-table-id>_<destination>`.
pub fn route_id(route_table_id: &str, destination: &str) -> String {
    format!("{}_{}", route_table_id, destination)
}

/// Composite id of a route table association: `<subnet-id>/<route-table-id>`.
pub fn association_id(subnet_id: &str, route_table_id: &str) -> String {
    format!("{}/{}", subnet_id, route_table_id)
}

// ─── Logical resources ──────────────────────────────────────────────────────

/// A resource as declared by the stack builders, before reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalResource {
    /// Logical address, unique within a stack (e.g. `ServerPublicSubnet1`).
    pub address: String,
    pub kind: ResourceKind,
    /// Catalog field this resource binds through when adopted.
    pub slot: Option<Slot>,
    pub attributes: Attributes,
    /// Attributes never diffed once the resource exists.
    pub ignore_changes: BTreeSet<String>,
    /// Addresses this resource must be ordered after.
    pub depends_on: Vec<String>,
}

impl LogicalResource {
    pub fn new(address: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            address: address.into(),
            kind,
            slot: None,
            attributes: Attributes::new(),
            ignore_changes: BTreeSet::new(),
            depends_on: Vec::new(),
        }
    }

    pub fn bound_through(mut self, slot: Slot) -> Self {
        self.slot = Some(slot);
        self
    }

    pub fn attr(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    /// Set the `Name` tag.
    pub fn name_tag(self, name: String) -> Self {
        self.attr("tags", serde_json::json!({ "Name": name }))
    }

    pub fn depends_on(mut self, address: &str) -> Self {
        if !self.depends_on.iter().any(|d| d == address) {
            self.depends_on.push(address.to_string());
        }
        self
    }

    pub fn ignore(mut self, attribute: &str) -> Self {
        self.ignore_changes.insert(attribute.to_string());
        self
    }

    /// Addresses referenced from any attribute via `${address.attr}`.
    pub fn references(&self) -> BTreeSet<String> {
        let mut refs = BTreeSet::new();
        for value in self.attributes.values() {
            reference::collect_references(value, &mut refs);
        }
        refs
    }

    /// The address an attribute points at, when the attribute is a single
    /// reference such as `${VPC.id}`.
    pub fn reference_target(&self, attribute: &str) -> Option<String> {
        self.attributes
            .get(attribute)
            .and_then(Value::as_str)
            .and_then(reference::parse_exact)
            .map(|(address, _)| address)
    }

    /// The `Name` tag, if set.
    pub fn tag_name(&self) -> Option<&str> {
        self.attributes
            .get("tags")
            .and_then(|tags| tags.get("Name"))
            .and_then(Value::as_str)
    }
}

/// Render a `Name` tag value: `<StackName>/<logical-path>`.
pub fn name_tag(stack_name: &str, path: &str) -> String {
    format!("{}/{}", stack_name, path)
}
