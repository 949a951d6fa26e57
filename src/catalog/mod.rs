//! Environment catalog: the checked-in table of physical resource ids per
//! environment, used to bind logical resources to existing infrastructure.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod builtin;

/// Errors raised while loading or querying the catalog.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("no resource mapping for environment '{0}' (expected one of: dev, stg, prod)")]
    NotFound(String),

    #[error("environment '{env}' is missing required field '{field}'")]
    MissingField { env: String, field: &'static str },

    #[error("environment '{env}' field '{field}' has malformed id '{value}'")]
    MalformedId {
        env: String,
        field: &'static str,
        value: String,
    },

    #[error("failed to parse catalog: {0}")]
    Parse(String),
}

// ─── Environment names ──────────────────────────────────────────────────────

/// The fixed set of environments the catalog knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvName {
    Dev,
    Stg,
    Prod,
}

impl EnvName {
    pub const ALL: [EnvName; 3] = [EnvName::Dev, EnvName::Stg, EnvName::Prod];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnvName::Dev => "dev",
            EnvName::Stg => "stg",
            EnvName::Prod => "prod",
        }
    }

    /// Stack name used as the prefix of every `Name` tag.
    pub fn stack_name(&self) -> &'static str {
        match self {
            EnvName::Dev => "EC2-Dev",
            EnvName::Stg => "EC2-Stg",
            EnvName::Prod => "EC2-Prod",
        }
    }
}

impl FromStr for EnvName {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" => Ok(EnvName::Dev),
            "stg" => Ok(EnvName::Stg),
            "prod" => Ok(EnvName::Prod),
            _ => Err(CatalogError::NotFound(s.to_string())),
        }
    }
}

impl fmt::Display for EnvName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Slots ──────────────────────────────────────────────────────────────────

/// A required identifier field of a [`ResourceMapping`].
///
/// Every bindable logical resource names the slot it binds through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    Vpc,
    InternetGateway,
    PublicSubnet1,
    PublicSubnet2,
    RouteTable1,
    RouteTable2,
    RouteTableAssociation1,
    RouteTableAssociation2,
    SshSecurityGroup,
    Ec2SecurityGroup,
    Ec2Role,
    InstanceProfile,
    AssetBucket,
    Ec2Instance,
}

impl Slot {
    pub const ALL: [Slot; 14] = [
        Slot::Vpc,
        Slot::InternetGateway,
        Slot::PublicSubnet1,
        Slot::PublicSubnet2,
        Slot::RouteTable1,
        Slot::RouteTable2,
        Slot::RouteTableAssociation1,
        Slot::RouteTableAssociation2,
        Slot::SshSecurityGroup,
        Slot::Ec2SecurityGroup,
        Slot::Ec2Role,
        Slot::InstanceProfile,
        Slot::AssetBucket,
        Slot::Ec2Instance,
    ];

    pub fn field_name(&self) -> &'static str {
        match self {
            Slot::Vpc => "vpc",
            Slot::InternetGateway => "internet_gateway",
            Slot::PublicSubnet1 => "public_subnet1",
            Slot::PublicSubnet2 => "public_subnet2",
            Slot::RouteTable1 => "route_table1",
            Slot::RouteTable2 => "route_table2",
            Slot::RouteTableAssociation1 => "route_table_association1",
            Slot::RouteTableAssociation2 => "route_table_association2",
            Slot::SshSecurityGroup => "ssh_security_group",
            Slot::Ec2SecurityGroup => "ec2_security_group",
            Slot::Ec2Role => "ec2_role",
            Slot::InstanceProfile => "instance_profile",
            Slot::AssetBucket => "asset_bucket",
            Slot::Ec2Instance => "ec2_instance",
        }
    }

    fn id_pattern(&self) -> &'static str {
        match self {
            Slot::Vpc => r"^vpc-[0-9a-f]{8,17}$",
            Slot::InternetGateway => r"^igw-[0-9a-f]{8,17}$",
            Slot::PublicSubnet1 | Slot::PublicSubnet2 => r"^subnet-[0-9a-f]{8,17}$",
            Slot::RouteTable1 | Slot::RouteTable2 => r"^rtb-[0-9a-f]{8,17}$",
            Slot::RouteTableAssociation1 | Slot::RouteTableAssociation2 => {
                r"^subnet-[0-9a-f]{8,17}/rtb-[0-9a-f]{8,17}$"
            }
            Slot::SshSecurityGroup | Slot::Ec2SecurityGroup => r"^sg-[0-9a-f]{8,17}$",
            Slot::Ec2Role | Slot::InstanceProfile => r"^[\w+=,.@-]{1,128}$",
            Slot::AssetBucket => r"^[a-z0-9][a-z0-9.-]{1,61}[a-z0-9]$",
            Slot::Ec2Instance => r"^i-[0-9a-f]{8,17}$",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

// ─── Resource mapping ───────────────────────────────────────────────────────

/// Physical identifiers of one environment's previously created resources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceMapping {
    pub vpc: String,
    pub internet_gateway: String,
    pub public_subnet1: String,
    pub public_subnet2: String,
    pub route_table1: String,
    pub route_table2: String,
    pub route_table_association1: String,
    pub route_table_association2: String,
    pub ssh_security_group: String,
    pub ec2_security_group: String,
    pub ec2_role: String,
    pub instance_profile: String,
    pub asset_bucket: String,
    pub ec2_instance: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ami: Option<String>,
}

impl ResourceMapping {
    fn field(&self, slot: Slot) -> &str {
        match slot {
            Slot::Vpc => &self.vpc,
            Slot::InternetGateway => &self.internet_gateway,
            Slot::PublicSubnet1 => &self.public_subnet1,
            Slot::PublicSubnet2 => &self.public_subnet2,
            Slot::RouteTable1 => &self.route_table1,
            Slot::RouteTable2 => &self.route_table2,
            Slot::RouteTableAssociation1 => &self.route_table_association1,
            Slot::RouteTableAssociation2 => &self.route_table_association2,
            Slot::SshSecurityGroup => &self.ssh_security_group,
            Slot::Ec2SecurityGroup => &self.ec2_security_group,
            Slot::Ec2Role => &self.ec2_role,
            Slot::InstanceProfile => &self.instance_profile,
            Slot::AssetBucket => &self.asset_bucket,
            Slot::Ec2Instance => &self.ec2_instance,
        }
    }

    /// The bound physical id for a slot, or `None` when the field is blank.
    pub fn id_for(&self, slot: Slot) -> Option<&str> {
        let id = self.field(slot).trim();
        if id.is_empty() {
            None
        } else {
            Some(id)
        }
    }

    /// The AMI override, if one is set and non-blank.
    pub fn ami_override(&self) -> Option<&str> {
        self.ami
            .as_deref()
            .map(str::trim)
            .filter(|ami| !ami.is_empty())
    }

    /// Number of required fields that hold an id.
    pub fn populated_count(&self) -> usize {
        Slot::ALL
            .iter()
            .filter(|slot| self.id_for(**slot).is_some())
            .count()
    }

    /// Check that all required fields are present and well-formed.
    pub fn validate(&self, env: &str) -> Result<(), CatalogError> {
        for slot in Slot::ALL {
            let Some(id) = self.id_for(slot) else {
                return Err(CatalogError::MissingField {
                    env: env.to_string(),
                    field: slot.field_name(),
                });
            };
            let pattern =
                Regex::new(slot.id_pattern()).map_err(|e| CatalogError::Parse(e.to_string()))?;
            if !pattern.is_match(id) {
                return Err(CatalogError::MalformedId {
                    env: env.to_string(),
                    field: slot.field_name(),
                    value: id.to_string(),
                });
            }
        }

        if let Some(ami) = self.ami_override() {
            let pattern =
                Regex::new(r"^ami-[0-9a-f]{8,17}$").map_err(|e| CatalogError::Parse(e.to_string()))?;
            if !pattern.is_match(ami) {
                return Err(CatalogError::MalformedId {
                    env: env.to_string(),
                    field: "ami",
                    value: ami.to_string(),
                });
            }
        }
        Ok(())
    }
}

// ─── Catalog ────────────────────────────────────────────────────────────────

/// Immutable keyed lookup from environment to its resource mapping.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: BTreeMap<EnvName, ResourceMapping>,
}

static BUILTIN: LazyLock<Catalog> = LazyLock::new(|| Catalog {
    entries: builtin::entries(),
});

impl Catalog {
    /// The catalog compiled into the binary.
    pub fn builtin() -> &'static Catalog {
        &BUILTIN
    }

    /// Parse a catalog from YAML of the form `dev: { vpc: ..., ... }`.
    ///
    /// Every environment present must populate all required fields.
    pub fn from_yaml(content: &str) -> Result<Self, CatalogError> {
        let raw: BTreeMap<String, ResourceMapping> =
            serde_yaml::from_str(content).map_err(|e| CatalogError::Parse(e.to_string()))?;

        let mut entries = BTreeMap::new();
        for (name, mapping) in raw {
            let env: EnvName = name
                .parse()
                .map_err(|_| CatalogError::Parse(format!("unknown environment '{}'", name)))?;
            mapping.validate(env.as_str())?;
            entries.insert(env, mapping);
        }
        Ok(Self { entries })
    }

    /// Load a catalog file from disk.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CatalogError::Parse(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    /// Look up the mapping for an environment name.
    pub fn lookup(&self, name: &str) -> Result<&ResourceMapping, CatalogError> {
        let env: EnvName = name.parse()?;
        self.get(env)
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))
    }

    pub fn get(&self, env: EnvName) -> Option<&ResourceMapping> {
        self.entries.get(&env)
    }

    pub fn entries(&self) -> impl Iterator<Item = (EnvName, &ResourceMapping)> {
        self.entries.iter().map(|(env, mapping)| (*env, mapping))
    }

    /// Validate every entry.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for (env, mapping) in &self.entries {
            mapping.validate(env.as_str())?;
        }
        Ok(())
    }
}

/// Look up an environment in the built-in catalog.
pub fn lookup(name: &str) -> Result<&'static ResourceMapping, CatalogError> {
    Catalog::builtin().lookup(name)
}
