//! The seam to the external provisioning engine.
//!
//! Everything that touches real infrastructure goes through
//! [`ProvisioningEngine`]: reading current state, the four lifecycle
//! primitives, and the zone/image lookups.

pub mod memory;
pub mod mint;

use std::collections::HashSet;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::resource::{Attributes, ResourceKind};
use crate::sizing::CpuArch;

/// A physical object as reported by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedResource {
    pub kind: ResourceKind,
    pub id: String,
    #[serde(default)]
    pub attributes: Attributes,
    /// Whether a previous apply took ownership of this object.
    #[serde(default)]
    pub managed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl ObservedResource {
    /// An existing object that no stack manages yet.
    pub fn unmanaged(kind: ResourceKind, id: &str, attributes: Attributes) -> Self {
        Self {
            kind,
            id: id.to_string(),
            attributes,
            managed: false,
            stack: None,
            address: None,
        }
    }

    /// Value of `${address.<attribute>}` for this object.
    pub fn attribute(&self, attribute: &str) -> Option<serde_json::Value> {
        if attribute == "id" || (attribute == "name" && self.kind.id_is_name()) {
            return Some(serde_json::Value::String(self.id.clone()));
        }
        self.attributes.get(attribute).cloned()
    }

    pub fn str_attribute(&self, attribute: &str) -> Option<String> {
        match self.attribute(attribute)? {
            serde_json::Value::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Cloud primitives consumed by the planner and executor.
#[async_trait]
pub trait ProvisioningEngine: Send + Sync {
    /// Zones currently available in a region, in the engine's order.
    async fn available_zones(&self, region: &str) -> Result<Vec<String>>;

    /// Most recent machine image for an architecture.
    async fn latest_ami(&self, arch: CpuArch) -> Result<String>;

    /// Read an object by physical id.
    async fn read(&self, kind: ResourceKind, id: &str) -> Result<Option<ObservedResource>>;

    /// The object a stack manages at a logical address, if any.
    async fn find_managed(&self, stack: &str, address: &str) -> Result<Option<ObservedResource>>;

    /// Create a new object owned by `stack`/`address`.
    async fn create(
        &self,
        stack: &str,
        address: &str,
        kind: ResourceKind,
        attributes: &Attributes,
    ) -> Result<ObservedResource>;

    /// Update attributes of an existing object in place.
    async fn update(
        &self,
        kind: ResourceKind,
        id: &str,
        attributes: &Attributes,
    ) -> Result<ObservedResource>;

    /// Take ownership of an existing object without changing it.
    async fn import(
        &self,
        stack: &str,
        address: &str,
        kind: ResourceKind,
        id: &str,
    ) -> Result<ObservedResource>;

    /// Delete an object.
    async fn delete(&self, kind: ResourceKind, id: &str) -> Result<()>;
}

/// External lookups, resolved once per run and then treated as constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookups {
    pub zones: Vec<String>,
    pub ami: String,
}

impl Lookups {
    /// Resolve zones and the machine image concurrently.
    ///
    /// An AMI override skips the image lookup.
    pub async fn resolve(
        engine: &dyn ProvisioningEngine,
        region: &str,
        arch: CpuArch,
        ami_override: Option<&str>,
    ) -> Result<Self> {
        let zones = engine.available_zones(region);
        let ami = async {
            match ami_override {
                Some(ami) => Ok(ami.to_string()),
                None => engine.latest_ami(arch).await,
            }
        };
        let (mut zones, ami) = tokio::try_join!(zones, ami)?;
        let mut seen = HashSet::new();
        zones.retain(|zone| seen.insert(zone.clone()));
        if zones.len() < 2 {
            bail!(
                "Region {} reports {} distinct available zone(s); at least two are required",
                region,
                zones.len()
            );
        }
        tracing::debug!(region = %region, zones = ?zones, ami = %ami, "Resolved lookups");
        Ok(Self { zones, ami })
    }

    /// Stand-in lookups for structural validation, where no engine is queried.
    pub fn placeholder(region: &str) -> Self {
        Self {
            zones: vec![format!("{}a", region), format!("{}b", region)],
            ami: "ami-00000000000000000".to_string(),
        }
    }
}
