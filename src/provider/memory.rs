use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use tracing::debug;

use super::mint::{computed_attributes, merge_attributes, mint_id};
use super::{ObservedResource, ProvisioningEngine};
use crate::resource::{Attributes, ResourceKind};
use crate::sizing::CpuArch;

/// A process-local engine. Used for dry runs and tests.
pub struct MemoryEngine {
    region: String,
    zones: DashMap<String, Vec<String>>,
    images: DashMap<CpuArch, String>,
    resources: DashMap<(ResourceKind, String), ObservedResource>,
    failing: DashSet<String>,
}

impl MemoryEngine {
    /// An empty engine whose region reports zones `<region>a..c`.
    pub fn new(region: &str) -> Self {
        let zones = DashMap::new();
        zones.insert(
            region.to_string(),
            ["a", "b", "c"].iter().map(|z| format!("{}{}", region, z)).collect(),
        );
        Self {
            region: region.to_string(),
            zones,
            images: DashMap::new(),
            resources: DashMap::new(),
            failing: DashSet::new(),
        }
    }

    pub fn with_zones(self, zones: &[&str]) -> Self {
        self.zones.insert(
            self.region.clone(),
            zones.iter().map(|z| z.to_string()).collect(),
        );
        self
    }

    pub fn with_ami(self, arch: CpuArch, ami: &str) -> Self {
        self.images.insert(arch, ami.to_string());
        self
    }

    /// Seed an existing object.
    pub fn insert(&self, resource: ObservedResource) {
        self.resources
            .insert((resource.kind, resource.id.clone()), resource);
    }

    /// Make every create at `address` fail.
    pub fn fail_on(&self, address: &str) {
        self.failing.insert(address.to_string());
    }

    /// All objects, sorted by kind and id.
    pub fn resources(&self) -> Vec<ObservedResource> {
        let mut all: Vec<ObservedResource> =
            self.resources.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| (a.kind, &a.id).cmp(&(b.kind, &b.id)));
        all
    }

    pub fn managed_count(&self) -> usize {
        self.resources.iter().filter(|e| e.value().managed).count()
    }
}

#[async_trait]
impl ProvisioningEngine for MemoryEngine {
    async fn available_zones(&self, region: &str) -> Result<Vec<String>> {
        Ok(self
            .zones
            .get(region)
            .map(|z| z.value().clone())
            .unwrap_or_default())
    }

    async fn latest_ami(&self, arch: CpuArch) -> Result<String> {
        self.images
            .get(&arch)
            .map(|ami| ami.value().clone())
            .ok_or_else(|| anyhow!("No machine image registered for {}", arch))
    }

    async fn read(&self, kind: ResourceKind, id: &str) -> Result<Option<ObservedResource>> {
        Ok(self
            .resources
            .get(&(kind, id.to_string()))
            .map(|r| r.value().clone()))
    }

    async fn find_managed(&self, stack: &str, address: &str) -> Result<Option<ObservedResource>> {
        Ok(self
            .resources
            .iter()
            .find(|e| {
                let r = e.value();
                r.managed && r.stack.as_deref() == Some(stack) && r.address.as_deref() == Some(address)
            })
            .map(|e| e.value().clone()))
    }

    async fn create(
        &self,
        stack: &str,
        address: &str,
        kind: ResourceKind,
        attributes: &Attributes,
    ) -> Result<ObservedResource> {
        if self.failing.contains(address) {
            bail!("Injected failure creating {}", address);
        }
        let id = mint_id(stack, address, kind, attributes);
        if self.resources.contains_key(&(kind, id.clone())) {
            bail!("{} '{}' already exists", kind, id);
        }

        let mut stored = attributes.clone();
        merge_attributes(&mut stored, &computed_attributes(kind, &id, &self.region));
        let resource = ObservedResource {
            kind,
            id: id.clone(),
            attributes: stored,
            managed: true,
            stack: Some(stack.to_string()),
            address: Some(address.to_string()),
        };
        self.resources.insert((kind, id.clone()), resource.clone());
        debug!(address = %address, id = %id, "Created resource");
        Ok(resource)
    }

    async fn update(
        &self,
        kind: ResourceKind,
        id: &str,
        attributes: &Attributes,
    ) -> Result<ObservedResource> {
        let mut entry = self
            .resources
            .get_mut(&(kind, id.to_string()))
            .ok_or_else(|| anyhow!("{} '{}' does not exist", kind, id))?;
        merge_attributes(&mut entry.attributes, attributes);
        Ok(entry.value().clone())
    }

    async fn import(
        &self,
        stack: &str,
        address: &str,
        kind: ResourceKind,
        id: &str,
    ) -> Result<ObservedResource> {
        let mut entry = self
            .resources
            .get_mut(&(kind, id.to_string()))
            .ok_or_else(|| anyhow!("{} '{}' does not exist", kind, id))?;
        entry.managed = true;
        entry.stack = Some(stack.to_string());
        entry.address = Some(address.to_string());
        Ok(entry.value().clone())
    }

    async fn delete(&self, kind: ResourceKind, id: &str) -> Result<()> {
        self.resources
            .remove(&(kind, id.to_string()))
            .map(|_| ())
            .ok_or_else(|| anyhow!("{} '{}' does not exist", kind, id))
    }
}
