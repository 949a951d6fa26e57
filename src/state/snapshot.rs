use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::provider::ObservedResource;

/// Seed data for the local engine: lookups plus pre-existing objects.
///
/// ```json
/// {
///   "zones": { "us-west-2": ["us-west-2a", "us-west-2b"] },
///   "images": { "arm64": "ami-0123456789abcdef0" },
///   "resources": [ { "kind": "aws_vpc", "id": "vpc-...", "attributes": {} } ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub zones: BTreeMap<String, Vec<String>>,
    /// Image id keyed by architecture (`arm64`, `x86_64`).
    #[serde(default)]
    pub images: BTreeMap<String, String>,
    #[serde(default)]
    pub resources: Vec<ObservedResource>,
}

impl Snapshot {
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse state snapshot")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        Self::from_json(&content)
    }
}
