use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::EnvName;
use crate::planner::reconcile::AdoptionStrategy;
use crate::sizing::{self, CpuArch};

// ─── Resolved environment ───────────────────────────────────────────────────

/// A fully resolved environment. Built once at startup; never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub name: EnvName,
    pub region: String,
    pub account: Option<String>,
    pub cpu_arch: CpuArch,
    pub instance_size: String,
    pub ssh_pub_key: Option<String>,
    pub log_level: String,
}

impl Environment {
    pub fn stack_name(&self) -> &'static str {
        self.name.stack_name()
    }

    /// Concrete instance type for this environment's sizing.
    pub fn instance_type(&self) -> String {
        sizing::resolve(self.cpu_arch, &self.instance_size)
    }
}

// ─── YAML config file ───────────────────────────────────────────────────────

/// Root configuration structure parsed from `tether.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TetherConfig {
    #[serde(default)]
    pub project: ProjectConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default = "default_project_name")]
    pub name: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub strategy: AdoptionStrategy,
    /// Optional catalog file replacing the built-in one.
    #[serde(default)]
    pub catalog: Option<String>,
    #[serde(default)]
    pub environments: BTreeMap<EnvName, EnvironmentConfig>,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub settings: Settings,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_project_name(),
            region: default_region(),
            account: None,
            strategy: AdoptionStrategy::default(),
            catalog: None,
            environments: BTreeMap::new(),
            engine: EngineConfig::default(),
            settings: Settings::default(),
        }
    }
}

/// Per-environment sizing and access settings. Fields left out fall back
/// to the stage defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    #[serde(default)]
    pub instance_size: Option<String>,
    #[serde(default)]
    pub cpu_type: Option<CpuArch>,
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default)]
    pub ssh_pub_key: Option<String>,
}

impl EnvironmentConfig {
    /// Stage defaults used for anything the config file leaves out.
    pub fn default_for(env: EnvName) -> Self {
        let instance_size = match env {
            EnvName::Dev => "LARGE",
            EnvName::Stg => "XLARGE",
            EnvName::Prod => "XLARGE2",
        };
        Self {
            instance_size: Some(instance_size.to_string()),
            cpu_type: Some(CpuArch::default()),
            log_level: Some(default_log_level()),
            ssh_pub_key: None,
        }
    }

    /// Fill every unset field from `defaults`.
    pub fn or(self, defaults: EnvironmentConfig) -> Self {
        Self {
            instance_size: self.instance_size.or(defaults.instance_size),
            cpu_type: self.cpu_type.or(defaults.cpu_type),
            log_level: self.log_level.or(defaults.log_level),
            ssh_pub_key: self.ssh_pub_key.or(defaults.ssh_pub_key),
        }
    }
}

/// Lookup data served by the local engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Availability zones of the configured region, in lookup order.
    #[serde(default)]
    pub zones: Vec<String>,
    /// Latest machine image per architecture (`arm64`, `x86_64`).
    #[serde(default)]
    pub amis: BTreeMap<String, String>,
}

/// Execution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

/// Values supplied on the command line or through environment variables.
/// Each one, when set, wins over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub region: Option<String>,
    pub account: Option<String>,
    pub cpu_type: Option<String>,
    pub instance_size: Option<String>,
    pub log_level: Option<String>,
    pub ssh_pub_key: Option<String>,
    pub strategy: Option<String>,
}

fn default_project_name() -> String {
    "ec2-example".to_string()
}

fn default_region() -> String {
    "us-west-2".to_string()
}

fn default_log_level() -> String {
    "INFO".to_string()
}

fn default_parallelism() -> usize {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    200
}
