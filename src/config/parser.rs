use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

use super::types::{Environment, EnvironmentConfig, Overrides, TetherConfig};
use crate::catalog::EnvName;
use crate::planner::reconcile::AdoptionStrategy;
use crate::sizing::CpuArch;

/// Default config file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "tether.yaml";

/// Parse config content from a YAML string.
pub fn parse_config(content: &str) -> Result<TetherConfig> {
    if content.trim().is_empty() {
        return Ok(TetherConfig::default());
    }
    let config: TetherConfig =
        serde_yaml::from_str(content).context("Failed to parse tether config")?;
    Ok(config)
}

/// Load config from a file.
///
/// A missing file is only accepted for the default file name, in which case
/// the built-in defaults apply.
pub fn load_config(path: &str) -> Result<TetherConfig> {
    let p = Path::new(path);

    if p.is_file() {
        let content = fs::read_to_string(p)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        tracing::debug!(path = %path, "Loaded config file");
        return parse_config(&content);
    }

    if !p.exists() && p.file_name().and_then(|n| n.to_str()) == Some(DEFAULT_CONFIG_FILE) {
        tracing::debug!("No config file found, using defaults");
        return Ok(TetherConfig::default());
    }

    bail!(
        "Config not found: '{}'. Create a {} or pass a path with -c",
        path,
        DEFAULT_CONFIG_FILE
    )
}

/// Resolve an environment by name: overrides, then the config file, then
/// the stage defaults.
pub fn resolve_environment(
    config: &TetherConfig,
    name: &str,
    overrides: &Overrides,
) -> Result<Environment> {
    let env_name: EnvName = name.parse()?;

    let base = config
        .project
        .environments
        .get(&env_name)
        .cloned()
        .unwrap_or_default()
        .or(EnvironmentConfig::default_for(env_name));

    let cpu_arch = match overrides.cpu_type.as_deref() {
        Some(cpu) => cpu.parse::<CpuArch>().map_err(anyhow::Error::msg)?,
        None => base.cpu_type.unwrap_or_default(),
    };

    let ssh_pub_key = overrides
        .ssh_pub_key
        .clone()
        .or(base.ssh_pub_key)
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty());

    Ok(Environment {
        name: env_name,
        region: overrides
            .region
            .clone()
            .unwrap_or_else(|| config.project.region.clone()),
        account: overrides
            .account
            .clone()
            .or_else(|| config.project.account.clone()),
        cpu_arch,
        instance_size: overrides
            .instance_size
            .clone()
            .or(base.instance_size)
            .unwrap_or_else(|| "LARGE".to_string()),
        ssh_pub_key,
        log_level: overrides
            .log_level
            .clone()
            .or(base.log_level)
            .unwrap_or_else(|| "INFO".to_string()),
    })
}

/// Pick the adoption strategy: override first, then the config file.
pub fn resolve_strategy(config: &TetherConfig, overrides: &Overrides) -> Result<AdoptionStrategy> {
    match overrides.strategy.as_deref() {
        Some(s) => s.parse::<AdoptionStrategy>().map_err(anyhow::Error::msg),
        None => Ok(config.project.strategy),
    }
}

/// Map an environment log level (`INFO`, `WARN`, ...) to a tracing filter.
pub fn log_filter(level: &str) -> &'static str {
    match level.trim().to_ascii_uppercase().as_str() {
        "TRACE" => "trace",
        "DEBUG" => "debug",
        "WARN" | "WARNING" => "warn",
        "ERROR" => "error",
        _ => "info",
    }
}
