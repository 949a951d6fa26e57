use anyhow::{bail, Result};
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;

use super::types::{Environment, TetherConfig};

const LOG_LEVELS: &[&str] = &["TRACE", "DEBUG", "INFO", "WARN", "WARNING", "ERROR"];
const SIZE_CLASSES: &[&str] = &["LARGE", "XLARGE", "XLARGE2", "XLARGE4"];

/// Validate the entire configuration for correctness.
pub fn validate(config: &TetherConfig) -> Result<()> {
    validate_region(&config.project.region)?;
    validate_settings(config)?;
    validate_engine(config)?;
    validate_catalog_path(config)?;
    for (env, env_config) in &config.project.environments {
        if let Some(level) = &env_config.log_level {
            validate_log_level(level).map_err(|e| e.context(format!("environment '{}'", env)))?;
        }
    }
    Ok(())
}

/// Validate a resolved environment. Unknown size classes only warn: they
/// resolve to LARGE.
pub fn validate_environment(env: &Environment) -> Result<()> {
    validate_region(&env.region)?;
    validate_log_level(&env.log_level)?;

    if let Some(account) = &env.account {
        let re = Regex::new(r"^\d{12}$")?;
        if !re.is_match(account) {
            bail!("Account '{}' must be a 12-digit account id", account);
        }
    }

    let size = env.instance_size.trim().to_ascii_uppercase();
    if !SIZE_CLASSES.contains(&size.as_str()) {
        tracing::warn!(
            instance_size = %env.instance_size,
            "Unrecognized instance size, falling back to LARGE"
        );
    }
    Ok(())
}

fn validate_region(region: &str) -> Result<()> {
    let re = Regex::new(r"^[a-z]{2}(-gov)?-[a-z]+-\d+$")?;
    if !re.is_match(region) {
        bail!("Region '{}' is not a valid region name", region);
    }
    Ok(())
}

fn validate_log_level(level: &str) -> Result<()> {
    let upper = level.trim().to_ascii_uppercase();
    if !LOG_LEVELS.contains(&upper.as_str()) {
        bail!(
            "Log level '{}' is not one of {}",
            level,
            LOG_LEVELS.join(", ")
        );
    }
    Ok(())
}

fn validate_settings(config: &TetherConfig) -> Result<()> {
    if config.project.settings.parallelism == 0 {
        bail!("settings.parallelism must be at least 1");
    }
    Ok(())
}

/// Zones must be unique; AMI keys must name a known architecture.
fn validate_engine(config: &TetherConfig) -> Result<()> {
    let engine = &config.project.engine;

    let mut seen = HashSet::new();
    for zone in &engine.zones {
        if !seen.insert(zone.as_str()) {
            bail!("engine.zones lists '{}' more than once", zone);
        }
    }

    let ami_re = Regex::new(r"^ami-[0-9a-f]{8,17}$")?;
    for (arch, ami) in &engine.amis {
        if arch != "arm64" && arch != "x86_64" {
            bail!(
                "engine.amis has unknown architecture '{}' (expected arm64 or x86_64)",
                arch
            );
        }
        if !ami_re.is_match(ami) {
            bail!("engine.amis.{} has malformed image id '{}'", arch, ami);
        }
    }
    Ok(())
}

fn validate_catalog_path(config: &TetherConfig) -> Result<()> {
    if let Some(path) = &config.project.catalog {
        if !Path::new(path).is_file() {
            bail!("Catalog file '{}' does not exist", path);
        }
    }
    Ok(())
}
