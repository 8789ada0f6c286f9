//! Configuration loading for CLI commands

use anyhow::{Context, Result};
use fieldops_core::config::{parse_timezone, CliConfigOverrides, LayeredConfig};
use std::path::Path;

/// Load layered configuration: defaults, then file, then environment
pub fn load_config(config_path: &Path) -> Result<LayeredConfig> {
    let config = LayeredConfig::with_defaults()
        .load_from_optional_file(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?
        .load_from_env();

    Ok(config)
}

/// Load layered configuration with CLI overrides on top
pub fn load_config_with_overrides(
    config_path: &Path,
    overrides: CliConfigOverrides,
) -> Result<LayeredConfig> {
    let mut config = load_config(config_path)?;
    config.update_from_cli(overrides);
    Ok(config)
}

/// Turn the global flags into configuration overrides
pub fn overrides_from_flags(
    timezone: Option<&str>,
    depot: Option<String>,
    enhance: bool,
) -> Result<CliConfigOverrides> {
    let business_timezone = timezone
        .map(parse_timezone)
        .transpose()
        .context("Invalid --timezone")?;

    Ok(CliConfigOverrides {
        business_timezone,
        depot_address: depot,
        enhancer_enabled: enhance.then_some(true),
    })
}
