//! Integration tests for layered configuration
//!
//! These tests verify that configuration loading follows the correct precedence:
//! CLI arguments > Environment variables > Config file > Defaults

use fieldops_core::config::{CliConfigOverrides, ConfigSource, LayeredConfig};
use fieldops_core::SchedulingPolicy;
use serial_test::serial;
use std::env;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

fn clear_env() {
    for key in [
        "FIELDOPS_TIMEZONE",
        "FIELDOPS_DEPOT_ADDRESS",
        "FIELDOPS_CACHE_TTL_DAYS",
        "FIELDOPS_ROUTING_CONCURRENCY",
        "FIELDOPS_TIME_BUCKET_HOURS",
        "FIELDOPS_ENHANCER_ENABLED",
    ] {
        env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    env::set_var("FIELDOPS_TIMEZONE", "America/Edmonton");
    env::set_var("FIELDOPS_CACHE_TTL_DAYS", "14");
    env::set_var("FIELDOPS_ENHANCER_ENABLED", "yes");

    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
business_timezone = "America/Vancouver"
cache_ttl_days = 30
depot_address = "5 Yard Rd"
"#
    )
    .unwrap();

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap().load_from_env();

    assert_eq!(config.business_timezone.value, chrono_tz::America::Edmonton);
    assert_eq!(config.business_timezone.source, ConfigSource::Environment);
    assert_eq!(config.cache_ttl_days.value, 14);
    assert!(config.enhancer_enabled.value);
    // Not set in the environment, so the file value stands
    assert_eq!(config.depot_address.value.as_deref(), Some("5 Yard Rd"));
    assert_eq!(config.depot_address.source, ConfigSource::File);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_environment_values_are_ignored() {
    clear_env();
    env::set_var("FIELDOPS_TIMEZONE", "Nowhere/Special");
    env::set_var("FIELDOPS_ROUTING_CONCURRENCY", "0");
    env::set_var("FIELDOPS_TIME_BUCKET_HOURS", "5");

    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.business_timezone.source, ConfigSource::Default);
    assert_eq!(config.routing_concurrency.value, 5);
    assert_eq!(config.time_bucket_hours.value, 1);

    clear_env();
}

#[test]
#[serial]
fn test_cli_overrides_everything() {
    clear_env();
    env::set_var("FIELDOPS_DEPOT_ADDRESS", "Env Depot");

    let mut config = LayeredConfig::with_defaults().load_from_env();
    config.update_from_cli(CliConfigOverrides {
        depot_address: Some("Cli Depot".to_string()),
        ..Default::default()
    });

    assert_eq!(config.depot_address.value.as_deref(), Some("Cli Depot"));
    assert_eq!(config.depot_address.source, ConfigSource::Cli);

    clear_env();
}

#[test]
fn test_missing_optional_file_keeps_defaults() {
    let dir = TempDir::new().unwrap();
    let config = LayeredConfig::with_defaults()
        .load_from_optional_file(dir.path().join("fieldops.toml"))
        .unwrap();
    assert_eq!(config.cache_ttl_days.source, ConfigSource::Default);
}

#[test]
fn test_missing_required_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let result = LayeredConfig::with_defaults().load_from_file(dir.path().join("absent.toml"));
    assert!(result.is_err());
}

#[test]
fn test_policy_reflects_file_configuration() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
business_timezone = "America/Halifax"
depot_address = "9 Shop Ave"
time_bucket_hours = 2
"#
    )
    .unwrap();

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();
    let policy = SchedulingPolicy::from_config(&config);

    assert_eq!(policy.timezone, chrono_tz::America::Halifax);
    assert_eq!(policy.depot_address.as_deref(), Some("9 Shop Ave"));
    assert_eq!(policy.time_bucket_hours, 2);
    assert_eq!(policy.daily_drive_ceiling_minutes, 240.0);
}
