use crate::error::{FieldopsError, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for Fieldops
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub business_timezone: ConfigValue<Tz>,
    pub depot_address: ConfigValue<Option<String>>,
    pub cache_ttl_days: ConfigValue<u32>,
    pub routing_concurrency: ConfigValue<usize>,
    pub routing_timeout_secs: ConfigValue<u64>,
    pub time_bucket_hours: ConfigValue<u32>,
    pub enhancer_enabled: ConfigValue<bool>,
    pub enhancer_model: ConfigValue<String>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            business_timezone: ConfigValue::new(
                chrono_tz::America::Toronto,
                ConfigSource::Default,
            ),
            depot_address: ConfigValue::new(None, ConfigSource::Default),
            cache_ttl_days: ConfigValue::new(90, ConfigSource::Default),
            routing_concurrency: ConfigValue::new(5, ConfigSource::Default),
            routing_timeout_secs: ConfigValue::new(10, ConfigSource::Default),
            time_bucket_hours: ConfigValue::new(1, ConfigSource::Default),
            enhancer_enabled: ConfigValue::new(false, ConfigSource::Default),
            enhancer_model: ConfigValue::new("gpt-4o-mini".to_string(), ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| FieldopsError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| FieldopsError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(tz) = file_config.business_timezone {
            self.business_timezone.update(parse_timezone(&tz)?, ConfigSource::File);
        }

        if let Some(depot) = file_config.depot_address {
            self.depot_address.update(non_empty(depot), ConfigSource::File);
        }

        if let Some(ttl) = file_config.cache_ttl_days {
            self.cache_ttl_days.update(validate_positive("cache_ttl_days", ttl)?, ConfigSource::File);
        }

        if let Some(concurrency) = file_config.routing_concurrency {
            self.routing_concurrency
                .update(validate_positive("routing_concurrency", concurrency)?, ConfigSource::File);
        }

        if let Some(timeout) = file_config.routing_timeout_secs {
            self.routing_timeout_secs
                .update(validate_positive("routing_timeout_secs", timeout)?, ConfigSource::File);
        }

        if let Some(hours) = file_config.time_bucket_hours {
            self.time_bucket_hours.update(parse_bucket_hours(hours)?, ConfigSource::File);
        }

        if let Some(enabled) = file_config.enhancer_enabled {
            self.enhancer_enabled.update(enabled, ConfigSource::File);
        }

        if let Some(model) = file_config.enhancer_model {
            self.enhancer_model.update(model, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from a TOML file if it exists
    pub fn load_from_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self> {
        if path.as_ref().exists() {
            self.load_from_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // FIELDOPS_TIMEZONE
        if let Ok(tz_str) = env::var("FIELDOPS_TIMEZONE") {
            match parse_timezone(&tz_str) {
                Ok(tz) => self.business_timezone.update(tz, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid FIELDOPS_TIMEZONE value '{}': expected an IANA zone name",
                    tz_str
                ),
            }
        }

        // FIELDOPS_DEPOT_ADDRESS
        if let Ok(depot) = env::var("FIELDOPS_DEPOT_ADDRESS") {
            self.depot_address.update(non_empty(depot), ConfigSource::Environment);
        }

        // FIELDOPS_CACHE_TTL_DAYS
        if let Ok(ttl_str) = env::var("FIELDOPS_CACHE_TTL_DAYS") {
            match ttl_str.parse::<u32>().ok().filter(|v| *v > 0) {
                Some(ttl) => self.cache_ttl_days.update(ttl, ConfigSource::Environment),
                None => tracing::warn!(
                    "Invalid FIELDOPS_CACHE_TTL_DAYS value '{}': expected positive integer",
                    ttl_str
                ),
            }
        }

        // FIELDOPS_ROUTING_CONCURRENCY
        if let Ok(value) = env::var("FIELDOPS_ROUTING_CONCURRENCY") {
            match value.parse::<usize>().ok().filter(|v| *v > 0) {
                Some(concurrency) => {
                    self.routing_concurrency.update(concurrency, ConfigSource::Environment)
                }
                None => tracing::warn!(
                    "Invalid FIELDOPS_ROUTING_CONCURRENCY value '{}': expected positive integer",
                    value
                ),
            }
        }

        // FIELDOPS_ROUTING_TIMEOUT_SECS
        if let Ok(value) = env::var("FIELDOPS_ROUTING_TIMEOUT_SECS") {
            match value.parse::<u64>().ok().filter(|v| *v > 0) {
                Some(timeout) => self.routing_timeout_secs.update(timeout, ConfigSource::Environment),
                None => tracing::warn!(
                    "Invalid FIELDOPS_ROUTING_TIMEOUT_SECS value '{}': expected positive integer",
                    value
                ),
            }
        }

        // FIELDOPS_TIME_BUCKET_HOURS
        if let Ok(value) = env::var("FIELDOPS_TIME_BUCKET_HOURS") {
            match value.parse::<u32>().ok().and_then(|h| parse_bucket_hours(h).ok()) {
                Some(hours) => self.time_bucket_hours.update(hours, ConfigSource::Environment),
                None => tracing::warn!(
                    "Invalid FIELDOPS_TIME_BUCKET_HOURS value '{}': expected a divisor of 24",
                    value
                ),
            }
        }

        // FIELDOPS_ENHANCER_ENABLED
        if let Ok(value) = env::var("FIELDOPS_ENHANCER_ENABLED") {
            match parse_bool(&value) {
                Some(enabled) => self.enhancer_enabled.update(enabled, ConfigSource::Environment),
                None => tracing::warn!(
                    "Invalid FIELDOPS_ENHANCER_ENABLED value '{}': expected true or false",
                    value
                ),
            }
        }

        // FIELDOPS_ENHANCER_MODEL
        if let Ok(model) = env::var("FIELDOPS_ENHANCER_MODEL") {
            self.enhancer_model.update(model, ConfigSource::Environment);
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(tz) = overrides.business_timezone {
            self.business_timezone.update(tz, ConfigSource::Cli);
        }

        if let Some(depot) = overrides.depot_address {
            self.depot_address.update(non_empty(depot), ConfigSource::Cli);
        }

        if let Some(enabled) = overrides.enhancer_enabled {
            self.enhancer_enabled.update(enabled, ConfigSource::Cli);
        }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "business_timezone".to_string(),
            (self.business_timezone.value.name().to_string(), self.business_timezone.source),
        );

        map.insert(
            "depot_address".to_string(),
            (
                self.depot_address.value.clone().unwrap_or_else(|| "(none)".to_string()),
                self.depot_address.source,
            ),
        );

        map.insert(
            "cache_ttl_days".to_string(),
            (self.cache_ttl_days.value.to_string(), self.cache_ttl_days.source),
        );

        map.insert(
            "routing_concurrency".to_string(),
            (self.routing_concurrency.value.to_string(), self.routing_concurrency.source),
        );

        map.insert(
            "routing_timeout_secs".to_string(),
            (self.routing_timeout_secs.value.to_string(), self.routing_timeout_secs.source),
        );

        map.insert(
            "time_bucket_hours".to_string(),
            (self.time_bucket_hours.value.to_string(), self.time_bucket_hours.source),
        );

        map.insert(
            "enhancer_enabled".to_string(),
            (self.enhancer_enabled.value.to_string(), self.enhancer_enabled.source),
        );

        map.insert(
            "enhancer_model".to_string(),
            (self.enhancer_model.value.clone(), self.enhancer_model.source),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    business_timezone: Option<String>,
    depot_address: Option<String>,
    cache_ttl_days: Option<u32>,
    routing_concurrency: Option<usize>,
    routing_timeout_secs: Option<u64>,
    time_bucket_hours: Option<u32>,
    enhancer_enabled: Option<bool>,
    enhancer_model: Option<String>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub business_timezone: Option<Tz>,
    pub depot_address: Option<String>,
    pub enhancer_enabled: Option<bool>,
}

/// Parse an IANA time zone name
pub fn parse_timezone(s: &str) -> Result<Tz> {
    s.trim().parse::<Tz>().map_err(|_| FieldopsError::ConfigInvalid {
        key: "business_timezone".to_string(),
        reason: format!("Unknown time zone: {}. Use an IANA name such as America/Toronto", s),
    })
}

/// Parse a time-bucket width; it must divide the day evenly
pub fn parse_bucket_hours(hours: u32) -> Result<u32> {
    if hours == 0 || 24 % hours != 0 {
        return Err(FieldopsError::ConfigInvalid {
            key: "time_bucket_hours".to_string(),
            reason: format!("{} does not divide 24", hours),
        });
    }
    Ok(hours)
}

fn validate_positive<T: PartialOrd + Default + Copy>(key: &str, value: T) -> Result<T> {
    if value > T::default() {
        Ok(value)
    } else {
        Err(FieldopsError::ConfigInvalid {
            key: key.to_string(),
            reason: "must be greater than zero".to_string(),
        })
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
