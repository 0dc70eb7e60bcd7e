//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.

use serde::Deserialize;

use crate::error::ConfigError;
use crate::molecule::{Alignment, SizeClass};

/// Output formats the CLI can render layouts in.
pub const OUTPUT_FORMATS: [&str; 2] = ["json", "csv"];

/// Log levels accepted by `logging.level`.
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// Contact packing defaults.
    #[serde(default)]
    pub packing: PackingConfig,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.packing
            .default_alignment
            .parse::<Alignment>()
            .map_err(|message| ConfigError::ValidationError { message })?;

        self.packing
            .default_size_class
            .parse::<SizeClass>()
            .map_err(|message| ConfigError::ValidationError { message })?;

        let format = self.output.format.to_lowercase();
        if !OUTPUT_FORMATS.contains(&format.as_str()) {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "Invalid output format '{}'. Must be one of: json, csv",
                    self.output.format
                ),
            });
        }

        let level = self.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                ),
            });
        }

        Ok(())
    }
}

/// Contact packing defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackingConfig {
    /// Alignment used when a request does not give one.
    /// Default: "center"
    #[serde(default = "default_alignment")]
    pub default_alignment: String,

    /// Size class used by `fill` when none is given.
    /// Default: "medium"
    #[serde(default = "default_size_class")]
    pub default_size_class: String,
}

impl PackingConfig {
    /// Parsed default alignment, falling back to centre on bad input.
    #[must_use]
    pub fn alignment(&self) -> Alignment {
        self.default_alignment.parse().unwrap_or_default()
    }

    /// Parsed default size class, falling back to medium on bad input.
    #[must_use]
    pub fn size_class(&self) -> SizeClass {
        self.default_size_class.parse().unwrap_or_default()
    }
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            default_alignment: default_alignment(),
            default_size_class: default_size_class(),
        }
    }
}

fn default_alignment() -> String {
    "center".to_string()
}

fn default_size_class() -> String {
    "medium".to_string()
}

/// Output configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Default output format: "json" or "csv".
    #[serde(default = "default_format")]
    pub format: String,

    /// Pretty-print JSON output.
    #[serde(default = "default_true")]
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            pretty: default_true(),
        }
    }
}

fn default_format() -> String {
    "json".to_string()
}

const fn default_true() -> bool {
    true
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}
