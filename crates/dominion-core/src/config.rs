//! Node configuration.
//!
//! The canonical configuration lives in `dominion-config.yaml`. Every field
//! has a default, so an empty file (or no file) yields a working
//! single-authority node.
//!
//! Environment variables override file values:
//! - `DOMINION_AUTHORITY` overrides `chain.authority`
//! - `DOMINION_BLOCK_INTERVAL_MS` overrides `chain.block_interval_ms`

use std::path::Path;

use dominion_chain::ChainConfig;
use dominion_world::WorldSettings;
use serde::Deserialize;

/// Environment variable overriding `chain.authority`.
pub const ENV_AUTHORITY: &str = "DOMINION_AUTHORITY";

/// Environment variable overriding `chain.block_interval_ms`.
pub const ENV_BLOCK_INTERVAL_MS: &str = "DOMINION_BLOCK_INTERVAL_MS";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override could not be parsed.
    #[error("invalid value {value:?} for {name}")]
    Env {
        /// The variable name.
        name: &'static str,
        /// The raw value.
        value: String,
    },

    /// The configuration is internally inconsistent.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level node configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NodeConfig {
    /// Block and event pipeline.
    #[serde(default)]
    pub chain: ChainConfig,

    /// World simulation.
    #[serde(default)]
    pub world: WorldSettings,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl NodeConfig {
    /// Load configuration from a YAML file and apply environment overrides.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Override fields from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Override fields from `lookup`, which maps a variable name to its value.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_AUTHORITY) {
            self.chain.authority = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ConfigError::Env {
                        name: ENV_AUTHORITY,
                        value,
                    });
                }
            };
        }
        if let Some(value) = lookup(ENV_BLOCK_INTERVAL_MS) {
            self.chain.block_interval_ms =
                value.trim().parse().map_err(|_parse| ConfigError::Env {
                    name: ENV_BLOCK_INTERVAL_MS,
                    value: value.clone(),
                })?;
        }
        Ok(())
    }

    /// Reject settings the node cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| {
            Err(ConfigError::Invalid {
                reason: reason.to_owned(),
            })
        };
        let chain = &self.chain;
        if chain.block_interval_ms == 0 {
            return invalid("chain.block_interval_ms must be positive");
        }
        if chain.poll_interval_ms == 0 {
            return invalid("chain.poll_interval_ms must be positive");
        }
        if chain.event_queue_capacity == 0
            || chain.block_queue_capacity == 0
            || chain.emitter_capacity == 0
        {
            return invalid("chain queue capacities must be positive");
        }
        if self.world.time_compression == 0 {
            return invalid("world.time_compression must be positive");
        }
        let planet = self.world.planet;
        if planet.min_dimension == 0 {
            return invalid("world.planet.min_dimension must be positive");
        }
        if planet.min_dimension > planet.max_dimension {
            return invalid("world.planet.min_dimension exceeds max_dimension");
        }
        Ok(())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = NodeConfig::default();
        config.validate().unwrap();
        assert!(config.chain.authority);
        assert_eq!(config.chain.block_interval_ms, 10_000);
        assert_eq!(config.world.time_compression, 100);
        assert_eq!(config.world.planet.min_dimension, 1_000);
        assert_eq!(config.world.planet.max_dimension, 5_000);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn empty_yaml_uses_defaults() {
        assert_eq!(NodeConfig::parse("").unwrap(), NodeConfig::default());
        assert_eq!(NodeConfig::parse("{}").unwrap(), NodeConfig::default());
    }

    #[test]
    fn parse_partial_yaml() {
        let yaml = r"
chain:
  authority: false
  block_interval_ms: 2000
world:
  time_compression: 10
  planet:
    min_dimension: 32
    max_dimension: 64
logging:
  level: debug
  format: json
";
        let config = NodeConfig::parse(yaml).unwrap();
        assert!(!config.chain.authority);
        assert_eq!(config.chain.block_interval_ms, 2_000);
        assert_eq!(config.chain.poll_interval_ms, 100);
        assert_eq!(config.world.time_compression, 10);
        assert_eq!(config.world.planet.min_dimension, 32);
        assert_eq!(config.world.planet.max_dimension, 64);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        assert!(matches!(
            NodeConfig::parse("chain: [not, a, map]"),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut config = NodeConfig::default();
        config
            .apply_overrides(|name| match name {
                ENV_AUTHORITY => Some("false".to_owned()),
                ENV_BLOCK_INTERVAL_MS => Some(" 250 ".to_owned()),
                _ => None,
            })
            .unwrap();
        assert!(!config.chain.authority);
        assert_eq!(config.chain.block_interval_ms, 250);
    }

    #[test]
    fn bad_override_is_reported() {
        let mut config = NodeConfig::default();
        let err = config
            .apply_overrides(|name| (name == ENV_AUTHORITY).then(|| "maybe".to_owned()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Env { name: ENV_AUTHORITY, .. }));

        let err = config
            .apply_overrides(|name| (name == ENV_BLOCK_INTERVAL_MS).then(|| "-5".to_owned()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Env { name: ENV_BLOCK_INTERVAL_MS, .. }));
    }

    #[test]
    fn validation_rejects_unusable_settings() {
        let mut config = NodeConfig::default();
        config.chain.block_interval_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));

        let mut config = NodeConfig::default();
        config.world.planet.min_dimension = 10;
        config.world.planet.max_dimension = 5;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));

        let mut config = NodeConfig::default();
        config.world.time_compression = 0;
        assert!(config.validate().is_err());

        let mut config = NodeConfig::default();
        config.chain.emitter_capacity = 0;
        assert!(config.validate().is_err());
    }
}
