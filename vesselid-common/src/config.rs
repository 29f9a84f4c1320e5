//! Bootstrap configuration loading and resolution
//!
//! The client reads a small TOML file at startup. A missing or unreadable
//! file is never fatal: the client logs a warning and runs on compiled
//! defaults.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (`--config`, `--service-url`)
//! 2. Environment variables (`VESSELID_CONFIG`, `VESSELID_SERVICE_URL`)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)

use crate::fields::FormVariant;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "VESSELID_CONFIG";
/// Environment variable overriding the classification service URL
pub const SERVICE_URL_ENV: &str = "VESSELID_SERVICE_URL";

const CONFIG_FILE_NAME: &str = "vesselid.toml";

/// Result-interpretation mode for the headline metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BandingMode {
    /// Maximum match confidence as a percentage
    #[default]
    Similarity,
    /// Inverse risk from match count and mean confidence
    Risk,
}

impl std::str::FromStr for BandingMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "similarity" => Ok(BandingMode::Similarity),
            "risk" => Ok(BandingMode::Risk),
            other => Err(format!("unknown banding mode '{}' (expected similarity or risk)", other)),
        }
    }
}

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Base URL of the classification service
    #[serde(default = "default_service_url")]
    pub service_url: String,

    /// Per-request timeout for the remote call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Which form layout this deployment presents
    #[serde(default)]
    pub variant: FormVariant,

    /// Headline metric interpretation
    #[serde(default)]
    pub banding: BandingMode,

    /// Substitute the offline report when the service is unreachable
    #[serde(default)]
    pub offline_fallback: bool,

    /// Directory for form and report exports (current directory if unset)
    #[serde(default)]
    pub export_dir: Option<PathBuf>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            request_timeout_secs: default_request_timeout_secs(),
            variant: FormVariant::default(),
            banding: BandingMode::default(),
            offline_fallback: false,
            export_dir: None,
            logging: LoggingConfig::default(),
        }
    }
}

fn default_service_url() -> String {
    "http://127.0.0.1:5001".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Load configuration, falling back to defaults on any problem
    pub fn load_or_default(path: Option<&Path>) -> Self {
        match path {
            Some(path) => match Self::load(path) {
                Ok(config) => {
                    info!("Loaded configuration from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("{}; using built-in defaults", e);
                    Self::default()
                }
            },
            None => {
                info!("No configuration file found; using built-in defaults");
                Self::default()
            }
        }
    }

    /// Serialize back to TOML (used by `vesselid template --toml`)
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))
    }
}

/// Layered configuration resolver
///
/// Resolves the config file location and the service URL following the
/// priority order in the module docs.
pub struct ConfigResolver {
    cli_config: Option<PathBuf>,
    cli_service_url: Option<String>,
}

impl ConfigResolver {
    pub fn new(cli_config: Option<PathBuf>, cli_service_url: Option<String>) -> Self {
        Self { cli_config, cli_service_url }
    }

    /// Locate the config file to read, if any
    pub fn config_path(&self) -> Option<PathBuf> {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_config {
            return Some(path.clone());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        // Priority 3: Platform config locations
        default_config_locations().into_iter().find(|p| p.exists())
    }

    /// Resolve the full configuration, applying service URL overrides
    pub fn resolve(&self) -> TomlConfig {
        let mut config = TomlConfig::load_or_default(self.config_path().as_deref());

        if let Some(url) = &self.cli_service_url {
            info!(url = %url, "Service URL taken from command line");
            config.service_url = url.clone();
        } else if let Ok(url) = std::env::var(SERVICE_URL_ENV) {
            if !url.trim().is_empty() {
                info!(url = %url, "Service URL taken from {}", SERVICE_URL_ENV);
                config.service_url = url;
            }
        }

        config
    }
}

/// Candidate config file paths in priority order
fn default_config_locations() -> Vec<PathBuf> {
    let mut locations = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        locations.push(dir.join("vesselid").join(CONFIG_FILE_NAME));
    }
    if cfg!(unix) {
        locations.push(PathBuf::from("/etc/vesselid").join(CONFIG_FILE_NAME));
    }
    locations
}
