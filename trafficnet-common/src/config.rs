//! Configuration loading and workplace label schemas
//!
//! Settings resolve in priority order:
//! 1. Command-line argument / environment variable (handled by each binary's clap `Args`)
//! 2. TOML config file
//! 3. Compiled default (where one exists)
//!
//! Secrets (passkey, blob-storage credentials) are never read from TOML.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

/// Congestion categories shared by every lane
pub const CONGESTION_OPTIONS: [&str; 3] = ["unclear", "congested", "vacant"];

/// Precipitation categories; only one may be selected
pub const PRECIPITATION_OPTIONS: [&str; 4] = ["rain", "snow", "fog", "clear"];

/// Usernames accepted by the access gate when the TOML file names none
pub const DEFAULT_ALLOWED_USERS: [&str; 2] = ["aldot", "dcsl"];

/// Contents of `labeler.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub database_url: Option<String>,
    pub database_name: Option<String>,
    pub blob_dir: Option<PathBuf>,
    pub port: Option<u16>,
    pub logging: LoggingConfig,
    /// Usernames accepted by the access gate (compared case-insensitively)
    pub allowed_users: Vec<String>,
    pub workplaces: Vec<WorkplaceConfig>,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            database_name: None,
            blob_dir: None,
            port: None,
            logging: LoggingConfig::default(),
            allowed_users: DEFAULT_ALLOWED_USERS.iter().map(|s| s.to_string()).collect(),
            workplaces: default_workplaces(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// A named reviewer group with its own route and label schema
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkplaceConfig {
    /// Route identifier, e.g. "DCSL" for `/label/dcsl`
    pub id: String,
    /// Attribution written when a submission carries no reviewer
    pub reviewer: String,
    #[serde(default)]
    pub schema: LabelSchema,
}

impl WorkplaceConfig {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            reviewer: id.to_string(),
            schema: LabelSchema::default(),
        }
    }

    /// Lowercase path segment used in links and nav highlighting
    pub fn slug(&self) -> String {
        self.id.to_lowercase()
    }
}

/// Label fields offered on a workplace's page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LabelSchema {
    pub congestion: Vec<String>,
    pub congestion_default: String,
    pub precipitation: Vec<String>,
    pub precipitation_default: String,
    pub lanes: Vec<Lane>,
}

impl Default for LabelSchema {
    fn default() -> Self {
        Self::with_lanes(vec![
            Lane::eastbound("left", "Left Lane"),
            Lane::eastbound("center", "Center Lane"),
            Lane::eastbound("right", "Right Lane"),
        ])
    }
}

impl LabelSchema {
    /// Two-lane layout used by the first camera set
    pub fn north_south() -> Self {
        Self::with_lanes(vec![
            Lane {
                key: "north".to_string(),
                title: "North".to_string(),
                tooltip: "Northbound congestion. If the condition is unclear, mark it as such."
                    .to_string(),
            },
            Lane {
                key: "south".to_string(),
                title: "South".to_string(),
                tooltip: "Southbound congestion. If the condition is unclear, mark it as such."
                    .to_string(),
            },
        ])
    }

    fn with_lanes(lanes: Vec<Lane>) -> Self {
        Self {
            congestion: CONGESTION_OPTIONS.iter().map(|s| s.to_string()).collect(),
            congestion_default: "vacant".to_string(),
            precipitation: PRECIPITATION_OPTIONS.iter().map(|s| s.to_string()).collect(),
            precipitation_default: "clear".to_string(),
            lanes,
        }
    }

    pub fn lane(&self, key: &str) -> Option<&Lane> {
        self.lanes.iter().find(|lane| lane.key == key)
    }

    fn validate(&self, workplace: &str) -> Result<()> {
        if self.lanes.is_empty() {
            return Err(Error::Config(format!("Workplace {} declares no lanes", workplace)));
        }
        if !self.congestion.contains(&self.congestion_default) {
            return Err(Error::Config(format!(
                "Workplace {}: congestion default '{}' is not an option",
                workplace, self.congestion_default
            )));
        }
        if !self.precipitation.contains(&self.precipitation_default) {
            return Err(Error::Config(format!(
                "Workplace {}: precipitation default '{}' is not an option",
                workplace, self.precipitation_default
            )));
        }

        let mut seen = HashSet::new();
        for lane in &self.lanes {
            if lane.key.is_empty() || !lane.key.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(Error::Config(format!(
                    "Workplace {}: invalid lane key '{}'",
                    workplace, lane.key
                )));
            }
            if !seen.insert(lane.key.as_str()) {
                return Err(Error::Config(format!(
                    "Workplace {}: duplicate lane '{}'",
                    workplace, lane.key
                )));
            }
        }
        Ok(())
    }
}

/// One congestion radio group
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Lane {
    /// Key in the submitted `congestion` object
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub tooltip: String,
}

impl Lane {
    fn eastbound(key: &str, title: &str) -> Self {
        Self {
            key: key.to_string(),
            title: title.to_string(),
            tooltip: format!(
                "{} congestion on the eastbound highway. If the condition of the lane is unclear, mark it as such.",
                title
            ),
        }
    }

    /// Dotted document path written on submission, e.g. `labels.congestion.leftLane`
    pub fn field_path(&self) -> String {
        format!("labels.congestion.{}Lane", self.key)
    }
}

/// Workplaces served when the TOML file defines none
pub fn default_workplaces() -> Vec<WorkplaceConfig> {
    vec![WorkplaceConfig::new("DCSL"), WorkplaceConfig::new("ALDOT")]
}

impl TomlConfig {
    /// Look up a workplace by route segment (case-insensitive)
    pub fn workplace(&self, id: &str) -> Option<&WorkplaceConfig> {
        self.workplaces.iter().find(|w| w.id.eq_ignore_ascii_case(id))
    }

    pub fn validate(&self) -> Result<()> {
        if self.workplaces.is_empty() {
            return Err(Error::Config("At least one workplace must be configured".to_string()));
        }
        if self.allowed_users.is_empty() {
            return Err(Error::Config("allowed_users must not be empty".to_string()));
        }

        let mut seen = HashSet::new();
        for workplace in &self.workplaces {
            if workplace.id.is_empty()
                || !workplace.id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            {
                return Err(Error::Config(format!("Invalid workplace id '{}'", workplace.id)));
            }
            if !seen.insert(workplace.slug()) {
                return Err(Error::Config(format!("Duplicate workplace '{}'", workplace.id)));
            }
            workplace.schema.validate(&workplace.id)?;
        }
        Ok(())
    }
}

/// Default location of the TOML file: `<config_dir>/trafficnet/labeler.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("trafficnet").join("labeler.toml"))
}

/// Load and validate the TOML configuration
///
/// An explicitly named file must exist. When no file is named, the default
/// location is tried and compiled defaults are used if it is absent; the
/// caller reports which source was used.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!("Config file not found: {}", path.display())));
            }
            path.to_path_buf()
        }
        None => match default_config_path().filter(|p| p.exists()) {
            Some(path) => path,
            None => {
                let config = TomlConfig::default();
                config.validate()?;
                return Ok(config);
            }
        },
    };

    let content = std::fs::read_to_string(&path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    config.validate()?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Pick the first non-blank value, failing with the setting's env var name
pub fn require_setting(
    env_var: &str,
    primary: Option<String>,
    fallback: Option<&String>,
) -> Result<String> {
    primary
        .filter(|v| !v.trim().is_empty())
        .or_else(|| fallback.filter(|v| !v.trim().is_empty()).cloned())
        .ok_or_else(|| {
            Error::Config(format!(
                "Missing {} (set the environment variable or pass it on the command line)",
                env_var
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = TomlConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.workplaces.len(), 2);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn workplace_lookup_ignores_case() {
        let config = TomlConfig::default();
        assert_eq!(config.workplace("dcsl").map(|w| w.id.as_str()), Some("DCSL"));
        assert_eq!(config.workplace("Aldot").map(|w| w.id.as_str()), Some("ALDOT"));
        assert!(config.workplace("mit").is_none());
    }

    #[test]
    fn lane_field_paths() {
        let schema = LabelSchema::default();
        let paths: Vec<String> = schema.lanes.iter().map(|l| l.field_path()).collect();
        assert_eq!(
            paths,
            vec![
                "labels.congestion.leftLane",
                "labels.congestion.centerLane",
                "labels.congestion.rightLane"
            ]
        );
        assert_eq!(
            LabelSchema::north_south().lanes[1].field_path(),
            "labels.congestion.southLane"
        );
    }

    #[test]
    fn rejects_default_outside_options() {
        let mut config = TomlConfig::default();
        config.workplaces[0].schema.precipitation_default = "hail".to_string();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_duplicate_workplaces() {
        let mut config = TomlConfig::default();
        config.workplaces.push(WorkplaceConfig::new("dcsl"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn require_setting_prefers_primary() {
        let fallback = "from-toml".to_string();
        assert_eq!(
            require_setting("X", Some("cli".to_string()), Some(&fallback)).unwrap(),
            "cli"
        );
        assert_eq!(
            require_setting("X", Some("  ".to_string()), Some(&fallback)).unwrap(),
            "from-toml"
        );
        let err = require_setting("TRAFFICNET_PASSKEY", None, None).unwrap_err();
        assert!(err.to_string().contains("TRAFFICNET_PASSKEY"));
    }
}
