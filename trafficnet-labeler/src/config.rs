//! Startup configuration for trafficnet-labeler
//!
//! Command-line arguments (each with an environment-variable fallback) are
//! merged over `labeler.toml`. Secrets only come from the command line or the
//! environment.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use trafficnet_common::config::{require_setting, TomlConfig};
use trafficnet_common::{Error, Result};

use crate::blob::{BlobError, BlobStore, BoxAppConfig, BoxBlobStore, LocalBlobStore};

/// Port used when neither the command line nor the TOML file sets one
pub const DEFAULT_PORT: u16 = 5780;

/// Command-line arguments for trafficnet-labeler
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "trafficnet-labeler")]
#[command(about = "Web labeling tool for TrafficNet highway camera images")]
#[command(version)]
pub struct Args {
    /// Path to labeler.toml
    #[arg(long, env = "TRAFFICNET_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database connection string, e.g. sqlite:///var/lib/trafficnet/labels.db
    #[arg(long, env = "TRAFFICNET_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Collection (table) holding the sample records
    #[arg(long, env = "TRAFFICNET_DATABASE_NAME")]
    pub database_name: Option<String>,

    /// Base64-encoded Box app config JSON
    #[arg(long, env = "TRAFFICNET_BOX_CONFIG", hide_env_values = true)]
    pub box_config: Option<String>,

    /// Box user the app acts as
    #[arg(long, env = "TRAFFICNET_BOX_USERKEY")]
    pub box_user_key: Option<String>,

    /// Serve images from a local directory instead of Box
    #[arg(long, env = "TRAFFICNET_BLOB_DIR")]
    pub blob_dir: Option<PathBuf>,

    /// Shared passkey for the access gate
    #[arg(long, env = "TRAFFICNET_PASSKEY", hide_env_values = true)]
    pub passkey: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "TRAFFICNET_PORT")]
    pub port: Option<u16>,
}

/// Where sample images are read from
#[derive(Debug, Clone, PartialEq)]
pub enum BlobBackend {
    Box {
        /// Base64-encoded app config
        app_config: String,
        user_key: String,
    },
    Local {
        dir: PathBuf,
    },
}

impl BlobBackend {
    pub fn open(&self) -> std::result::Result<Arc<dyn BlobStore>, BlobError> {
        match self {
            BlobBackend::Box {
                app_config,
                user_key,
            } => {
                let config = BoxAppConfig::from_base64(app_config)?;
                Ok(Arc::new(BoxBlobStore::new(config, user_key.clone())?))
            }
            BlobBackend::Local { dir } => Ok(Arc::new(LocalBlobStore::new(dir.clone())?)),
        }
    }
}

/// Fully resolved settings, built once at startup
#[derive(Debug, Clone)]
pub struct LabelerConfig {
    pub database_url: String,
    pub collection: String,
    pub blob: BlobBackend,
    pub passkey: String,
    pub port: u16,
    pub settings: TomlConfig,
}

impl LabelerConfig {
    /// Merge arguments over the TOML file; fails naming the first missing setting
    pub fn resolve(args: Args, settings: TomlConfig) -> Result<Self> {
        let database_url = require_setting(
            "TRAFFICNET_DATABASE_URL",
            args.database_url,
            settings.database_url.as_ref(),
        )?;
        let collection = require_setting(
            "TRAFFICNET_DATABASE_NAME",
            args.database_name,
            settings.database_name.as_ref(),
        )?;
        let passkey = require_setting("TRAFFICNET_PASSKEY", args.passkey, None)?;

        let box_config = args.box_config.filter(|v| !v.trim().is_empty());
        let blob = match box_config {
            Some(app_config) => BlobBackend::Box {
                app_config,
                user_key: require_setting("TRAFFICNET_BOX_USERKEY", args.box_user_key, None)?,
            },
            None => match args.blob_dir.or_else(|| settings.blob_dir.clone()) {
                Some(dir) => BlobBackend::Local { dir },
                None => {
                    return Err(Error::Config(
                        "Missing TRAFFICNET_BOX_CONFIG (or TRAFFICNET_BLOB_DIR for local images)"
                            .to_string(),
                    ))
                }
            },
        };

        let port = args.port.or(settings.port).unwrap_or(DEFAULT_PORT);

        Ok(Self {
            database_url,
            collection,
            blob,
            passkey,
            port,
            settings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> Args {
        Args {
            database_url: Some("sqlite::memory:".to_string()),
            database_name: Some("samples".to_string()),
            box_config: Some("e30=".to_string()),
            box_user_key: Some("42".to_string()),
            passkey: Some("hunter2".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn arguments_resolve_box_backend() {
        let config = LabelerConfig::resolve(args(), TomlConfig::default()).unwrap();
        assert_eq!(config.collection, "samples");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(
            config.blob,
            BlobBackend::Box {
                app_config: "e30=".to_string(),
                user_key: "42".to_string()
            }
        );
    }

    #[test]
    fn toml_fills_missing_arguments() {
        let settings = TomlConfig {
            database_url: Some("sqlite://labels.db".to_string()),
            blob_dir: Some(PathBuf::from("/srv/images")),
            port: Some(8080),
            ..Default::default()
        };
        let args = Args {
            database_url: None,
            box_config: None,
            ..args()
        };

        let config = LabelerConfig::resolve(args, settings).unwrap();
        assert_eq!(config.database_url, "sqlite://labels.db");
        assert_eq!(config.port, 8080);
        assert_eq!(
            config.blob,
            BlobBackend::Local {
                dir: PathBuf::from("/srv/images")
            }
        );
    }

    #[test]
    fn missing_passkey_is_fatal() {
        let args = Args {
            passkey: None,
            ..args()
        };
        let err = LabelerConfig::resolve(args, TomlConfig::default()).unwrap_err();
        assert!(err.to_string().contains("TRAFFICNET_PASSKEY"));
    }

    #[test]
    fn box_config_requires_user_key() {
        let args = Args {
            box_user_key: None,
            ..args()
        };
        let err = LabelerConfig::resolve(args, TomlConfig::default()).unwrap_err();
        assert!(err.to_string().contains("TRAFFICNET_BOX_USERKEY"));
    }

    #[test]
    fn some_blob_backend_is_required() {
        let args = Args {
            box_config: None,
            ..args()
        };
        assert!(matches!(
            LabelerConfig::resolve(args, TomlConfig::default()),
            Err(Error::Config(_))
        ));
    }
}
