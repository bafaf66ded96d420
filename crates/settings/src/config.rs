//! Configuration types

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use claimcraft_core::{is_bucket_name, MAX_DECIMALS};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{Result, SettingsError};

/// Main settings structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Token precision
    #[serde(default)]
    pub token: TokenSettings,

    /// Pipeline inputs and output
    #[serde(default)]
    pub build: BuildSettings,

    /// Proof API
    #[serde(default)]
    pub server: ServerSettings,

    /// Custom settings file path (not serialized)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

impl Settings {
    /// Load settings from a specific path, or create defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).map_err(SettingsError::ReadError)?;
            let mut settings: Settings =
                serde_json::from_str(&content).map_err(SettingsError::ParseError)?;
            settings.config_path = Some(path.to_path_buf());
            info!("Loaded settings from {:?}", path);
            Ok(settings)
        } else {
            let mut settings = Self::default();
            settings.config_path = Some(path.to_path_buf());
            Ok(settings)
        }
    }

    /// Starting point written by `config init`: one `base` bucket.
    pub fn template() -> Self {
        let mut settings = Self::default();
        settings.build.buckets.push(BucketSettings {
            name: "base".to_string(),
            inputs: vec![PathBuf::from("data/base.csv")],
        });
        settings
    }

    /// Save settings to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(SettingsError::CreateDirError)?;
            }
        }

        let content = serde_json::to_string_pretty(self).map_err(SettingsError::ParseError)?;
        std::fs::write(path, content).map_err(SettingsError::WriteError)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Resolve a configured path against the settings file's directory.
    ///
    /// Absolute paths and settings without a file location are returned
    /// unchanged.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match self.config_path.as_deref().and_then(Path::parent) {
            Some(base) => base.join(path),
            None => path.to_path_buf(),
        }
    }

    /// Check the values a build depends on.
    pub fn validate(&self) -> Result<()> {
        if self.token.decimals > MAX_DECIMALS {
            return Err(SettingsError::Invalid(format!(
                "token.decimals is {}, maximum is {}",
                self.token.decimals, MAX_DECIMALS
            )));
        }

        let mut seen = HashSet::new();
        for bucket in &self.build.buckets {
            if !is_bucket_name(&bucket.name) {
                return Err(SettingsError::Invalid(format!(
                    "bucket name {:?} must match [a-z0-9_-]+ and not be \"roots\"",
                    bucket.name
                )));
            }
            if !seen.insert(bucket.name.as_str()) {
                return Err(SettingsError::Invalid(format!(
                    "bucket {} is listed more than once",
                    bucket.name
                )));
            }
            if bucket.inputs.is_empty() {
                return Err(SettingsError::Invalid(format!(
                    "bucket {} has no inputs",
                    bucket.name
                )));
            }
        }
        Ok(())
    }
}

/// Token settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSettings {
    /// Smallest-unit exponent (18 for most ERC-20 tokens)
    #[serde(default = "default_decimals")]
    pub decimals: u32,
}

fn default_decimals() -> u32 {
    18
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            decimals: default_decimals(),
        }
    }
}

/// Build settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSettings {
    /// Where packs and `roots.json` are published
    #[serde(default = "default_packs_dir")]
    pub output_dir: PathBuf,

    /// Independent distribution tranches
    #[serde(default)]
    pub buckets: Vec<BucketSettings>,
}

fn default_packs_dir() -> PathBuf {
    PathBuf::from("dist")
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            output_dir: default_packs_dir(),
            buckets: Vec::new(),
        }
    }
}

/// One bucket and its eligibility files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketSettings {
    pub name: String,

    /// Delimited files, concatenated before aggregation
    #[serde(default)]
    pub inputs: Vec<PathBuf>,
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Directory holding `roots.json` and the packs
    #[serde(default = "default_packs_dir")]
    pub packs_dir: PathBuf,
}

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            packs_dir: default_packs_dir(),
        }
    }
}
