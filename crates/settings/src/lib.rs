//! ClaimCraft Settings
//!
//! Configuration for the `claimcraft` binary, stored as JSON.
//!
//! ## Sections
//!
//! - `token`: decimal precision of the distributed token
//! - `build`: output directory and the buckets with their input files
//! - `server`: listen address and the directory packs are served from
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use claimcraft_settings::Settings;
//!
//! let settings = Settings::load_from(Path::new("claimcraft.json"))?;
//! settings.validate()?;
//! for bucket in &settings.build.buckets {
//!     let inputs: Vec<_> = bucket.inputs.iter().map(|p| settings.resolve(p)).collect();
//!     println!("{}: {:?}", bucket.name, inputs);
//! }
//! # Ok::<(), claimcraft_settings::SettingsError>(())
//! ```

mod config;

pub use config::{BucketSettings, BuildSettings, ServerSettings, Settings, TokenSettings};

use thiserror::Error;

/// File name looked up in the working directory when `--config` is absent.
pub const DEFAULT_SETTINGS_FILE: &str = "claimcraft.json";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings: {0}")]
    ReadError(std::io::Error),

    #[error("Failed to write settings: {0}")]
    WriteError(std::io::Error),

    #[error("Failed to parse settings: {0}")]
    ParseError(serde_json::Error),

    #[error("Failed to create config directory: {0}")]
    CreateDirError(std::io::Error),

    #[error("Invalid settings: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, SettingsError>;
