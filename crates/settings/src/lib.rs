//! ClaimCraft Settings
//!
//! Operator configuration stored as JSON, by default at
//! `~/.claimcraft/settings.json`.
//!
//! ## Usage
//!
//! ```no_run
//! use claimcraft_settings::Settings;
//!
//! let mut settings = Settings::load_or_default()?;
//! settings.chain.confirmation_timeout_secs = 300;
//! settings.save()?;
//! # Ok::<(), claimcraft_settings::SettingsError>(())
//! ```

mod config;

pub use config::{ChainSettings, LoggingSettings, Settings, StoreSettings};

use std::path::PathBuf;

use thiserror::Error;

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
}

pub type Result<T> = std::result::Result<T, SettingsError>;

/// `$HOME/.claimcraft`, or `./.claimcraft` when no home directory is set
pub fn default_config_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".claimcraft")
}

/// Get the default settings file path
pub fn default_settings_path() -> PathBuf {
    default_config_dir().join("settings.json")
}
