//! Configuration module
//!
//! Handles application settings and platform directories

mod settings;

pub use settings::{AppConfig, ConfigError, LoggingConfig, SetupConfig};

use directories::ProjectDirs;
use std::path::PathBuf;

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "sw16setup", "SW16Setup")
}

/// Get the application configuration directory
pub fn config_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the application data directory
pub fn data_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
}

/// Get the log directory
pub fn log_dir() -> Option<PathBuf> {
    data_dir().map(|d| d.join("logs"))
}

/// Default location of the configuration file
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Default location of the configured-device store
pub fn default_store_path() -> Option<PathBuf> {
    data_dir().map(|d| d.join("entries.json"))
}
