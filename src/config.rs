//! Configuration file handling for twincam.
//!
//! Loads configuration from `~/.config/twincam/config.toml` or a custom path.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration file structure for twincam.
/// Loaded from ~/.config/twincam/config.toml (or custom path via --config).
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
}

#[derive(Debug, Deserialize)]
pub struct CameraConfig {
    /// Number of cameras to open, at indices 0..count
    #[serde(default = "default_count")]
    pub count: usize,
    /// Exposure time applied to every camera, in seconds
    #[serde(default = "default_exposure")]
    pub exposure_seconds: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            count: default_count(),
            exposure_seconds: default_exposure(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PreviewConfig {
    /// Downscale factor applied to each frame before compositing
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Whether to open the on-screen preview window
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Horizontal screen position of the preview window
    #[serde(default = "default_window_x")]
    pub window_x: u32,
    /// Vertical screen position of the preview window
    #[serde(default = "default_window_y")]
    pub window_y: u32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            enabled: true,
            window_x: default_window_x(),
            window_y: default_window_y(),
        }
    }
}

fn default_count() -> usize {
    2
}

fn default_exposure() -> f64 {
    0.06
}

fn default_scale() -> f64 {
    0.4
}

fn default_window_x() -> u32 {
    780
}

fn default_window_y() -> u32 {
    50
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
                path: path.clone(),
                source: e,
            })?;
            let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.clone(),
                source: e,
            })?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }
}

/// Default config file location: ~/.config/twincam/config.toml
fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("twincam")
        .join("config.toml")
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError { path, source } => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}
