//! Application configuration.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory where queued render jobs are written.
    pub jobs_dir: PathBuf,

    /// Default render settings used to seed a new render dialog.
    pub render: RenderDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default render parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderDefaults {
    /// Default codec id (e.g. "h264", "mp3").
    pub codec: String,

    /// Default still image format ("png" or "jpeg").
    pub still_image_format: String,

    /// Default frame format for video renders ("png" or "jpeg").
    pub video_image_format: String,

    /// Default JPEG quality.
    pub quality: u8,

    /// Default output scale.
    pub scale: f64,

    /// Lowest accepted render concurrency.
    pub min_concurrency: u32,

    /// Highest accepted render concurrency.
    pub max_concurrency: u32,

    /// Default output name stem, without extension.
    pub output_stem: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "renderkit=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            jobs_dir: dirs_default_jobs(),
            render: RenderDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            codec: "h264".to_string(),
            still_image_format: "png".to_string(),
            video_image_format: "jpeg".to_string(),
            quality: 80,
            scale: 1.0,
            min_concurrency: 1,
            max_concurrency: available_cpus(),
            output_stem: "out".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from `config_path`.
    ///
    /// Sections are read independently: an invalid `render` section does not
    /// discard a valid `jobs_dir` or `logging` section.
    pub fn load_from(config_path: &Path) -> Self {
        if !config_path.exists() {
            return Self::default();
        }
        let content = match std::fs::read_to_string(config_path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = %config_path.display(), error = %e, "Failed to read config");
                return Self::default();
            }
        };
        let value: serde_json::Value = match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(path = %config_path.display(), error = %e, "Config is not valid JSON");
                return Self::default();
            }
        };

        let mut config = Self::default();
        if let Some(jobs_dir) = section(&value, "jobs_dir", config_path) {
            config.jobs_dir = jobs_dir;
        }
        if let Some(render) = section(&value, "render", config_path) {
            config.render = render;
        }
        if let Some(logging) = section(&value, "logging", config_path) {
            config.logging = logging;
        }
        config
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&config_file_path())
    }

    /// Save config to `config_path`, creating parent directories.
    pub fn save_to(&self, config_path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Deserialize one top-level section, warning with its name on failure.
fn section<T: DeserializeOwned>(value: &serde_json::Value, key: &str, path: &Path) -> Option<T> {
    let raw = value.get(key)?;
    match serde_json::from_value(raw.clone()) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                section = key,
                error = %e,
                "Invalid config section; using defaults for it"
            );
            None
        }
    }
}

/// Number of logical CPUs, the natural upper bound for render concurrency.
pub fn available_cpus() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1)
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("renderkit").join("config.json")
}

/// Default render job directory.
fn dirs_default_jobs() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        });
    base.join("renderkit").join("jobs")
}
