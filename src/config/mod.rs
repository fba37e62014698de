// Configuration module
//
// Process-wide settings: the watermark source with its opacity multiplier, and
// logging. Loaded once at start-up from YAML with ${VAR} substitution.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::constants::{DEFAULT_LOG_LEVEL, DEFAULT_WATERMARK_OPACITY};
use crate::imaging::{ImageData, ImageError};

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Environment variable '{0}' is referenced but not set")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Invalid watermark image: {0}")]
    Source(#[from] ImageError),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub watermark: WatermarkConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_watermark_opacity() -> f64 {
    DEFAULT_WATERMARK_OPACITY
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Process-wide watermark settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatermarkConfig {
    /// Multiplier applied to every request's opacity, in (0, 1] (default: 1.0)
    #[serde(default = "default_watermark_opacity")]
    pub opacity: f64,

    /// Base64-encoded watermark image; takes precedence over `path`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,

    /// Path to the watermark image file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            opacity: default_watermark_opacity(),
            data: None,
            path: None,
        }
    }
}

impl WatermarkConfig {
    /// Whether any watermark source is configured
    pub fn has_source(&self) -> bool {
        self.data.is_some() || self.path.is_some()
    }

    /// Load the configured watermark image, if any.
    ///
    /// The image type is detected from the bytes; unknown types are rejected
    /// here rather than on the first request.
    pub fn load_source(&self) -> Result<Option<Arc<ImageData>>, ConfigError> {
        let bytes = if let Some(data) = &self.data {
            let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
            BASE64
                .decode(compact)
                .map_err(|e| ConfigError::Invalid(format!("watermark.data is not base64: {}", e)))?
        } else if let Some(path) = &self.path {
            std::fs::read(path).map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })?
        } else {
            return Ok(None);
        };

        let image = ImageData::from_bytes(bytes)?;
        info!(
            image_type = image.image_type().as_str(),
            size = image.len(),
            "Loaded watermark image"
        );
        Ok(Some(Arc::new(image)))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.opacity.is_finite() && self.opacity > 0.0 && self.opacity <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "watermark.opacity must be in (0, 1], got {}",
                self.opacity
            )));
        }

        if matches!(&self.data, Some(data) if data.trim().is_empty()) {
            return Err(ConfigError::Invalid("watermark.data cannot be empty".to_string()));
        }

        if matches!(&self.path, Some(path) if path.as_os_str().is_empty()) {
            return Err(ConfigError::Invalid("watermark.path cannot be empty".to_string()));
        }

        Ok(())
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when RUST_LOG is not set (default: "info")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, ConfigError> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        // First, check that all referenced environment variables exist
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            if std::env::var(var_name).is_err() {
                return Err(ConfigError::MissingEnvVar(var_name.to_string()));
            }
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        Ok(serde_yaml::from_str(&substituted)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.watermark.validate()?;

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Invalid("logging.level cannot be empty".to_string()));
        }

        Ok(())
    }
}
