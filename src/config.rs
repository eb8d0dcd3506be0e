//! Application configuration module.
//!
//! Handles loading, validating, and merging a `config.toml` file. Stock
//! defaults are overridden by whatever keys the user file sets.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [composite]
//! canonical_height = 720    # Both photos are scaled to this height
//! quality = 90              # JPEG quality of the composite (1-100)
//!
//! [generation]
//! base_url = "https://generativelanguage.googleapis.com"
//! model = "veo-2.0-generate-001"
//! poll_interval_secs = 10   # Constant wait between status checks
//! api_key_env = "GEMINI_API_KEY"
//!
//! [progress]
//! tick_secs = 3             # How often the progress message rotates
//!
//! [output]
//! video_filename = "ai_hug_video.mp4"
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [generation]
//! poll_interval_secs = 15
//! ```
//!
//! Unknown keys are rejected to catch typos early.
//!
//! ## Credentials
//!
//! The API key itself never lives in the file. `api_key_env` names the
//! environment variable holding it; [`resolve_api_key`] reads it once at
//! startup and the key is handed to the backend explicitly.

use crate::generation::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::imaging::{CompositeConfig, Quality};
use crate::video::DEFAULT_VIDEO_FILENAME;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Missing API key: set the {0} environment variable")]
    MissingApiKey(String),
}

/// Application configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Composite frame settings (height, quality).
    pub composite: CompositeSettings,
    /// Video generation service settings.
    pub generation: GenerationSettings,
    /// Progress message rotation.
    pub progress: ProgressSettings,
    /// Saved video settings.
    pub output: OutputSettings,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.composite.canonical_height == 0 {
            return Err(ConfigError::Validation(
                "composite.canonical_height must be non-zero".into(),
            ));
        }
        if self.composite.quality == 0 || self.composite.quality > 100 {
            return Err(ConfigError::Validation(
                "composite.quality must be 1-100".into(),
            ));
        }
        if self.generation.poll_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "generation.poll_interval_secs must be at least 1".into(),
            ));
        }
        if self.generation.base_url.trim().is_empty() || self.generation.model.trim().is_empty() {
            return Err(ConfigError::Validation(
                "generation.base_url and generation.model must not be empty".into(),
            ));
        }
        if self.progress.tick_secs == 0 {
            return Err(ConfigError::Validation(
                "progress.tick_secs must be at least 1".into(),
            ));
        }
        if self.output.video_filename.trim().is_empty() {
            return Err(ConfigError::Validation(
                "output.video_filename must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Composite frame settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompositeSettings {
    /// Height in pixels both photos are scaled to.
    pub canonical_height: u32,
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for CompositeSettings {
    fn default() -> Self {
        Self {
            canonical_height: 720,
            quality: 90,
        }
    }
}

impl CompositeSettings {
    pub fn to_composite_config(&self) -> CompositeConfig {
        CompositeConfig {
            canonical_height: self.canonical_height,
            quality: Quality::new(self.quality),
        }
    }
}

/// Video generation service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationSettings {
    /// Service root, without the API version.
    pub base_url: String,
    /// Video model name.
    pub model: String,
    /// Seconds between status checks. Constant, no backoff.
    pub poll_interval_secs: u64,
    /// Name of the environment variable that holds the API key.
    pub api_key_env: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            poll_interval_secs: 10,
            api_key_env: "GEMINI_API_KEY".to_string(),
        }
    }
}

impl GenerationSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Progress message rotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProgressSettings {
    /// Seconds each progress message stays on screen.
    pub tick_secs: u64,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self { tick_secs: 3 }
    }
}

impl ProgressSettings {
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs(self.tick_secs)
    }
}

/// Saved video settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSettings {
    /// Filename suggested when saving the generated video.
    pub video_filename: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            video_filename: DEFAULT_VIDEO_FILENAME.to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(AppConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<AppConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a `config.toml` path, or stock defaults when `None`.
///
/// An explicitly given path must exist.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let overlay = match path {
        Some(p) => Some(toml::from_str::<toml::Value>(&fs::read_to_string(p)?)?),
        None => None,
    };
    resolve_config(overlay)
}

/// Read the API key from the environment variable the config names.
pub fn resolve_api_key(settings: &GenerationSettings) -> Result<String, ConfigError> {
    std::env::var(&settings.api_key_env)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingApiKey(settings.api_key_env.clone()))
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# hug-reel configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Composite frame
# ---------------------------------------------------------------------------
[composite]
# Both photos are scaled to this height (pixels) and placed side by side.
canonical_height = 720

# JPEG quality of the composite sent for generation (1 = worst, 100 = best).
quality = 90

# ---------------------------------------------------------------------------
# Video generation service
# ---------------------------------------------------------------------------
[generation]
base_url = "https://generativelanguage.googleapis.com"
model = "veo-2.0-generate-001"

# Seconds between job status checks. The wait is constant (no backoff).
poll_interval_secs = 10

# Environment variable holding the API key. The key itself never goes here.
api_key_env = "GEMINI_API_KEY"

# ---------------------------------------------------------------------------
# Progress display
# ---------------------------------------------------------------------------
[progress]
# Seconds each "still working" message stays up before the next one.
tick_secs = 3

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Filename suggested when saving the generated video.
video_filename = "ai_hug_video.mp4"
"##
}
