//! Configuration Management

use crate::validation::ValidationConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Video sampling settings
    #[serde(default)]
    pub sampling: SamplingConfig,
    /// Validation thresholds
    #[serde(default)]
    pub validation: ValidationConfig,
    /// Model and generation settings
    #[serde(default)]
    pub generation: GenerationConfig,
    /// Directory layout
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Video sampling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Frames per second sampled from the video (low rates suit UI work)
    pub fps: f64,
}

/// Model call configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Model identifier
    pub model: String,
    /// Temperature for generation
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    /// Output-length cap in tokens
    pub max_output_tokens: u32,
    /// Per-request timeout in seconds
    pub api_timeout_secs: u64,
    /// Attempts per generation call, including the first
    pub max_retries: u32,
}

/// Directory layout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Where recorded sessions live
    pub records_dir: PathBuf,
    /// Where generated workflow files land
    pub output_dir: PathBuf,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self { fps: 0.8 }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-flash".to_string(),
            temperature: 0.2,
            top_k: 3,
            top_p: 0.8,
            max_output_tokens: 6000,
            api_timeout_secs: 400,
            max_retries: 3,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            records_dir: PathBuf::from("records"),
            output_dir: PathBuf::from("workflows"),
        }
    }
}

impl Config {
    /// Validate config values are within acceptable ranges.
    /// Returns Ok(()) if valid, or Err with a description of the first invalid field.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !self.sampling.fps.is_finite() || self.sampling.fps <= 0.0 || self.sampling.fps > 30.0 {
            return Err(crate::Error::Config(format!(
                "sampling.fps must be in (0, 30], got {}",
                self.sampling.fps
            )));
        }
        if self.generation.model.trim().is_empty() {
            return Err(crate::Error::Config("model must not be empty".to_string()));
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(crate::Error::Config(format!(
                "temperature must be in [0, 2], got {}",
                self.generation.temperature
            )));
        }
        if !(0.0..=1.0).contains(&self.generation.top_p) {
            return Err(crate::Error::Config(format!(
                "top_p must be in [0, 1], got {}",
                self.generation.top_p
            )));
        }
        if self.generation.max_output_tokens == 0 {
            return Err(crate::Error::Config(
                "max_output_tokens must be > 0".to_string(),
            ));
        }
        if self.generation.api_timeout_secs == 0 {
            return Err(crate::Error::Config(
                "api_timeout_secs must be > 0".to_string(),
            ));
        }
        if self.generation.max_retries == 0 {
            return Err(crate::Error::Config("max_retries must be > 0".to_string()));
        }
        if self.validation.max_video_mb <= 0.0
            || self.validation.recommended_video_mb > self.validation.max_video_mb
        {
            return Err(crate::Error::Config(format!(
                "video size caps invalid: recommended {} MB must not exceed max {} MB",
                self.validation.recommended_video_mb, self.validation.max_video_mb
            )));
        }
        Ok(())
    }

    /// Load config from file
    pub fn load(path: &PathBuf) -> Result<Self, crate::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from default location
    pub fn load_default() -> Result<Self, crate::Error> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &PathBuf) -> Result<(), crate::Error> {
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".rpa_workflow_gen").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Generate TOML representation
    pub fn to_toml(&self) -> Result<String, crate::Error> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }
}
