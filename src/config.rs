//! Configuration file loading with environment variable overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::adapters::live::gemini::GEMINI_API_BASE;
use crate::adapters::live::gemini_text::DEFAULT_TEXT_MODEL;
use crate::retry::RetryPolicy;

/// Environment variable holding the Google AI API key.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API key configuration.
    pub keys: KeysConfig,
    /// HTTP service binding.
    pub server: ServerConfig,
    /// Generation defaults and client tuning.
    pub generation: GenerationConfig,
    /// Template file override.
    pub templates: TemplatesConfig,
    /// Log output.
    pub logging: LoggingConfig,
}

/// API key configuration.
#[derive(Debug, Default, Deserialize)]
pub struct KeysConfig {
    /// Google AI API key.
    pub google: Option<String>,
}

/// Where the HTTP service listens.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8080 }
    }
}

/// Generation defaults and client tuning.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Default model alias.
    pub model: String,
    /// Default template tier.
    pub quality: String,
    /// Concurrency limit for batches.
    pub concurrency: usize,
    /// Per-call HTTP timeout in seconds.
    pub timeout_secs: u64,
    /// Attempts per generation, including the first.
    pub max_attempts: u32,
    /// Base of the exponential backoff, in seconds.
    pub backoff_base_secs: u64,
    /// API root the client posts to.
    pub base_url: String,
    /// Text model used for LLM prompt enhancement.
    pub text_model: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "flash".to_string(),
            quality: "detailed".to_string(),
            concurrency: 5,
            timeout_secs: 30,
            max_attempts: 3,
            backoff_base_secs: 1,
            base_url: GEMINI_API_BASE.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
        }
    }
}

impl GenerationConfig {
    /// Per-call HTTP timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Retry policy built from the configured budget and backoff base.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_secs(self.backoff_base_secs))
    }
}

/// Template file override.
#[derive(Debug, Default, Deserialize)]
pub struct TemplatesConfig {
    /// JSON file used instead of the built-in templates.
    pub path: Option<PathBuf>,
}

/// Log output settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    /// `pretty` or `json`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

impl Config {
    /// Load configuration from the given path, or return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
        toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
    }

    /// Get the Google API key, preferring the environment variable.
    #[must_use]
    pub fn google_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.is_empty())
            .or_else(|| self.keys.google.clone())
    }

    /// Port to bind, preferring the `PORT` environment variable.
    #[must_use]
    pub fn port(&self) -> u16 {
        std::env::var("PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(self.server.port)
    }
}

/// Discover the config file path using the resolution order:
/// 1. Explicit path (from `--config` flag)
/// 2. `NANOBANANA_CONFIG` environment variable
/// 3. `~/.config/nanobanana/config.toml`
#[must_use]
pub fn discover_config_path(explicit: Option<&str>) -> PathBuf {
    if let Some(p) = explicit {
        return PathBuf::from(p);
    }

    if let Ok(p) = std::env::var("NANOBANANA_CONFIG") {
        return PathBuf::from(p);
    }

    default_config_path()
}

/// Default config path: `~/.config/nanobanana/config.toml`.
fn default_config_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".config/nanobanana/config.toml")
    } else {
        PathBuf::from("nanobanana.toml")
    }
}
