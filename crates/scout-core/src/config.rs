//! Configuration management for Scout
//!
//! Settings live in `.scout/config.toml` under the working directory. Every
//! field has a default, so a missing file or a partial file is fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::session::LoopLimits;
use crate::{Result, ScoutError};

/// Directory holding Scout state in the working directory
pub const SCOUT_DIR: &str = ".scout";

/// Top-level Scout configuration
///
/// Loaded from `.scout/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoutConfig {
    /// Loop limits
    #[serde(default)]
    pub search: SearchConfig,

    /// Probe settings for candidate URLs
    #[serde(default)]
    pub http: HttpConfig,

    /// Model selection
    #[serde(default)]
    pub model: ModelConfig,

    /// Where results go
    #[serde(default)]
    pub output: OutputConfig,
}

/// Loop limits for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// The run stops once the found list grows past this count
    #[serde(default = "default_target_count")]
    pub target_count: usize,

    /// Hard cap on proposal rounds
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

/// HTTP probe settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent header sent with every probe
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Default model to use (opus, sonnet, haiku)
    #[serde(default = "default_model")]
    pub default: String,

    /// Maximum tokens per proposal response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Environment variable containing the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Consecutive failed rounds before API calls pause
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Seconds to pause API calls once the failure threshold is hit
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Export file; the extension picks the format
    #[serde(default = "default_output_path")]
    pub path: PathBuf,

    /// Write a Markdown round log to `.scout/activity.md`
    #[serde(default = "default_activity_log")]
    pub activity_log: bool,
}

// Default value providers
fn default_target_count() -> usize {
    10
}

fn default_max_iterations() -> usize {
    20
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_user_agent() -> String {
    "Mozilla/5.0".to_string()
}

fn default_model() -> String {
    "haiku".to_string()
}

fn default_max_tokens() -> usize {
    1024
}

fn default_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_cooldown_secs() -> u64 {
    60
}

fn default_output_path() -> PathBuf {
    PathBuf::from("websites.xlsx")
}

fn default_activity_log() -> bool {
    true
}

impl ScoutConfig {
    /// Path of the config file under `root`
    pub fn path(root: &Path) -> PathBuf {
        root.join(SCOUT_DIR).join("config.toml")
    }

    /// Load configuration from `.scout/config.toml` or use defaults
    pub fn load_or_default(root: &Path) -> Result<Self> {
        let config_path = Self::path(root);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ScoutError::Config(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Write default configuration to `.scout/config.toml`
    ///
    /// Returns the path written.
    pub fn write_default(root: &Path) -> Result<PathBuf> {
        let config_dir = root.join(SCOUT_DIR);
        std::fs::create_dir_all(&config_dir)?;

        let config_path = config_dir.join("config.toml");
        std::fs::write(&config_path, Self::default().to_toml()?)?;
        Ok(config_path)
    }

    /// Render as pretty TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ScoutError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Reject settings that would make a run meaningless
    pub fn validate(&self) -> Result<()> {
        if self.search.max_iterations == 0 {
            return Err(ScoutError::Config(
                "search.max_iterations must be at least 1".to_string(),
            ));
        }
        if self.model.failure_threshold == 0 {
            return Err(ScoutError::Config(
                "model.failure_threshold must be at least 1".to_string(),
            ));
        }
        if self.http.timeout_secs == 0 {
            return Err(ScoutError::Config(
                "http.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Loop limits derived from the search section
    pub fn limits(&self) -> LoopLimits {
        LoopLimits {
            target_count: self.search.target_count,
            max_iterations: self.search.max_iterations,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            target_count: default_target_count(),
            max_iterations: default_max_iterations(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            default: default_model(),
            max_tokens: default_max_tokens(),
            api_key_env: default_api_key_env(),
            failure_threshold: default_failure_threshold(),
            cooldown_secs: default_cooldown_secs(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            activity_log: default_activity_log(),
        }
    }
}
