//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use digest_core::{DEFAULT_CEILING, DEFAULT_LOOKBACK, DayOrder, ReconstructConfig};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// API key for the summarization service.
    pub api_key: Option<String>,

    /// Model used for summaries.
    pub model: String,

    /// Base URL of the Responses API.
    pub api_base_url: String,

    /// Prompt budget in model tokens.
    pub token_limit: usize,

    /// Maximum characters per printed chunk.
    pub message_ceiling: usize,

    /// Characters before the ceiling searched for a line break.
    pub message_lookback: usize,

    /// Neighbouring timestamps closer than this many seconds are merged.
    pub jitter_seconds: i64,

    /// Read ambiguous dates day-first when both orders fit equally well.
    pub prefer_day_first: bool,

    /// Print the prompt instead of calling the API.
    pub dry_run: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("api_base_url", &self.api_base_url)
            .field("token_limit", &self.token_limit)
            .field("message_ceiling", &self.message_ceiling)
            .field("message_lookback", &self.message_lookback)
            .field("jitter_seconds", &self.jitter_seconds)
            .field("prefer_day_first", &self.prefer_day_first)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("digest.db"),
            api_key: None,
            model: digest_llm::DEFAULT_MODEL.to_string(),
            api_base_url: digest_llm::DEFAULT_BASE_URL.to_string(),
            token_limit: digest_llm::DEFAULT_TOKEN_LIMIT,
            message_ceiling: DEFAULT_CEILING,
            message_lookback: DEFAULT_LOOKBACK,
            jitter_seconds: 600,
            prefer_day_first: true,
            dry_run: false,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (DIGEST_*)
        figment = figment.merge(Env::prefixed("DIGEST_"));

        figment.extract()
    }

    /// Heuristic constants for timeline reconstruction.
    ///
    /// Negative jitter counts as zero; jitter too large for a duration is
    /// rejected.
    pub fn reconstruct(&self) -> anyhow::Result<ReconstructConfig> {
        let jitter = chrono::Duration::try_seconds(self.jitter_seconds.max(0)).ok_or_else(|| {
            anyhow::anyhow!("jitter_seconds out of range: {}", self.jitter_seconds)
        })?;
        Ok(ReconstructConfig {
            jitter,
            tie_break: if self.prefer_day_first {
                DayOrder::DayFirst
            } else {
                DayOrder::MonthFirst
            },
        })
    }

    /// The configured API key, if non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// Returns the platform-specific config directory for digest.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("digest"))
}

/// Returns the platform-specific data directory for digest.
///
/// On Linux: `~/.local/share/digest`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("digest"))
}
