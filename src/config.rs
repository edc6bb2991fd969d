//! Configuration management for chapter-dl.
//!
//! Handles loading, saving, and validating configuration from
//! platform-specific config directories.

use crate::batch::ChapterRange;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Application name used for config directory.
const APP_NAME: &str = "chapter-dl";

/// Default config filename.
const CONFIG_FILENAME: &str = "config.toml";

/// User agent sent with every request.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 6.1; WOW64; rv:45.0) Gecko/20100101 Firefox/45.0";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where chapters come from.
    pub source: SourceConfig,

    /// Where and how chapters are downloaded.
    pub download: DownloadConfig,
}

/// Listing page and HTTP settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// URL of the page listing every chapter.
    pub listing_url: String,

    /// Origin that relative chapter links are joined with.
    /// Defaults to the origin of `listing_url`.
    pub server_origin: Option<String>,

    /// User agent header value.
    pub user_agent: String,

    /// Connect and read timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            listing_url: String::new(),
            server_origin: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_ms: 5000,
        }
    }
}

/// What to do when two chapters in a batch share a title.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateTitles {
    /// Every chapter writes `<title>.txt`; the last writer wins.
    #[default]
    Overwrite,
    /// Later duplicates write `<title> (<chapter number>).txt`.
    AppendIndex,
}

/// Batch download settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Directory chapter files are written to.
    pub output_directory: PathBuf,

    /// First chapter to download (1-based, inclusive). Values below 1 mean 1.
    pub start: i64,

    /// Last chapter to download (1-based, inclusive). Unset means the last one;
    /// values below 1 select nothing.
    pub end: Option<i64>,

    /// Cooldown each worker observes after finishing a chapter, in milliseconds.
    pub delay_ms: u64,

    /// Worker pool size. Unset means available parallelism + 1.
    pub workers: Option<usize>,

    /// Handling of chapters with identical titles.
    pub duplicate_titles: DuplicateTitles,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("chapters"),
            start: 1,
            end: None,
            delay_ms: 500,
            workers: None,
            duplicate_titles: DuplicateTitles::Overwrite,
        }
    }
}

impl DownloadConfig {
    /// Returns the requested chapter range, raised to start at 1 at least.
    ///
    /// The upper bound is clamped once the listing length is known.
    pub fn range(&self) -> ChapterRange {
        let start = usize::try_from(self.start.max(1)).unwrap_or(usize::MAX);
        let end = match self.end {
            None => usize::MAX,
            Some(end) if end < 1 => 0,
            Some(end) => usize::try_from(end).unwrap_or(usize::MAX),
        };
        ChapterRange::new(start, end)
    }

    /// Returns the cooldown as a `Duration`.
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Returns the effective worker count.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(default_worker_count)
    }
}

/// Available parallelism plus one, since tasks mostly wait on I/O.
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        + 1
}

impl Config {
    /// Returns the platform-specific config directory path.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Returns the full path to the config file.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join(CONFIG_FILENAME))
    }

    /// Loads configuration from the default location.
    ///
    /// If the config file doesn't exist, creates a default one.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Saves configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.listing_url()?;
        self.server_origin()?;

        if self.source.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "source.timeout_ms".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        if self.download.workers == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "download.workers".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Returns the parsed listing page URL.
    pub fn listing_url(&self) -> Result<Url, ConfigError> {
        if self.source.listing_url.trim().is_empty() {
            return Err(ConfigError::MissingValue(
                "source.listing_url (pass a URL or set it in the config file)".to_string(),
            ));
        }

        Url::parse(self.source.listing_url.trim()).map_err(|e| ConfigError::InvalidValue {
            key: "source.listing_url".to_string(),
            message: e.to_string(),
        })
    }

    /// Returns the origin used to resolve relative chapter links.
    pub fn server_origin(&self) -> Result<Url, ConfigError> {
        match &self.source.server_origin {
            Some(origin) => Url::parse(origin).map_err(|e| ConfigError::InvalidValue {
                key: "source.server_origin".to_string(),
                message: e.to_string(),
            }),
            None => {
                let listing = self.listing_url()?;
                let origin = listing.origin().ascii_serialization();
                Url::parse(&origin).map_err(|e| ConfigError::InvalidValue {
                    key: "source.listing_url".to_string(),
                    message: format!("no usable origin: {}", e),
                })
            }
        }
    }

    /// Returns the request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.source.timeout_ms)
    }
}
