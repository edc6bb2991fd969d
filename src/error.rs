//! Error types for the chapter downloader.
//!
//! Uses `thiserror` for structured error definitions. Only [`BatchError`]
//! stops a run; everything else is scoped to a single chapter.

use std::path::PathBuf;
use thiserror::Error;

/// Error returned by a page fetch.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Network failure, timeout or non-success HTTP status
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// URL parsing or joining failed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Error returned when a page does not have the expected structure.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The required element isn't found in the HTML
    #[error("Element not found: {0}")]
    ElementNotFound(String),
}

/// Error terminating a single chapter download.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// Writing the chapter file failed
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Fatal error aborting a whole batch before any task is dispatched.
#[derive(Error, Debug)]
pub enum BatchError {
    /// The listing page could not be fetched
    #[error("Failed to fetch listing page {url}: {source}")]
    Listing {
        url: String,
        #[source]
        source: FetchError,
    },
}

/// Error type for configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse config file
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// Missing required configuration value
    #[error("Missing required config value: {0}")]
    MissingValue(String),

    /// Invalid configuration value
    #[error("Invalid config value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Config directory not found
    #[error("Could not determine config directory")]
    NoConfigDir,
}
