//! chapter-dl - downloads web novel chapters listed on an index page.
//!
//! This library provides:
//! - Fetching and parsing pages (`fetcher`, `extractor`)
//! - Downloading a single chapter to a text file (`task`)
//! - Running a clamped chapter range on a bounded, throttled worker pool (`batch`)

pub mod batch;
pub mod config;
pub mod console;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod logger;
pub mod task;
pub mod utils;

// Re-export commonly used types
pub use batch::{BatchDownloader, BatchOptions, BatchReport, ChapterRange};
pub use config::{Config, DuplicateTitles};
pub use console::Console;
pub use error::{BatchError, ConfigError, ExtractError, FetchError, TaskError};
pub use extractor::ChapterLink;
pub use fetcher::{HttpFetcher, PageFetcher};
pub use task::DownloadTask;
