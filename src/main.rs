//! chapter-dl CLI - downloads a range of web novel chapters to text files.

use anyhow::{Context, Result};
use chapter_dl::batch::{BatchDownloader, BatchOptions};
use chapter_dl::config::{Config, DuplicateTitles};
use chapter_dl::console::Console;
use chapter_dl::fetcher::HttpFetcher;
use chapter_dl::logger;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

/// Downloads web novel chapters from a listing page into text files.
#[derive(Parser, Debug)]
#[command(name = "chapter-dl")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// URL of the page listing every chapter (overrides the config file).
    listing_url: Option<String>,

    /// Config file to use instead of the default location.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory to write chapter files to.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Origin that relative chapter links are resolved against.
    #[arg(long)]
    origin: Option<String>,

    /// First chapter to download (1-based). Values below 1 are raised to 1.
    #[arg(long, allow_hyphen_values = true)]
    start: Option<i64>,

    /// Last chapter to download (1-based, inclusive). Values past the end are lowered.
    #[arg(long, allow_hyphen_values = true)]
    end: Option<i64>,

    /// Cooldown each worker observes after a chapter, in milliseconds.
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Worker pool size.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    workers: Option<u64>,

    /// Request timeout in milliseconds.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_ms: Option<u64>,

    /// Write `Title (N).txt` instead of overwriting when chapter titles repeat.
    #[arg(long)]
    append_index: bool,

    /// Print the chapter list and exit without downloading.
    #[arg(long)]
    list: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Applies command-line overrides on top of the loaded configuration.
    fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.listing_url {
            config.source.listing_url = url.clone();
        }
        if let Some(origin) = &self.origin {
            config.source.server_origin = Some(origin.clone());
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.source.timeout_ms = timeout_ms;
        }
        if let Some(output) = &self.output {
            config.download.output_directory = output.clone();
        }
        if let Some(start) = self.start {
            config.download.start = start;
        }
        if let Some(end) = self.end {
            config.download.end = Some(end);
        }
        if let Some(delay_ms) = self.delay_ms {
            config.download.delay_ms = delay_ms;
        }
        if let Some(workers) = self.workers {
            config.download.workers = Some(workers as usize);
        }
        if self.append_index {
            config.download.duplicate_titles = DuplicateTitles::AppendIndex;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logger::init(if args.verbose { "debug" } else { "info" });
    let console = Console::new();

    console.section("chapter-dl");

    console.step("Loading configuration...");
    let mut config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    let options = BatchOptions::from_config(&config).context("Invalid configuration")?;
    let fetcher = HttpFetcher::new(&config.source.user_agent, config.timeout())
        .context("Failed to create HTTP client")?;
    let downloader = BatchDownloader::new(Arc::new(fetcher), options);
    console.success("Configuration loaded");

    if args.list {
        console.step("Fetching chapter list...");
        let links = downloader
            .fetch_listing()
            .await
            .context("Failed to fetch chapter list")?;
        console.success(&format!("Found {} chapters", links.len()));
        console.chapter_list(&links);
        return Ok(());
    }

    let options = downloader.options();
    console.info(&format!("Listing: {}", options.listing_url));
    console.step(&format!(
        "Downloading into {} ({} workers, {} ms cooldown)...",
        options.output_dir.display(),
        options.workers,
        options.delay.as_millis()
    ));

    let report = downloader
        .run_until(interrupted())
        .await
        .context("Download aborted")?;

    if report.dispatched == 0 {
        console.warning(&format!(
            "No chapters in the requested range ({} listed)",
            report.listed
        ));
    }
    console.report(&report);

    console.section("Done!");
    Ok(())
}

/// Resolves on Ctrl-C. Never resolves if the handler can't be installed.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("cannot listen for Ctrl-C: {}", e);
        futures::future::pending::<()>().await;
    }
}
