//! Batch coordination: fetch the listing, clamp the requested range and run
//! one [`DownloadTask`] per chapter on a fixed-size worker pool.
//!
//! Each task holds a pool slot for its download and for the cooldown that
//! follows it, so the cooldown throttles every slot independently of whether
//! the download succeeded. Per-chapter failures are logged and counted; only
//! an unreachable listing page fails the batch.

use crate::config::{Config, DuplicateTitles};
use crate::error::{BatchError, ConfigError};
use crate::extractor::{self, ChapterLink};
use crate::fetcher::PageFetcher;
use crate::task::DownloadTask;
use crate::utils;
use std::collections::HashMap;
use std::future::Future;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// A 1-based inclusive chapter range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterRange {
    pub start: usize,
    pub end: usize,
}

impl ChapterRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Fits the range into `1..=len`. Never fails; the result may be empty.
    pub fn clamp(self, len: usize) -> Self {
        Self {
            start: self.start.max(1),
            end: self.end.min(len),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Number of chapters in the range.
    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.end - self.start + 1
        }
    }

    /// Chapter numbers in the range, in order.
    pub fn numbers(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }
}

/// Settings for one batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Page listing every chapter.
    pub listing_url: Url,

    /// Origin relative chapter links are resolved against.
    pub server_origin: Url,

    /// Directory chapter files are written to.
    pub output_dir: PathBuf,

    /// Requested range, clamped once the listing is known.
    pub range: ChapterRange,

    /// Worker pool size.
    pub workers: usize,

    /// Cooldown after every task.
    pub delay: Duration,

    pub duplicate_titles: DuplicateTitles,
}

impl BatchOptions {
    /// Builds batch options from a validated configuration.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            listing_url: config.listing_url()?,
            server_origin: config.server_origin()?,
            output_dir: config.download.output_directory.clone(),
            range: config.download.range(),
            workers: config.download.worker_count().max(1),
            delay: config.download.delay(),
            duplicate_titles: config.download.duplicate_titles,
        })
    }
}

/// How a single task ended.
#[derive(Debug)]
enum Outcome {
    Succeeded,
    Failed(String),
}

/// Summary of a finished batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Number of chapters on the listing page.
    pub listed: usize,

    /// The range after clamping.
    pub range: Option<ChapterRange>,

    /// Number of chapters in the clamped range, started or not.
    pub dispatched: usize,

    /// Tasks that wrote their file.
    pub succeeded: usize,

    /// Titles of tasks that failed, in completion order.
    pub failed: Vec<String>,

    /// Tasks that never ran because the batch was interrupted.
    pub cancelled: usize,
}

impl BatchReport {
    /// Number of tasks that signalled completion, whatever the outcome.
    pub fn completed(&self) -> usize {
        self.succeeded + self.failed.len() + self.cancelled
    }

    /// Returns true if every dispatched task wrote its file.
    pub fn is_success(&self) -> bool {
        self.succeeded == self.dispatched
    }

    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Succeeded => self.succeeded += 1,
            Outcome::Failed(title) => self.failed.push(title),
        }
    }
}

/// Runs chapter downloads against a listing page.
pub struct BatchDownloader {
    fetcher: Arc<dyn PageFetcher>,
    options: BatchOptions,
}

impl BatchDownloader {
    pub fn new(fetcher: Arc<dyn PageFetcher>, options: BatchOptions) -> Self {
        Self { fetcher, options }
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Fetches the listing page and extracts its chapter links.
    pub async fn fetch_listing(&self) -> Result<Vec<ChapterLink>, BatchError> {
        let url = self.options.listing_url.as_str();
        let doc = self
            .fetcher
            .fetch(url)
            .await
            .map_err(|source| BatchError::Listing {
                url: url.to_string(),
                source,
            })?;

        Ok(extractor::extract_links(&doc))
    }

    /// Builds the tasks for the clamped range, in document order.
    pub fn plan(&self, links: &[ChapterLink]) -> Vec<DownloadTask> {
        let range = self.options.range.clamp(links.len());
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut tasks = Vec::with_capacity(range.len());

        for number in range.numbers() {
            let link = &links[number - 1];
            let mut stem = utils::file_stem(&link.title);

            if let Some(first) = seen.get(&stem) {
                match self.options.duplicate_titles {
                    DuplicateTitles::Overwrite => warn!(
                        "chapters {} and {} share the title \"{}\"; {}.txt will hold whichever finishes last",
                        first, number, link.title, stem
                    ),
                    DuplicateTitles::AppendIndex => stem = format!("{stem} ({number})"),
                }
            } else {
                seen.insert(stem.clone(), number);
            }

            let url = match utils::resolve_url(&self.options.server_origin, &link.href) {
                Ok(url) => url.to_string(),
                Err(e) => {
                    debug!("keeping unresolvable link as-is: {}", e);
                    link.href.clone()
                }
            };

            tasks.push(DownloadTask {
                number,
                title: link.title.clone(),
                url,
                destination: self.options.output_dir.join(format!("{stem}.txt")),
            });
        }

        tasks
    }

    /// Runs the batch to completion.
    pub async fn run(&self) -> Result<BatchReport, BatchError> {
        self.run_until(futures::future::pending()).await
    }

    /// Runs the batch, stopping early once `shutdown` resolves.
    ///
    /// Chapters start in document order. After `shutdown` no further chapter
    /// is started: the rest are counted as cancelled and in-flight chapters
    /// finish, cooldown included, before this returns.
    #[instrument(skip_all, fields(listing = %self.options.listing_url))]
    pub async fn run_until<S>(&self, shutdown: S) -> Result<BatchReport, BatchError>
    where
        S: Future<Output = ()>,
    {
        let links = self.fetch_listing().await?;
        if links.is_empty() {
            warn!("no chapters found on listing page");
        }

        if let Err(e) = tokio::fs::create_dir_all(&self.options.output_dir).await {
            warn!(
                "could not create output directory {}: {}",
                self.options.output_dir.display(),
                e
            );
        }

        let range = self.options.range.clamp(links.len());
        let tasks = self.plan(&links);
        let mut report = BatchReport {
            listed: links.len(),
            range: Some(range),
            dispatched: tasks.len(),
            ..BatchReport::default()
        };

        if tasks.is_empty() {
            info!(
                "nothing to download: range {}..={} is empty for {} chapters",
                range.start,
                range.end,
                links.len()
            );
            return Ok(report);
        }

        info!(
            "downloading chapters {}..={} of {} with {} workers",
            range.start,
            range.end,
            links.len(),
            self.options.workers
        );

        let pool = Arc::new(Semaphore::new(self.options.workers));
        let mut running = JoinSet::new();
        let mut titles: HashMap<tokio::task::Id, String> = HashMap::new();
        let mut shutdown = std::pin::pin!(shutdown);
        let mut queue = tasks.into_iter();

        // Slots are taken here, one chapter at a time, so chapters start in
        // document order no matter how the runtime schedules spawned tasks.
        while let Some(task) = queue.next() {
            let slot = tokio::select! {
                biased;
                () = &mut shutdown => None,
                slot = Arc::clone(&pool).acquire_owned() => slot.ok(),
            };
            let Some(slot) = slot else {
                report.cancelled += 1 + queue.len();
                warn!(
                    "interrupted; {} chapters not started, waiting for in-flight chapters to finish",
                    report.cancelled
                );
                break;
            };

            let fetcher = Arc::clone(&self.fetcher);
            let delay = self.options.delay;
            let title = task.title.clone();

            let handle = running.spawn(async move {
                let _slot = slot;

                let outcome = match task.run(fetcher.as_ref()).await {
                    Ok(()) => Outcome::Succeeded,
                    Err(e) => {
                        warn!(
                            "failed to download \"{}\" from \"{}\" to \"{}\": {}",
                            task.title,
                            task.url,
                            task.destination.display(),
                            e
                        );
                        Outcome::Failed(task.title)
                    }
                };

                tokio::time::sleep(delay).await;
                outcome
            });
            titles.insert(handle.id(), title);
        }

        while let Some(joined) = running.join_next_with_id().await {
            match joined {
                Ok((_, outcome)) => report.record(outcome),
                Err(e) => {
                    let title = titles.remove(&e.id()).unwrap_or_default();
                    warn!("download of \"{}\" ended abnormally: {}", title, e);
                    report.failed.push(title);
                }
            }
        }

        pool.close();
        debug_assert_eq!(report.completed(), report.dispatched);

        info!(
            "finished: {} succeeded, {} failed, {} cancelled",
            report.succeeded,
            report.failed.len(),
            report.cancelled
        );
        Ok(report)
    }
}
