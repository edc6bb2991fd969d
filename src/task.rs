//! A single chapter download.

use crate::error::TaskError;
use crate::extractor;
use crate::fetcher::PageFetcher;
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, instrument};

/// Everything needed to download one chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    /// Chapter number on the listing page (1-based).
    pub number: usize,

    /// Chapter title.
    pub title: String,

    /// Absolute chapter URL.
    pub url: String,

    /// File the chapter body is written to.
    pub destination: PathBuf,
}

impl DownloadTask {
    /// Fetches the chapter, extracts its body and writes it to `destination`.
    ///
    /// Nothing is written unless both fetch and extraction succeed. An existing
    /// file at `destination` is overwritten.
    #[instrument(skip_all, fields(chapter = self.number))]
    pub async fn run(&self, fetcher: &dyn PageFetcher) -> Result<(), TaskError> {
        info!(
            "downloading \"{}\" from \"{}\" to \"{}\"",
            self.title,
            self.url,
            self.destination.display()
        );

        let content = {
            let doc = fetcher.fetch(&self.url).await?;
            extractor::extract_content(&doc)?
        };

        fs::write(&self.destination, content)
            .await
            .map_err(|source| TaskError::Write {
                path: self.destination.clone(),
                source,
            })?;

        info!("saved \"{}\"", self.title);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExtractError, FetchError};
    use async_trait::async_trait;
    use scraper::Html;
    use tempfile::TempDir;

    struct StaticFetcher(Option<&'static str>);

    #[async_trait]
    impl PageFetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<Html, FetchError> {
            match self.0 {
                Some(body) => Ok(Html::parse_document(body)),
                None => Err(FetchError::InvalidUrl(url.to_string())),
            }
        }
    }

    fn task(dir: &TempDir) -> DownloadTask {
        DownloadTask {
            number: 1,
            title: "Chapter 1".to_string(),
            url: "http://m.example.com/read/1.html".to_string(),
            destination: dir.path().join("Chapter 1.txt"),
        }
    }

    #[tokio::test]
    async fn test_run_writes_cleaned_content() {
        let dir = TempDir::new().unwrap();
        let fetcher = StaticFetcher(Some(
            "<div id=\"content\">Hello<br/>&nbsp;world</div>",
        ));

        task(&dir).run(&fetcher).await.unwrap();

        let written = std::fs::read_to_string(dir.path().join("Chapter 1.txt")).unwrap();
        assert_eq!(written, "Hello world");
    }

    #[tokio::test]
    async fn test_run_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Chapter 1.txt"), "stale contents").unwrap();
        let fetcher = StaticFetcher(Some("<div id=\"content\">fresh</div>"));

        task(&dir).run(&fetcher).await.unwrap();

        let written = std::fs::read_to_string(dir.path().join("Chapter 1.txt")).unwrap();
        assert_eq!(written, "fresh");
    }

    #[tokio::test]
    async fn test_fetch_failure_writes_nothing() {
        let dir = TempDir::new().unwrap();

        let result = task(&dir).run(&StaticFetcher(None)).await;

        assert!(matches!(result, Err(TaskError::Fetch(_))));
        assert!(!dir.path().join("Chapter 1.txt").exists());
    }

    #[tokio::test]
    async fn test_missing_content_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let fetcher = StaticFetcher(Some("<div id=\"other\">nope</div>"));

        let result = task(&dir).run(&fetcher).await;

        assert!(matches!(
            result,
            Err(TaskError::Extract(ExtractError::ElementNotFound(_)))
        ));
        assert!(!dir.path().join("Chapter 1.txt").exists());
    }

    #[tokio::test]
    async fn test_write_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let mut task = task(&dir);
        task.destination = dir.path().join("missing").join("Chapter 1.txt");
        let fetcher = StaticFetcher(Some("<div id=\"content\">text</div>"));

        let result = task.run(&fetcher).await;
        assert!(matches!(result, Err(TaskError::Write { .. })));
    }
}
