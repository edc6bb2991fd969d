//! Page fetching.
//!
//! [`PageFetcher`] is the seam between the batch coordinator and the network:
//! the coordinator only ever sees parsed documents.

use crate::error::FetchError;
use async_trait::async_trait;
use scraper::Html;
use std::time::Duration;
use tracing::debug;

/// Fetches a URL and returns the parsed HTML document.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Issues one GET request. No retries.
    async fn fetch(&self, url: &str) -> Result<Html, FetchError>;
}

/// [`PageFetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher with the given user agent and timeout.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Html, FetchError> {
        let url = url::Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;

        debug!(%url, "GET");
        let response = self.client.get(url).send().await?.error_for_status()?;
        let text = response.text().await?;

        Ok(Html::parse_document(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_USER_AGENT;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(DEFAULT_USER_AGENT, Duration::from_millis(5000)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_sends_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/index.html"))
            .and(header("user-agent", DEFAULT_USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p id=\"x\">hi</p>"))
            .mount(&server)
            .await;

        let doc = fetcher()
            .fetch(&format!("{}/index.html", server.uri()))
            .await
            .unwrap();
        let selector = scraper::Selector::parse("#x").unwrap();
        assert_eq!(doc.select(&selector).count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_fails_on_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = fetcher().fetch(&format!("{}/busy", server.uri())).await;
        assert!(matches!(result, Err(FetchError::Request(_))));
    }

    #[tokio::test]
    async fn test_fetch_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(DEFAULT_USER_AGENT, Duration::from_millis(50)).unwrap();
        let result = fetcher.fetch(&format!("{}/slow", server.uri())).await;
        assert!(matches!(result, Err(FetchError::Request(_))));
    }

    #[tokio::test]
    async fn test_fetch_rejects_malformed_url() {
        let result = fetcher().fetch("not a url").await;
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }
}
