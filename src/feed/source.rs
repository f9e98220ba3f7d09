use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::entities::RawFeedItem;
use crate::feed::{FeedError, calculate_backoff_delay, parse_feed};
use crate::fetcher::fetch;

/// Where a sync run gets its feed entries from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Pull and parse the whole feed. Any error aborts the run.
    async fn fetch_items(&self) -> Result<Vec<RawFeedItem>, FeedError>;

    /// Human-readable origin, for logs.
    fn describe(&self) -> String;
}

/// Pulls the feed over HTTP, retrying transient failures with backoff.
#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    url: String,
    attempts: u32,
    backoff_base: Duration,
}

impl HttpFeedSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            attempts: 1,
            backoff_base: Duration::ZERO,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.feed_url()).with_retry(config.fetch_attempts(), config.backoff_base())
    }

    pub fn with_retry(mut self, attempts: u32, backoff_base: Duration) -> Self {
        self.attempts = attempts.max(1);
        self.backoff_base = backoff_base;
        self
    }

    async fn fetch_once(&self) -> Result<Vec<RawFeedItem>, FeedError> {
        let response = fetch(&self.url).await?;
        info!(
            "Fetched feed from {} (status: {}, charset: {:?}, size: {} bytes)",
            response.url_final,
            response.status,
            response.charset,
            response.body_raw.len()
        );
        non_empty(parse_feed(&response.body_utf8)?)
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch_items(&self) -> Result<Vec<RawFeedItem>, FeedError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once().await {
                Ok(items) => return Ok(items),
                Err(err) if err.should_retry() && attempt + 1 < self.attempts => {
                    let delay = calculate_backoff_delay(attempt, self.backoff_base);
                    warn!(
                        "Feed fetch failed (attempt {}/{}): {}; retrying in {}ms",
                        attempt + 1,
                        self.attempts,
                        err,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Reads a feed document saved on disk.
#[derive(Debug, Clone)]
pub struct FileFeedSource {
    path: PathBuf,
}

impl FileFeedSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FeedSource for FileFeedSource {
    async fn fetch_items(&self) -> Result<Vec<RawFeedItem>, FeedError> {
        let document = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| FeedError::Io {
                path: self.path.clone(),
                source,
            })?;
        non_empty(parse_feed(&document)?)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

fn non_empty(items: Vec<RawFeedItem>) -> Result<Vec<RawFeedItem>, FeedError> {
    if items.is_empty() {
        Err(FeedError::Empty)
    } else {
        Ok(items)
    }
}
