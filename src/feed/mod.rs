pub mod backoff;
pub mod envelope;
pub mod source;

pub use backoff::calculate_backoff_delay;
pub use envelope::parse_feed;
pub use source::{FeedSource, FileFeedSource, HttpFeedSource};

use std::path::PathBuf;
use thiserror::Error;

use crate::fetcher::FetchError;

/// Failures that abort a whole sync run.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to read feed file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed feed: {0}")]
    Malformed(String),

    #[error("feed contains no items")]
    Empty,
}

impl FeedError {
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Fetch(err) => err.should_retry(),
            Self::Io { .. } | Self::Malformed(_) | Self::Empty => false,
        }
    }
}
