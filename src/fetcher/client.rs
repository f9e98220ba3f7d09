use crate::fetcher::{
    errors::{FetchError, is_retriable_status},
    pipeline::process_response,
    types::FeedResponse,
};
use once_cell::sync::Lazy;
use reqwest::{Client, ClientBuilder, header::HeaderValue};
use std::time::Duration;
use tracing::{debug, instrument};

const MAX_BODY_SIZE: u64 = 5 * 1024 * 1024; // 5MB
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 MacPicker/0.1";

/// Content types a syndication feed is served with in practice.
const ACCEPTED_CONTENT_TYPES: [&str; 6] = [
    "xml",
    "rss",
    "atom",
    "text/html",
    "text/plain",
    "application/octet-stream",
];

static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientBuilder::new()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(30))
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(10))
        .default_headers({
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert(
                reqwest::header::ACCEPT,
                HeaderValue::from_static(
                    "application/rss+xml,application/atom+xml,application/xml;q=0.9,text/xml;q=0.9,*/*;q=0.8",
                ),
            );
            headers
        })
        .build()
        .expect("Failed to build HTTP client")
});

pub fn get_client() -> &'static Client {
    &HTTP_CLIENT
}

#[instrument(skip_all, fields(url = %url))]
pub async fn fetch(url: &str) -> Result<FeedResponse, FetchError> {
    let parsed_url = url::Url::parse(url)?;

    let response = HTTP_CLIENT
        .get(parsed_url)
        .send()
        .await
        .map_err(FetchError::from_reqwest_error)?;

    // Check content length before downloading
    if let Some(content_length) = response.content_length()
        && content_length > MAX_BODY_SIZE
    {
        return Err(FetchError::BodyTooLarge(content_length));
    }

    let final_url = response.url().clone();
    let status = response.status();
    let headers = response.headers().clone();

    if !status.is_success() {
        return Err(FetchError::Http {
            status,
            retriable: is_retriable_status(status),
        });
    }

    let content_type = headers
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .unwrap_or("application/xml")
        .to_ascii_lowercase();

    if !ACCEPTED_CONTENT_TYPES
        .iter()
        .any(|accepted| content_type.contains(accepted))
    {
        return Err(FetchError::UnsupportedContentType(content_type));
    }

    let body_bytes = response
        .bytes()
        .await
        .map_err(|e| FetchError::Io(e.to_string()))?;

    // Check body size after download (in case Content-Length was missing)
    if body_bytes.len() as u64 > MAX_BODY_SIZE {
        return Err(FetchError::BodyTooLarge(body_bytes.len() as u64));
    }

    debug!(status = %status, bytes = body_bytes.len(), "feed downloaded");
    process_response(final_url, status, headers, body_bytes, &content_type)
}
