use crate::fetcher::{
    errors::FetchError,
    types::{Charset, FeedResponse},
};
use bytes::Bytes;
use chrono::Utc;
use encoding_rs::Encoding;
use regex::Regex;
use reqwest::{StatusCode, header::HeaderMap};
use std::sync::LazyLock;
use url::Url;

static CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).unwrap());

static XML_DECLARATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^\s*<\?xml\s[^>]*?encoding\s*=\s*["']([^"']+)["']"#).unwrap()
});

pub fn process_response(
    url_final: Url,
    status: StatusCode,
    headers: HeaderMap,
    body_bytes: Bytes,
    content_type: &str,
) -> Result<FeedResponse, FetchError> {
    let charset = detect_charset(content_type, &body_bytes);
    let body_utf8 = decode_to_utf8(&body_bytes, &charset)?;

    Ok(FeedResponse {
        url_final,
        status,
        headers,
        body_raw: body_bytes,
        body_utf8,
        charset,
        fetched_at: Utc::now(),
    })
}

pub fn detect_charset(content_type: &str, body_bytes: &[u8]) -> Charset {
    // 1. Byte order mark wins over any declaration
    if let Some((encoding, _)) = Encoding::for_bom(body_bytes) {
        return Charset::from_encoding(encoding);
    }

    // 2. Content-Type header
    if let Some(encoding) = CHARSET_REGEX
        .captures(content_type)
        .and_then(|caps| Encoding::for_label(caps[1].trim().as_bytes()))
    {
        return Charset::from_encoding(encoding);
    }

    // 3. <?xml version="1.0" encoding="..."?> in the first 1KB
    let search_bytes = &body_bytes[..body_bytes.len().min(1024)];
    let search_str = String::from_utf8_lossy(search_bytes);
    if let Some(encoding) = XML_DECLARATION_REGEX
        .captures(&search_str)
        .and_then(|caps| Encoding::for_label(caps[1].trim().as_bytes()))
    {
        return Charset::from_encoding(encoding);
    }

    // 4. Plain UTF-8 is by far the common case for feeds
    if std::str::from_utf8(body_bytes).is_ok() {
        return Charset::Utf8;
    }

    // 5. Heuristic detection
    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(&body_bytes[..body_bytes.len().min(16 * 1024)], false);
    Charset::from_encoding(detector.guess(None, true))
}

fn decode_to_utf8(body_bytes: &[u8], charset: &Charset) -> Result<String, FetchError> {
    let encoding = charset.encoding();
    let (decoded, used, had_errors) = encoding.decode(body_bytes);

    if had_errors {
        return Err(FetchError::Charset(format!(
            "failed to decode feed with encoding: {}",
            used.name()
        )));
    }

    Ok(decoded.into_owned())
}
