//! RSS 2.0 / Atom envelope parsing.
//!
//! The feed's structure is shallow and stable, so items are located with
//! patterns rather than a full XML tree. Element text is XML-unescaped except
//! inside CDATA sections, which are passed through verbatim.

use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::entities::RawFeedItem;
use crate::feed::FeedError;

static ROOT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(?:rss|feed|rdf:RDF)\b").unwrap());

static ROOT_CLOSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</(?:rss|feed|rdf:RDF)\s*>").unwrap());

static RSS_ITEM_OPEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<item\b").unwrap());

static ATOM_ENTRY_OPEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<entry\b").unwrap());

static RSS_ITEM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<item\b[^>]*>(.*?)</item\s*>").unwrap());

static ATOM_ENTRY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<entry\b[^>]*>(.*?)</entry\s*>").unwrap());

static ATOM_LINK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<link\b([^>]*?)\bhref\s*=\s*["']([^"']+)["']([^>]*)>"#).unwrap()
});

static CDATA_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").unwrap());

static XML_ENTITY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|lt|gt|amp|quot|apos);").unwrap());

static TITLE: LazyLock<Regex> = LazyLock::new(|| element_regex("title"));
static LINK: LazyLock<Regex> = LazyLock::new(|| element_regex("link"));
static GUID: LazyLock<Regex> = LazyLock::new(|| element_regex("guid"));
static ID: LazyLock<Regex> = LazyLock::new(|| element_regex("id"));
static CONTENT_ENCODED: LazyLock<Regex> = LazyLock::new(|| element_regex("content:encoded"));
static CONTENT: LazyLock<Regex> = LazyLock::new(|| element_regex("content"));
static DESCRIPTION: LazyLock<Regex> = LazyLock::new(|| element_regex("description"));
static SUMMARY: LazyLock<Regex> = LazyLock::new(|| element_regex("summary"));

fn element_regex(name: &str) -> Regex {
    let name = regex::escape(name);
    Regex::new(&format!(r"(?is)<{name}(?:\s[^>]*)?>(.*?)</{name}\s*>")).unwrap()
}

/// Parses a feed document into its entries, in document order.
pub fn parse_feed(document: &str) -> Result<Vec<RawFeedItem>, FeedError> {
    if !ROOT_REGEX.is_match(document) {
        return Err(FeedError::Malformed(
            "no <rss>, <feed> or <rdf:RDF> root element".to_string(),
        ));
    }

    if !ROOT_CLOSE_REGEX.is_match(document) {
        return Err(FeedError::Malformed(
            "feed root element is never closed".to_string(),
        ));
    }

    let rss_items: Vec<RawFeedItem> = RSS_ITEM_REGEX
        .captures_iter(document)
        .map(|caps| parse_rss_item(&caps[1]))
        .collect();
    ensure_all_closed(document, &RSS_ITEM_OPEN_REGEX, rss_items.len(), "item")?;
    if !rss_items.is_empty() {
        return Ok(rss_items);
    }

    let atom_entries: Vec<RawFeedItem> = ATOM_ENTRY_REGEX
        .captures_iter(document)
        .map(|caps| parse_atom_entry(&caps[1]))
        .collect();
    ensure_all_closed(document, &ATOM_ENTRY_OPEN_REGEX, atom_entries.len(), "entry")?;
    Ok(atom_entries)
}

/// A truncated document leaves its last entry open and must not pass as a
/// shorter feed.
fn ensure_all_closed(
    document: &str,
    opening: &Regex,
    complete: usize,
    element: &str,
) -> Result<(), FeedError> {
    let opened = opening.find_iter(document).count();
    if opened != complete {
        return Err(FeedError::Malformed(format!(
            "{opened} <{element}> elements opened but {complete} closed"
        )));
    }
    Ok(())
}

fn parse_rss_item(block: &str) -> RawFeedItem {
    let content_html = element_text(block, &CONTENT_ENCODED)
        .filter(|c| !c.trim().is_empty())
        .or_else(|| element_text(block, &DESCRIPTION))
        .unwrap_or_default();

    RawFeedItem {
        title: element_text(block, &TITLE).unwrap_or_default(),
        content_html,
        link: element_text(block, &LINK).and_then(non_blank),
        guid: element_text(block, &GUID).and_then(non_blank),
    }
}

fn parse_atom_entry(block: &str) -> RawFeedItem {
    let content_html = element_text(block, &CONTENT)
        .filter(|c| !c.trim().is_empty())
        .or_else(|| element_text(block, &SUMMARY))
        .unwrap_or_default();

    RawFeedItem {
        title: element_text(block, &TITLE).unwrap_or_default(),
        content_html,
        link: atom_link(block),
        guid: element_text(block, &ID).and_then(non_blank),
    }
}

/// Prefers `rel="alternate"` (or no rel) over other link relations.
fn atom_link(block: &str) -> Option<String> {
    let mut fallback = None;
    for caps in ATOM_LINK_REGEX.captures_iter(block) {
        let attrs = format!("{} {}", &caps[1], &caps[3]).to_ascii_lowercase();
        let href = unescape_xml(&caps[2]);
        if !attrs.contains("rel=") || attrs.contains("alternate") {
            return Some(href);
        }
        fallback.get_or_insert(href);
    }
    fallback
}

fn element_text(block: &str, regex: &Regex) -> Option<String> {
    regex.captures(block).map(|caps| xml_text(&caps[1]))
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Unescapes text outside CDATA sections and keeps CDATA content verbatim.
fn xml_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last = 0;
    for caps in CDATA_REGEX.captures_iter(raw) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&unescape_xml(&raw[last..whole.start()]));
        out.push_str(&caps[1]);
        last = whole.end();
    }
    out.push_str(&unescape_xml(&raw[last..]));
    out
}

fn unescape_xml(text: &str) -> String {
    XML_ENTITY_REGEX
        .replace_all(text, |caps: &Captures<'_>| {
            let entity = &caps[1];
            match entity {
                "lt" => "<".to_string(),
                "gt" => ">".to_string(),
                "amp" => "&".to_string(),
                "quot" => "\"".to_string(),
                "apos" => "'".to_string(),
                _ => {
                    let code = if let Some(hex) = entity.strip_prefix("#x").or(entity.strip_prefix("#X")) {
                        u32::from_str_radix(hex, 16).ok()
                    } else {
                        entity[1..].parse().ok()
                    };
                    code.and_then(char::from_u32)
                        .map(String::from)
                        .unwrap_or_else(|| caps[0].to_string())
                }
            }
        })
        .into_owned()
}
