use regex::Regex;
use std::sync::LazyLock;

static CDATA_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").unwrap());

static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

static LINE_BREAK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>|</?li\b[^>]*>|</p\s*>|</div\s*>").unwrap());

static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Strips markup from an HTML/text blob and collapses it to one line of
/// plain text.
///
/// Best effort only: malformed markup degrades to raw text, nothing fails.
/// Applying it to its own output is a no-op.
pub fn normalize_text(raw: &str) -> String {
    let unwrapped = unwrap_cdata(raw);
    let stripped = TAG_REGEX.replace_all(&unwrapped, " ");
    collapse_whitespace(&decode_entities(&stripped))
}

/// Line-preserving variant: `<br>`, `<li>` and block closers become line
/// breaks, each resulting line is normalized and blank lines are dropped.
pub fn normalize_lines(raw: &str) -> Vec<String> {
    let unwrapped = unwrap_cdata(raw);
    let with_breaks = LINE_BREAK_REGEX.replace_all(&unwrapped, "\n");

    with_breaks
        .split('\n')
        .map(normalize_text)
        .filter(|line| !line.is_empty())
        .collect()
}

fn unwrap_cdata(raw: &str) -> String {
    CDATA_REGEX.replace_all(raw, "$1").into_owned()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&ndash;", "–")
        .replace("&mdash;", "—")
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_REGEX.replace_all(text, " ").trim().to_string()
}
