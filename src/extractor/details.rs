use regex::Regex;
use std::sync::LazyLock;

use crate::extractor::fields::is_model_id;
use crate::extractor::normalize::normalize_lines;

static IMG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<img[^>]*>").unwrap());

static ANCHOR_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</?a(?:\s[^>]*)?>").unwrap());

static BOILERPLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:[¥￥]|RMB\s?\d)|product page|apple store|refurb[\s-]?tracker").unwrap()
});

static MODEL_ID_LABEL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:型号|model|part(?:\s?number)?)\s?[:：]?\s?").unwrap());

/// Turns a content blob into the ordered spec lines shown to users.
///
/// Feed order is kept as-is; only price, store and bare part-number lines
/// are dropped.
pub fn build_details(html: &str) -> Vec<String> {
    if html.trim().is_empty() {
        return Vec::new();
    }

    let without_images = IMG_REGEX.replace_all(html, "");
    let unwrapped = ANCHOR_REGEX.replace_all(&without_images, "");

    normalize_lines(&unwrapped)
        .into_iter()
        .filter(|line| !is_boilerplate(line))
        .collect()
}

pub fn is_boilerplate(line: &str) -> bool {
    if BOILERPLATE_REGEX.is_match(line) {
        return true;
    }
    let unlabeled = MODEL_ID_LABEL_REGEX.replace(line, "");
    is_model_id(unlabeled.trim())
}
