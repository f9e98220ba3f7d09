pub mod details;
pub mod fields;
pub mod normalize;

#[cfg(test)]
mod tests;

pub use details::build_details;
pub use fields::FieldExtractor;
pub use normalize::{normalize_lines, normalize_text};

use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

use crate::entities::{ProductRecord, RawFeedItem, Specs};
use fields::{
    ChipExtractor, ColorExtractor, CoresExtractor, FlagExtractor, ModelIdExtractor,
    ModelLineExtractor, PriceExtractor, RamExtractor, ScreenExtractor, SsdExtractor,
};

static IMG_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img[src]").unwrap());

/// Why a feed item did not make it into the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingPrice,
    InvalidLink,
}

/// Builds a catalog record from one feed item.
///
/// Items without a positive price or a usable link are dropped; that is
/// routine for this feed and never an error.
pub fn assemble(item: &RawFeedItem) -> Option<ProductRecord> {
    match try_assemble(item) {
        Ok(record) => Some(record),
        Err(reason) => {
            debug!(title = %item.title, ?reason, "dropping feed item");
            None
        }
    }
}

pub fn try_assemble(item: &RawFeedItem) -> Result<ProductRecord, Rejection> {
    // 1. Normalize title and content into one searchable line
    let title = normalize_text(&item.title);
    let content_text = normalize_text(&item.content_html);
    let full_text = format!("{title} {content_text}");

    // 2. Mandatory fields
    let price_num = PriceExtractor
        .extract(&full_text)
        .ok_or(Rejection::MissingPrice)?;
    let link = item
        .link
        .as_deref()
        .map(str::trim)
        .and_then(|raw| Url::parse(raw).ok())
        .ok_or(Rejection::InvalidLink)?;

    // 3. Optional fields
    let chip = ChipExtractor.extract(&full_text);
    let model_line = ModelLineExtractor.extract(&full_text);
    let specs = Specs {
        ram: RamExtractor.extract(&full_text),
        ssd_gb: SsdExtractor.extract(&full_text),
        cpu_cores: CoresExtractor::CPU.extract(&full_text),
        gpu_cores: CoresExtractor::GPU.extract(&full_text),
        chip_series: chip.as_ref().map(|c| c.series.clone()),
        chip_model: chip.as_ref().map(|c| c.model.clone()),
        screen_in: ScreenExtractor.extract(&full_text),
        has_10gbe: FlagExtractor::TEN_GBE.is_present(&full_text),
        has_xdr: FlagExtractor::XDR.is_present(&full_text),
    };

    let display_title = match (model_line, &chip) {
        (Some(line), Some(chip)) => format!("{line} - {}", chip.model),
        _ => title.clone(),
    };

    let color = ColorExtractor
        .extract(&title)
        .or_else(|| ColorExtractor.extract(&content_text));

    Ok(ProductRecord {
        id: record_id(item, &link),
        display_title,
        price_num,
        model_id: ModelIdExtractor.extract(&full_text),
        color,
        image: extract_image(&item.content_html),
        details: build_details(&item.content_html),
        specs,
        link,
    })
}

/// Feed guid when present, otherwise a digest of link and title.
fn record_id(item: &RawFeedItem, link: &Url) -> String {
    match item.guid.as_deref().map(str::trim) {
        Some(guid) if !guid.is_empty() => guid.to_string(),
        _ => format!("{:x}", md5::compute(format!("{}|{}", link, item.title.trim()))),
    }
}

/// First `<img src>` in the content, if any.
pub fn extract_image(html: &str) -> Option<String> {
    if !html.contains("<img") && !html.contains("<IMG") {
        return None;
    }
    let fragment = Html::parse_fragment(html);
    fragment
        .select(&IMG_SELECTOR)
        .filter_map(|img| img.value().attr("src"))
        .map(str::trim)
        .find(|src| !src.is_empty())
        .map(str::to_string)
}
