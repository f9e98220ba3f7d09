//! Field extractors: one small rule per structured attribute.
//!
//! Every extractor works on normalized full text, holds no state and can run
//! in any order. Patterns are compiled once per process.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// A single extraction rule deriving one attribute from normalized text.
pub trait FieldExtractor: Send + Sync {
    type Output;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn extract(&self, text: &str) -> Option<Self::Output>;
}

/// Product lines sold through the feed, most specific first.
pub const MODEL_LINES: [&str; 6] = [
    "MacBook Pro",
    "MacBook Air",
    "Mac Studio",
    "Mac mini",
    "Mac Pro",
    "iMac",
];

/// Enumerated color names, tried before the generic `…色` fallback.
const COLOR_NAMES: [&str; 20] = [
    "深空黑色",
    "深空灰色",
    "午夜色",
    "星光色",
    "天蓝色",
    "银色",
    "蓝色",
    "绿色",
    "粉色",
    "紫色",
    "黄色",
    "橙色",
    "金色",
    "Space Black",
    "Space Gray",
    "Space Grey",
    "Midnight",
    "Starlight",
    "Sky Blue",
    "Silver",
];

static PRICE_SYMBOL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[¥￥]\s?(\d[\d,]*\.\d{2})").unwrap());

static PRICE_RMB_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)RMB\s?(\d[\d,]*\.\d{2})").unwrap());

static MODEL_LINE_REGEXES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    MODEL_LINES
        .iter()
        .map(|line| {
            let pattern = line
                .split(' ')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s?");
            (*line, Regex::new(&format!("(?i){pattern}")).unwrap())
        })
        .collect()
});

static CHIP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[^A-Za-z0-9])M([1-4])(?:\s?(Pro|Max|Ultra))?(?:[^A-Za-z0-9]|$)").unwrap()
});

static RAM_QUALIFIED_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s?GB\s?(?:统一内存|内存|RAM|unified memory|memory)").unwrap()
});

static SSD_QUALIFIED_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s?(GB|TB)\s?(?:固态硬盘|固态|SSD|存储|storage)").unwrap()
});

static BARE_CAPACITY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s?(GB|TB)").unwrap());

/// Text after a `Gb` amount that makes it a network rate, as in `10GbE`.
static NETWORK_RATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:E(?:[^A-Za-z]|$)|(?i:ps)|\s?(?i:以太网|Ethernet|千兆))").unwrap()
});

static MEMORY_QUALIFIER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s?(?:统一内存|内存|RAM|unified memory|memory)").unwrap());

static STORAGE_QUALIFIER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s?(?:固态硬盘|固态|SSD|存储|storage)").unwrap());

static CPU_CORES_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s?核\s?(?:中央处理器|处理器|CPU)|(\d+)[\s-]?core\s?CPU").unwrap()
});

static GPU_CORES_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s?核\s?(?:图形处理器|GPU)|(\d+)[\s-]?core\s?GPU").unwrap()
});

static SCREEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)(\d{1,2}(?:\.\d)?)\s?(?:英寸|inch|")"#).unwrap());

static COLOR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives = COLOR_NAMES
        .iter()
        .map(|c| regex::escape(c))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("(?i){alternatives}")).unwrap()
});

static GENERIC_COLOR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{Han}{1,4}色").unwrap());

/// Part numbers are uppercase and end in a single region letter.
static MODEL_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z0-9]{4,}/[A-Z])(?:[^A-Za-z]|$)").unwrap());

static TEN_GBE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)10\s?GbE|10\s?Gb(?:ps)?\s?(?:以太网|Ethernet)|10\s?Gigabit\s?Ethernet|10\s?千兆位?以太网",
    )
    .unwrap()
});

static XDR_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)XDR").unwrap());

fn first_number(caps: &Captures<'_>) -> Option<u32> {
    caps.iter()
        .skip(1)
        .flatten()
        .find_map(|m| m.as_str().parse().ok())
}

fn after_match<'t>(text: &'t str, caps: &Captures<'_>) -> &'t str {
    let end = caps.get(0).map_or(0, |m| m.end());
    &text[end..]
}

fn capacity_in_gb(amount: &str, unit: &str) -> Option<u32> {
    let amount: u32 = amount.parse().ok()?;
    if amount == 0 {
        return None;
    }
    if unit.eq_ignore_ascii_case("TB") {
        amount.checked_mul(1024)
    } else {
        Some(amount)
    }
}

/// Currency amount with exactly two decimals, `¥`/`￥` or `RMB` prefixed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PriceExtractor;

impl FieldExtractor for PriceExtractor {
    type Output = f64;

    fn name(&self) -> &'static str {
        "price"
    }

    fn extract(&self, text: &str) -> Option<f64> {
        let caps = PRICE_SYMBOL_REGEX
            .captures(text)
            .or_else(|| PRICE_RMB_REGEX.captures(text))?;
        let price: f64 = caps[1].replace(',', "").parse().ok()?;
        (price.is_finite() && price > 0.0).then_some(price)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ModelLineExtractor;

impl FieldExtractor for ModelLineExtractor {
    type Output = &'static str;

    fn name(&self) -> &'static str {
        "model_line"
    }

    /// Longest matching line name wins, ties go to the earliest position.
    fn extract(&self, text: &str) -> Option<&'static str> {
        MODEL_LINE_REGEXES
            .iter()
            .filter_map(|(line, regex)| regex.find(text).map(|m| (*line, m.start())))
            .min_by(|(a, a_pos), (b, b_pos)| b.len().cmp(&a.len()).then(a_pos.cmp(b_pos)))
            .map(|(line, _)| line)
    }
}

/// Chip generation plus optional tier, e.g. `M3 Pro`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chip {
    pub series: String,
    pub model: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChipExtractor;

impl FieldExtractor for ChipExtractor {
    type Output = Chip;

    fn name(&self) -> &'static str {
        "chip"
    }

    fn extract(&self, text: &str) -> Option<Chip> {
        let caps = CHIP_REGEX.captures(text)?;
        let series = format!("M{}", &caps[1]);
        let model = match caps.get(2) {
            Some(tier) => format!("{series} {}", capitalize(tier.as_str())),
            None => series.clone(),
        };
        Some(Chip { series, model })
    }
}

fn capitalize(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Memory in GB. Prefers an amount qualified as memory, then the first bare
/// GB amount that is not qualified as storage.
#[derive(Debug, Clone, Copy, Default)]
pub struct RamExtractor;

impl FieldExtractor for RamExtractor {
    type Output = u32;

    fn name(&self) -> &'static str {
        "ram"
    }

    fn extract(&self, text: &str) -> Option<u32> {
        if let Some(caps) = RAM_QUALIFIED_REGEX.captures(text) {
            return caps[1].parse().ok().filter(|gb| *gb > 0);
        }

        BARE_CAPACITY_REGEX
            .captures_iter(text)
            .filter(|caps| caps[2].eq_ignore_ascii_case("GB"))
            .filter(|caps| {
                let rest = after_match(text, caps);
                !STORAGE_QUALIFIER_REGEX.is_match(rest) && !NETWORK_RATE_REGEX.is_match(rest)
            })
            .find_map(|caps| caps[1].parse().ok().filter(|gb: &u32| *gb > 0))
    }
}

/// Storage normalized to GB. Prefers an amount qualified as storage, then the
/// largest bare GB/TB amount that is not qualified as memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct SsdExtractor;

impl FieldExtractor for SsdExtractor {
    type Output = u32;

    fn name(&self) -> &'static str {
        "ssd_gb"
    }

    fn extract(&self, text: &str) -> Option<u32> {
        if let Some(caps) = SSD_QUALIFIED_REGEX.captures(text) {
            return capacity_in_gb(&caps[1], &caps[2]);
        }

        BARE_CAPACITY_REGEX
            .captures_iter(text)
            .filter(|caps| {
                let rest = after_match(text, caps);
                !MEMORY_QUALIFIER_REGEX.is_match(rest) && !NETWORK_RATE_REGEX.is_match(rest)
            })
            .filter_map(|caps| capacity_in_gb(&caps[1], &caps[2]))
            .max()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreKind {
    Cpu,
    Gpu,
}

#[derive(Debug, Clone, Copy)]
pub struct CoresExtractor {
    kind: CoreKind,
}

impl CoresExtractor {
    pub const CPU: Self = Self {
        kind: CoreKind::Cpu,
    };
    pub const GPU: Self = Self {
        kind: CoreKind::Gpu,
    };
}

impl FieldExtractor for CoresExtractor {
    type Output = u32;

    fn name(&self) -> &'static str {
        match self.kind {
            CoreKind::Cpu => "cpu_cores",
            CoreKind::Gpu => "gpu_cores",
        }
    }

    fn extract(&self, text: &str) -> Option<u32> {
        let regex = match self.kind {
            CoreKind::Cpu => &*CPU_CORES_REGEX,
            CoreKind::Gpu => &*GPU_CORES_REGEX,
        };
        regex
            .captures(text)
            .and_then(|caps| first_number(&caps))
            .filter(|cores| *cores > 0)
    }
}

/// Diagonal in inches, one decimal place.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScreenExtractor;

impl FieldExtractor for ScreenExtractor {
    type Output = f64;

    fn name(&self) -> &'static str {
        "screen_in"
    }

    fn extract(&self, text: &str) -> Option<f64> {
        let caps = SCREEN_REGEX.captures(text)?;
        let inches: f64 = caps[1].parse().ok()?;
        (inches > 0.0).then(|| (inches * 10.0).round() / 10.0)
    }
}

/// Enumerated color names first, generic `<word>色` as a fallback.
///
/// The fallback can misfire on unrelated Chinese text ending in 色.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorExtractor;

impl FieldExtractor for ColorExtractor {
    type Output = String;

    fn name(&self) -> &'static str {
        "color"
    }

    fn extract(&self, text: &str) -> Option<String> {
        COLOR_REGEX
            .find(text)
            .or_else(|| GENERIC_COLOR_REGEX.find(text))
            .map(|m| m.as_str().to_string())
    }
}

/// Vendor part number such as `MU9D3CH/A`, matched in uppercase only.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelIdExtractor;

impl FieldExtractor for ModelIdExtractor {
    type Output = String;

    fn name(&self) -> &'static str {
        "model_id"
    }

    fn extract(&self, text: &str) -> Option<String> {
        MODEL_ID_REGEX
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

pub fn is_model_id(text: &str) -> bool {
    MODEL_ID_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .is_some_and(|m| m.start() == 0 && m.end() == text.len())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    TenGigabitEthernet,
    Xdr,
}

/// Presence test for a marketing phrase, including its common spellings.
#[derive(Debug, Clone, Copy)]
pub struct FlagExtractor {
    capability: Capability,
}

impl FlagExtractor {
    pub const TEN_GBE: Self = Self {
        capability: Capability::TenGigabitEthernet,
    };
    pub const XDR: Self = Self {
        capability: Capability::Xdr,
    };

    pub fn is_present(&self, text: &str) -> bool {
        self.extract(text).unwrap_or(false)
    }
}

impl FieldExtractor for FlagExtractor {
    type Output = bool;

    fn name(&self) -> &'static str {
        match self.capability {
            Capability::TenGigabitEthernet => "has10GbE",
            Capability::Xdr => "hasXDR",
        }
    }

    fn extract(&self, text: &str) -> Option<bool> {
        let regex = match self.capability {
            Capability::TenGigabitEthernet => &*TEN_GBE_REGEX,
            Capability::Xdr => &*XDR_REGEX,
        };
        Some(regex.is_match(text))
    }
}
