//! Title feature extractor
//!
//! Pure functions mapping a marketplace product title to text fragments:
//! brand, model snippet, CPU descriptor, RAM text, storage text and GPU
//! descriptor.
//!
//! # Rule ordering
//! Every extractor is an ordered list of rules evaluated top to bottom, first
//! match wins. The order is load-bearing: a title mentioning both "Omen" and
//! "Lenovo" is an HP, a title with both "1TB" and "512GB" has 1 TB storage.
//!
//! # Totality
//! Every function returns a value for every input. Unresolved fragments come
//! back as [`UNRESOLVED`], an unknown brand as [`OTHER_BRAND`], an
//! unrecognised GPU as [`INTEGRATED_GPU`].

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use super::{OTHER_BRAND, UNRESOLVED};

/// Maximum length (in characters) of an extracted model snippet
pub const MODEL_MAX_CHARS: usize = 50;

/// RAM sizes that occur in real laptops; any other number is a false positive
pub const PLAUSIBLE_RAM_GB: [u32; 10] = [4, 8, 12, 16, 24, 32, 48, 64, 96, 128];

/// GPU descriptor used when the title names no discrete or branded GPU
pub const INTEGRATED_GPU: &str = "Integrated";

/// Brand keyword table, in priority order
///
/// Keywords are matched as substrings of the lower-cased title. A trailing
/// space makes a keyword match only at the end of a word ("rog " must not fire
/// inside "progress").
const BRAND_RULES: &[(&str, &[&str])] = &[
    ("HP", &["hp ", "hp-", "elitebook", "probook", "pavilion", "omen", "envy"]),
    ("Dell", &["dell "]),
    ("Acer", &["acer "]),
    ("Lenovo", &["lenovo ", "thinkpad", "ideapad", "thinkbook", "legion"]),
    ("Asus", &["asus ", "vivobook", "zenbook", "rog ", "tuf "]),
    ("Apple", &["macbook", "apple "]),
    ("MSI", &["msi "]),
    ("Samsung", &["samsung ", "galaxy book"]),
    ("Toshiba", &["toshiba ", "dynabook"]),
    ("Huawei", &["huawei ", "matebook"]),
    ("Casper", &["casper ", "nirvana", "excalibur"]),
    ("Monster", &["monster "]),
    ("Microsoft", &["surface"]),
];

/// Text fragments extracted from one title
///
/// Every field is always populated; see the module docs for the sentinels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFeatures {
    pub brand: String,
    pub model: String,
    pub cpu: String,
    pub ram_text: String,
    pub storage_text: String,
    pub gpu: String,
}

/// A regex paired with the formatter that turns its captures into a fragment
struct PatternRule {
    pattern: Regex,
    format: fn(&Captures<'_>) -> String,
}

impl PatternRule {
    fn new(pattern: &str, format: fn(&Captures<'_>) -> String) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("built-in extractor pattern must compile"),
            format,
        }
    }
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in extractor pattern must compile")
}

/// Evaluate `rules` in order and format the first match
fn first_match(rules: &[PatternRule], text: &str) -> Option<String> {
    rules
        .iter()
        .find_map(|rule| rule.pattern.captures(text).map(|caps| (rule.format)(&caps)))
}

/// "4060 ti" → "4060Ti"
fn compact_gpu_model(raw: &str) -> String {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let lower = compact.to_ascii_lowercase();
    match lower.strip_suffix("ti") {
        Some(number) => format!("{number}Ti"),
        None => compact,
    }
}

static CPU_RULES: Lazy<Vec<PatternRule>> = Lazy::new(|| {
    vec![
        PatternRule::new(r"(?i)(M\d+)(?:\s+(Pro|Max|Ultra))?", |c| {
            format!("Apple {}", c[1].to_uppercase())
        }),
        PatternRule::new(r"(?i)Ultra\s*(\d+)", |c| format!("Intel Core Ultra {}", &c[1])),
        PatternRule::new(r"(?i)Core\s*(5|7|9)\s*(\d{3})", |c| {
            format!("Intel Core {} {}", &c[1], &c[2])
        }),
        PatternRule::new(r"(?i)(i[3579])[\-\s]?(\d{4,5})", |c| {
            format!("Intel Core {}-{}", c[1].to_lowercase(), &c[2])
        }),
        PatternRule::new(r"(?i)Ryzen\s*(\d+)", |c| format!("AMD Ryzen {}", &c[1])),
    ]
});

static GPU_RULES: Lazy<Vec<PatternRule>> = Lazy::new(|| {
    vec![
        PatternRule::new(r"(?i)RTX\s*(5\d{3}(?:\s*Ti)?)", |c| {
            format!("NVIDIA RTX{}", compact_gpu_model(&c[1]))
        }),
        PatternRule::new(r"(?i)RTX\s*(4\d{3}(?:\s*Ti)?)", |c| {
            format!("NVIDIA RTX{}", compact_gpu_model(&c[1]))
        }),
        PatternRule::new(r"(?i)RTX\s*(3\d{3}(?:\s*Ti)?)", |c| {
            format!("NVIDIA RTX{}", compact_gpu_model(&c[1]))
        }),
        PatternRule::new(r"(?i)RTX\s*(2\d{3}(?:\s*Ti)?)", |c| {
            format!("NVIDIA RTX{}", compact_gpu_model(&c[1]))
        }),
        PatternRule::new(r"(?i)GTX\s*(\d{3,4}(?:\s*Ti)?)", |c| {
            format!("NVIDIA GTX{}", compact_gpu_model(&c[1]))
        }),
        PatternRule::new(r"(?i)Arc\s+(\d{3})", |c| format!("Intel Arc {}", &c[1])),
        PatternRule::new(r"(?i)Iris\s+Xe", |_| "Intel Iris Xe".to_string()),
    ]
});

static APPLE_GPU: Lazy<PatternRule> = Lazy::new(|| {
    PatternRule::new(r"(?i)\b(M\d+)(?:\s+(Pro|Max|Ultra))?\b", |c| {
        format!("Apple {} GPU", c[1].to_uppercase())
    })
});

/// Model snippet patterns per brand; brands without an entry yield [`UNRESOLVED`]
static MODEL_RULES: Lazy<Vec<(&'static str, Vec<Regex>)>> = Lazy::new(|| {
    vec![
        (
            "HP",
            vec![
                compile(r"(?i)HP\s+(\d{2}[\-\w]*)"),
                compile(r"(?i)(EliteBook|ProBook|Pavilion|Omen|Envy|Spectre)[\s\-]?([A-Za-z0-9\-\s]*)"),
            ],
        ),
        (
            "Dell",
            vec![compile(
                r"(?i)Dell\s+(Latitude|Inspiron|XPS|Vostro|Precision|G\d+)[\s\-]?([A-Za-z0-9\-]*)",
            )],
        ),
        (
            "Lenovo",
            vec![compile(r"(?i)(ThinkPad|IdeaPad|ThinkBook|Legion|Yoga)[\s\-]?([A-Za-z0-9\-\s]*)")],
        ),
        (
            "Asus",
            vec![compile(r"(?i)(Vivobook|Zenbook|ROG|TUF)[\s\-]?([A-Za-z0-9\-\s]*)")],
        ),
        ("Apple", vec![compile(r"(?i)MacBook\s+(Air|Pro)(?:\s+(M\d+))?")]),
        ("MSI", vec![compile(r"(?i)MSI\s+([A-Za-z]+[\s\-]?[A-Za-z0-9\-]*)")]),
    ]
});

/// `<digits> GB [RAM|DDR|LPDDR]`, anchored at the scan position
static RAM_AT: Lazy<Regex> =
    Lazy::new(|| compile(r"(?i)^([0-9]{1,3})\s*GB(\s*(?:RAM|DDR|LPDDR))?"));

/// What follows a disk size rather than a memory size
static DISK_SUFFIX: Lazy<Regex> = Lazy::new(|| compile(r"(?i)^\s*(?:SSD|HDD)"));

static STORAGE_TB: Lazy<Regex> = Lazy::new(|| compile(r"(?i)(\d+)\s*TB"));
static STORAGE_GB: Lazy<Regex> = Lazy::new(|| compile(r"(?i)(\d{3,4})\s*GB"));

/// Labels of all brands the keyword table knows, in priority order
pub fn known_brands() -> impl Iterator<Item = &'static str> {
    BRAND_RULES.iter().map(|(brand, _)| *brand)
}

/// Detect the laptop brand of a title
pub fn detect_brand(title: &str) -> &'static str {
    let lower = title.to_lowercase();
    BRAND_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| lower.contains(keyword)))
        .map(|(brand, _)| *brand)
        .unwrap_or(OTHER_BRAND)
}

/// Best-effort model snippet, e.g. "Vivobook 15 X1502ZA"
pub fn extract_model(title: &str, brand: &str) -> String {
    let Some((_, patterns)) = MODEL_RULES.iter().find(|(name, _)| *name == brand) else {
        return UNRESOLVED.to_string();
    };

    for pattern in patterns {
        if let Some(caps) = pattern.captures(title) {
            let joined = caps
                .iter()
                .skip(1)
                .flatten()
                .map(|m| m.as_str())
                .filter(|group| !group.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            let snippet: String = joined.trim().chars().take(MODEL_MAX_CHARS).collect();
            if snippet.is_empty() {
                return UNRESOLVED.to_string();
            }
            return snippet;
        }
    }
    UNRESOLVED.to_string()
}

/// CPU descriptor, e.g. "Intel Core i7-12700" or "Apple M2"
pub fn extract_cpu(title: &str) -> String {
    first_match(&CPU_RULES, title).unwrap_or_else(|| UNRESOLVED.to_string())
}

/// RAM text, e.g. "16 GB"
///
/// A size directly followed by SSD/HDD is a disk, not memory, and the scan
/// moves on. The first size that is not a disk decides: if it is not a
/// plausible RAM size the title has no usable RAM figure.
pub fn extract_ram(title: &str) -> String {
    let first = title
        .char_indices()
        .filter(|(_, c)| c.is_ascii_digit())
        .find_map(|(start, _)| {
            let caps = RAM_AT.captures(&title[start..])?;
            let whole = caps.get(0)?;
            // With a RAM/DDR suffix the size can never be read as a disk size
            let is_disk =
                caps.get(2).is_none() && DISK_SUFFIX.is_match(&title[start + whole.end()..]);
            if is_disk {
                None
            } else {
                caps[1].parse::<u32>().ok()
            }
        });

    match first {
        Some(gb) if PLAUSIBLE_RAM_GB.contains(&gb) => format!("{gb} GB"),
        _ => UNRESOLVED.to_string(),
    }
}

/// Storage text, e.g. "1 TB SSD" or "512 GB SSD"; terabytes take precedence
pub fn extract_storage(title: &str) -> String {
    if let Some(caps) = STORAGE_TB.captures(title) {
        return format!("{} TB SSD", &caps[1]);
    }
    if let Some(caps) = STORAGE_GB.captures(title) {
        return format!("{} GB SSD", &caps[1]);
    }
    UNRESOLVED.to_string()
}

/// GPU descriptor, e.g. "NVIDIA RTX4060" or "Apple M3 GPU"
pub fn extract_gpu(title: &str, brand: &str) -> String {
    if let Some(gpu) = first_match(&GPU_RULES, title) {
        return gpu;
    }

    let lower = title.to_lowercase();
    let apple_context = brand == "Apple" || lower.contains("macbook") || lower.contains("apple");
    if apple_context {
        if let Some(caps) = APPLE_GPU.pattern.captures(title) {
            return (APPLE_GPU.format)(&caps);
        }
    }

    INTEGRATED_GPU.to_string()
}

/// Run every extractor over one title
pub fn extract_features(title: &str) -> ExtractedFeatures {
    let brand = detect_brand(title);
    ExtractedFeatures {
        brand: brand.to_string(),
        model: extract_model(title, brand),
        cpu: extract_cpu(title),
        ram_text: extract_ram(title),
        storage_text: extract_storage(title),
        gpu: extract_gpu(title, brand),
    }
}
