//! Derived-attribute classifier
//!
//! Maps a CPU descriptor to tier, generation and manufacturer, a GPU
//! descriptor to a performance class, and a loose brand string to a canonical
//! laptop brand label. Every function is total and stateless: the same string
//! gets the same answer during a training run and inside a request handler.
//!
//! The keyword tables are ordered; the first rule whose keyword occurs in the
//! lower-cased descriptor decides.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::extractor::{detect_brand, known_brands};
use super::{is_unresolved, OTHER_BRAND};

/// Tier of a CPU no rule recognises (kept apart from the explicit low end, 1)
pub const DEFAULT_CPU_TIER: u8 = 2;

/// Generation of a CPU no rule recognises
pub const DEFAULT_CPU_GENERATION: u8 = 10;

/// Flat generation for Intel Core Ultra parts, also the cap for Intel parts
pub const MAX_CPU_GENERATION: u8 = 15;

const LEGACY_OTHER_BRAND: &str = "diğer";

struct KeywordRule<T: 'static> {
    value: T,
    keywords: &'static [&'static str],
}

const fn rule<T>(value: T, keywords: &'static [&'static str]) -> KeywordRule<T> {
    KeywordRule { value, keywords }
}

fn first_keyword_match<T: Copy>(rules: &[KeywordRule<T>], lower: &str) -> Option<T> {
    rules
        .iter()
        .find(|rule| rule.keywords.iter().any(|keyword| lower.contains(keyword)))
        .map(|rule| rule.value)
}

const TIER_RULES: &[KeywordRule<u8>] = &[
    rule(9, &["i9", "ryzen 9", "ultra 9", "core 9"]),
    rule(7, &["i7", "ryzen 7", "ultra 7", "core 7"]),
    rule(5, &["i5", "ryzen 5", "ultra 5", "core 5", "m2", "m3", "m4"]),
    rule(3, &["i3", "ryzen 3", "m1"]),
    rule(1, &["celeron", "pentium", "n4020", "n4120", "n100", "n150"]),
];

const APPLE_GENERATION_RULES: &[KeywordRule<u8>] = &[
    rule(11, &["m1"]),
    rule(12, &["m2"]),
    rule(13, &["m3"]),
    rule(14, &["m4"]),
];

const CPU_BRAND_RULES: &[KeywordRule<CpuBrand>] = &[
    rule(CpuBrand::Intel, &["intel", "core i", "celeron", "pentium", "ultra"]),
    rule(CpuBrand::Amd, &["amd", "ryzen"]),
    rule(CpuBrand::Apple, &["apple", "m1", "m2", "m3", "m4"]),
];

const GPU_CLASS_RULES: &[KeywordRule<GpuClass>] = &[
    rule(GpuClass::RtxNew, &["rtx 50", "rtx50", "rtx 40", "rtx40"]),
    rule(GpuClass::Rtx30, &["rtx 30", "rtx30"]),
    rule(GpuClass::Rtx, &["rtx"]),
    rule(GpuClass::Gtx, &["gtx"]),
    rule(GpuClass::NvidiaOther, &["nvidia", "geforce"]),
    rule(GpuClass::RadeonRx, &["radeon rx"]),
    rule(GpuClass::Radeon, &["radeon", "amd"]),
    rule(GpuClass::AppleGpu, &["apple"]),
    rule(GpuClass::IntelIris, &["iris", "arc"]),
    rule(GpuClass::IntelUhd, &["uhd"]),
];

static INTEL_GENERATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"i\d-(\d{1,2})\d{2,3}").expect("valid pattern"));
static RYZEN_GENERATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"ryzen\s+\d\s+(\d)").expect("valid pattern"));

/// CPU manufacturer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CpuBrand {
    Intel,
    #[serde(rename = "AMD")]
    Amd,
    Apple,
}

impl CpuBrand {
    pub fn label(self) -> &'static str {
        match self {
            CpuBrand::Intel => "Intel",
            CpuBrand::Amd => "AMD",
            CpuBrand::Apple => "Apple",
        }
    }
}

impl fmt::Display for CpuBrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Discrete GPU performance class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GpuClass {
    /// RTX 40 and 50 series
    #[serde(rename = "RTX_New")]
    RtxNew,
    #[serde(rename = "RTX_30")]
    Rtx30,
    /// Any other RTX (20 series, RTX 2050, workstation parts)
    #[serde(rename = "RTX")]
    Rtx,
    #[serde(rename = "GTX")]
    Gtx,
    #[serde(rename = "NVIDIA_Other")]
    NvidiaOther,
    #[serde(rename = "Radeon_RX")]
    RadeonRx,
    #[serde(rename = "Radeon")]
    Radeon,
    #[serde(rename = "Apple_GPU")]
    AppleGpu,
    /// Iris Xe and Arc
    #[serde(rename = "Intel_Iris")]
    IntelIris,
    #[serde(rename = "Intel_UHD")]
    IntelUhd,
    #[serde(rename = "Integrated")]
    Integrated,
}

impl GpuClass {
    pub const ALL: [GpuClass; 11] = [
        GpuClass::RtxNew,
        GpuClass::Rtx30,
        GpuClass::Rtx,
        GpuClass::Gtx,
        GpuClass::NvidiaOther,
        GpuClass::RadeonRx,
        GpuClass::Radeon,
        GpuClass::AppleGpu,
        GpuClass::IntelIris,
        GpuClass::IntelUhd,
        GpuClass::Integrated,
    ];

    pub fn label(self) -> &'static str {
        match self {
            GpuClass::RtxNew => "RTX_New",
            GpuClass::Rtx30 => "RTX_30",
            GpuClass::Rtx => "RTX",
            GpuClass::Gtx => "GTX",
            GpuClass::NvidiaOther => "NVIDIA_Other",
            GpuClass::RadeonRx => "Radeon_RX",
            GpuClass::Radeon => "Radeon",
            GpuClass::AppleGpu => "Apple_GPU",
            GpuClass::IntelIris => "Intel_Iris",
            GpuClass::IntelUhd => "Intel_UHD",
            GpuClass::Integrated => "Integrated",
        }
    }
}

impl fmt::Display for GpuClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Derived CPU / GPU attributes of one listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassifiedFeatures {
    pub cpu_tier: u8,
    pub cpu_generation: u8,
    pub cpu_brand: CpuBrand,
    pub gpu_class: GpuClass,
}

/// Ordinal performance tier: 9, 7, 5, 3 or 1; 2 when nothing matches
pub fn cpu_tier(cpu: &str) -> u8 {
    let lower = cpu.to_lowercase();
    first_keyword_match(TIER_RULES, &lower).unwrap_or(DEFAULT_CPU_TIER)
}

/// Product generation on a single scale shared by Intel, AMD and Apple
///
/// Core Ultra is checked before the "iX-NNNN" pattern and always yields 15.
/// Apple M1..M4 map to 11..14.
pub fn cpu_generation(cpu: &str) -> u8 {
    let lower = cpu.to_lowercase();
    if lower.contains("ultra") {
        return MAX_CPU_GENERATION;
    }
    if let Some(caps) = INTEL_GENERATION.captures(&lower) {
        if let Ok(generation) = caps[1].parse::<u8>() {
            return generation.min(MAX_CPU_GENERATION);
        }
    }
    if let Some(caps) = RYZEN_GENERATION.captures(&lower) {
        if let Ok(generation) = caps[1].parse::<u8>() {
            return generation;
        }
    }
    if let Some(generation) = first_keyword_match(APPLE_GENERATION_RULES, &lower) {
        return generation;
    }
    if lower.contains("celeron") || lower.contains("pentium") {
        return 8;
    }
    DEFAULT_CPU_GENERATION
}

/// CPU manufacturer, Intel when nothing matches
pub fn cpu_brand(cpu: &str) -> CpuBrand {
    let lower = cpu.to_lowercase();
    first_keyword_match(CPU_BRAND_RULES, &lower).unwrap_or(CpuBrand::Intel)
}

/// GPU performance class, `Integrated` when nothing matches
///
/// The bare labels "mid" and "high" come from older hand-labelled data.
pub fn gpu_class(gpu: &str) -> GpuClass {
    let lower = gpu.trim().to_lowercase();
    if let Some(class) = first_keyword_match(GPU_CLASS_RULES, &lower) {
        return class;
    }
    match lower.as_str() {
        "mid" => GpuClass::Gtx,
        "high" => GpuClass::RtxNew,
        _ => GpuClass::Integrated,
    }
}

/// Classify a CPU and a GPU descriptor
pub fn classify(cpu: &str, gpu: &str) -> ClassifiedFeatures {
    ClassifiedFeatures {
        cpu_tier: cpu_tier(cpu),
        cpu_generation: cpu_generation(cpu),
        cpu_brand: cpu_brand(cpu),
        gpu_class: gpu_class(gpu),
    }
}

/// Canonical laptop brand label
///
/// A known label in any letter case is returned in its canonical spelling,
/// otherwise the brand keyword table gets a chance ("thinkpad" → Lenovo).
/// Anything still unrecognised is returned trimmed but unchanged, so the
/// encoder can report it as an unseen category instead of folding it into
/// "Other".
pub fn laptop_brand(text: &str) -> String {
    let trimmed = text.trim();
    if is_unresolved(trimmed) {
        return OTHER_BRAND.to_string();
    }
    if let Some(known) = known_brands().find(|brand| brand.eq_ignore_ascii_case(trimmed)) {
        return known.to_string();
    }
    let lower = trimmed.to_lowercase();
    if lower == OTHER_BRAND.to_lowercase() || lower == LEGACY_OTHER_BRAND {
        return OTHER_BRAND.to_string();
    }
    // Keywords ending in a space need a word boundary after the last word
    let detected = detect_brand(&format!("{trimmed} "));
    if detected != OTHER_BRAND {
        return detected.to_string();
    }
    trimmed.to_string()
}
