//! Numeric normalizer
//!
//! Converts extractor fragments ("16 GB", "1 TB SSD") into integer gigabytes.
//! `None` is the unresolved marker; a fragment that cannot be read is never
//! turned into zero.
//!
//! Both functions are idempotent on canonical values: feeding back "16" or
//! "1024" (as found in an already-normalized table) returns the same number.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::extractor::ExtractedFeatures;
use super::is_unresolved;

/// Gigabytes per terabyte, as used by marketplace listings
pub const GB_PER_TB: u32 = 1024;

static FIRST_INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)").expect("valid pattern"));
static TERABYTES: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\d+)\s*TB").expect("valid pattern"));
static GIGABYTES: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\d+)\s*GB").expect("valid pattern"));
static BARE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)(?:\.0+)?\s*$").expect("valid pattern"));

/// Integer RAM / storage sizes of one listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NormalizedFeatures {
    pub ram_gb: Option<u32>,
    pub storage_gb: Option<u32>,
}

/// RAM in GB: the first integer in the text
pub fn normalize_ram(text: &str) -> Option<u32> {
    if is_unresolved(text) {
        return None;
    }
    FIRST_INTEGER
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}

/// Storage in GB
///
/// Checked in order: terabytes (×1024), gigabytes, a bare canonical number.
pub fn normalize_storage(text: &str) -> Option<u32> {
    if is_unresolved(text) {
        return None;
    }
    if let Some(caps) = TERABYTES.captures(text) {
        return caps[1]
            .parse::<u32>()
            .ok()
            .and_then(|tb| tb.checked_mul(GB_PER_TB));
    }
    if let Some(caps) = GIGABYTES.captures(text) {
        return caps[1].parse().ok();
    }
    BARE_NUMBER
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}

/// Normalize the RAM and storage fragments of one extraction
pub fn normalize(extracted: &ExtractedFeatures) -> NormalizedFeatures {
    NormalizedFeatures {
        ram_gb: normalize_ram(&extracted.ram_text),
        storage_gb: normalize_storage(&extracted.storage_text),
    }
}
