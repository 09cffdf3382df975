//! Price text parsing and formatting
//!
//! The training table uses the Turkish number format: `.` groups thousands and
//! `,` separates decimals ("24.999,90"). Raw scraped files are less
//! consistent, so ingestion uses the lenient [`parse_price`].

use once_cell::sync::Lazy;
use regex::Regex;

static THOUSANDS_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,3}(?:\.\d{3})+$").expect("valid pattern"));

/// Parse a locale-formatted price: drop every `.`, then read `,` as the
/// decimal point
pub fn parse_locale_price(text: &str) -> Option<f64> {
    let cleaned = text.trim().replace('.', "").replace(',', ".");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|price| price.is_finite())
}

/// Parse a scraped price cell
///
/// Currency markers and spaces are ignored. A comma means locale format, a
/// pure `1.234.567` pattern means dot-grouped thousands, anything else is read
/// as a plain number ("24999.90").
pub fn parse_price(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    if cleaned.contains(',') || THOUSANDS_ONLY.is_match(&cleaned) {
        return parse_locale_price(&cleaned);
    }
    cleaned.parse::<f64>().ok().filter(|price| price.is_finite())
}

/// Format a price for the training table, always with two decimals
pub fn format_locale_price(price: f64) -> String {
    let cents = (price.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if price < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}{grouped},{fraction:02}")
}
