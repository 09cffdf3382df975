//! Raw listing cleaning
//!
//! Runs between ingestion and extraction:
//! 1. Duplicate removal on a normalized title
//! 2. Sanity bounds on price and on the RAM / storage hints
//! 3. IQR fence on price
//! 4. Rows with an empty CPU hint

use std::collections::{HashMap, HashSet};

use lpp_common::config::CleaningConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

use crate::ingest::{HintColumns, RawListing};

static PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s\-\.]").expect("valid pattern"));

/// Row counts of one cleaning pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleaningReport {
    pub input: usize,
    /// Same normalized title and same price as an earlier row
    pub exact_duplicates: usize,
    /// Same normalized title as a cheaper row
    pub soft_duplicates: usize,
    pub out_of_bounds: usize,
    pub iqr_outliers: usize,
    /// CPU hint column present, cell empty
    pub missing_cpu: usize,
    pub kept: usize,
}

/// Title key for duplicate detection
///
/// Lower-cased, whitespace collapsed, punctuation other than `-` and `.`
/// stripped, junk phrases removed, whitespace collapsed again.
pub fn normalize_title(title: &str, junk_phrases: &[String]) -> String {
    let collapsed = collapse_whitespace(&title.to_lowercase());
    let mut text = PUNCTUATION.replace_all(&collapsed, "").into_owned();
    for phrase in junk_phrases {
        let phrase = collapse_whitespace(&phrase.to_lowercase());
        if !phrase.is_empty() {
            text = text.replace(&phrase, " ");
        }
    }
    collapse_whitespace(&text)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drop exact duplicates, then collapse soft duplicates to their cheapest row
///
/// Surviving rows keep their input order. Returns the exact and soft
/// duplicate counts.
pub fn deduplicate(
    listings: Vec<RawListing>,
    junk_phrases: &[String],
) -> (Vec<RawListing>, usize, usize) {
    let input = listings.len();

    let mut seen = HashSet::new();
    let keyed: Vec<(String, RawListing)> = listings
        .into_iter()
        .map(|listing| (normalize_title(&listing.title, junk_phrases), listing))
        .filter(|(key, listing)| seen.insert((key.clone(), listing.price.to_bits())))
        .collect();
    let exact = input - keyed.len();

    let mut cheapest: HashMap<&str, usize> = HashMap::new();
    for (index, (key, listing)) in keyed.iter().enumerate() {
        cheapest
            .entry(key.as_str())
            .and_modify(|best| {
                if listing.price < keyed[*best].1.price {
                    *best = index;
                }
            })
            .or_insert(index);
    }
    let winners: HashSet<usize> = cheapest.into_values().collect();
    let soft = keyed.len() - winners.len();

    let kept = keyed
        .into_iter()
        .enumerate()
        .filter(|(index, _)| winners.contains(index))
        .map(|(_, (_, listing))| listing)
        .collect();
    (kept, exact, soft)
}

/// Price strictly inside the sanity bounds, hints inside their ranges
///
/// A hint is only checked when its column exists; an empty cell in an
/// existing column fails the check.
pub fn within_bounds(listing: &RawListing, columns: &HintColumns, config: &CleaningConfig) -> bool {
    let price_ok = listing.price > config.min_price && listing.price < config.max_price;
    let ram_ok = hint_in_range(columns.ram, listing.ram_gb, config.min_ram_gb, config.max_ram_gb);
    let storage_ok = hint_in_range(
        columns.storage,
        listing.storage_gb,
        config.min_storage_gb,
        config.max_storage_gb,
    );
    price_ok && ram_ok && storage_ok
}

fn hint_in_range(column: bool, hint: Option<f64>, min: f64, max: f64) -> bool {
    !column || hint.is_some_and(|value| (min..=max).contains(&value))
}

/// Linearly interpolated quantile of sorted values
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * (position - lower as f64))
}

/// Keep rows whose price lies in `[Q1 - k·IQR, Q3 + k·IQR]`
pub fn iqr_filter(listings: Vec<RawListing>, multiplier: f64) -> Vec<RawListing> {
    let mut prices: Vec<f64> = listings.iter().map(|listing| listing.price).collect();
    prices.sort_by(f64::total_cmp);

    let (Some(q1), Some(q3)) = (quantile(&prices, 0.25), quantile(&prices, 0.75)) else {
        return listings;
    };
    let iqr = q3 - q1;
    let (low, high) = (q1 - multiplier * iqr, q3 + multiplier * iqr);

    listings
        .into_iter()
        .filter(|listing| (low..=high).contains(&listing.price))
        .collect()
}

/// Full cleaning pass
pub fn clean(
    listings: Vec<RawListing>,
    columns: &HintColumns,
    config: &CleaningConfig,
) -> (Vec<RawListing>, CleaningReport) {
    let mut report = CleaningReport {
        input: listings.len(),
        ..Default::default()
    };

    let (listings, exact, soft) = deduplicate(listings, &config.junk_phrases);
    report.exact_duplicates = exact;
    report.soft_duplicates = soft;

    let before = listings.len();
    let listings: Vec<RawListing> = listings
        .into_iter()
        .filter(|listing| within_bounds(listing, columns, config))
        .collect();
    report.out_of_bounds = before - listings.len();

    let before = listings.len();
    let listings = iqr_filter(listings, config.iqr_multiplier);
    report.iqr_outliers = before - listings.len();

    let before = listings.len();
    let listings: Vec<RawListing> = listings
        .into_iter()
        .filter(|listing| !columns.cpu || listing.cpu.is_some())
        .collect();
    report.missing_cpu = before - listings.len();
    report.kept = listings.len();

    info!(
        "Cleaning: {} in, {} exact + {} soft duplicates, {} out of bounds, {} IQR outliers, \
         {} without CPU, {} kept",
        report.input,
        report.exact_duplicates,
        report.soft_duplicates,
        report.out_of_bounds,
        report.iqr_outliers,
        report.missing_cpu,
        report.kept
    );
    (listings, report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(title: &str, price: f64) -> RawListing {
        RawListing {
            title: title.to_string(),
            price,
            brand: None,
            cpu: None,
            gpu: None,
            ram_gb: None,
            storage_gb: None,
        }
    }

    fn junk() -> Vec<String> {
        CleaningConfig::default().junk_phrases
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(
            normalize_title("  Lenovo IdeaPad 3 (i5-1235U)  8GB / 512GB FreeDOS!", &junk()),
            "lenovo ideapad 3 i5-1235u 8gb 512gb"
        );
        assert_eq!(
            normalize_title("HP 15s Türkiye Garantili Windows 11", &junk()),
            "hp 15s"
        );
    }

    #[test]
    fn test_junk_phrase_with_inner_whitespace() {
        assert_eq!(
            normalize_title("HP 15s i5 8GB Windows  11", &junk()),
            normalize_title("HP 15s i5 8GB", &junk())
        );
        assert_eq!(normalize_title("Lenovo V15 i5\tFree \t Dos", &junk()), "lenovo v15 i5");
    }

    #[test]
    fn test_soft_duplicate_across_spacing() {
        let listings = vec![
            listing("Lenovo V15 i5  Free  Dos", 20_000.0),
            listing("Lenovo V15 i5", 19_000.0),
        ];

        let (kept, exact, soft) = deduplicate(listings, &junk());

        assert_eq!(exact, 0);
        assert_eq!(soft, 1);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].price, 19_000.0);
    }

    #[test]
    fn test_exact_then_soft_duplicates() {
        let listings = vec![
            listing("HP 15s i5 8GB", 20_000.0),
            listing("Asus Vivobook", 18_000.0),
            listing("hp 15s  i5 8gb!", 20_000.0),
            listing("HP 15s i5 8GB FreeDOS", 19_500.0),
        ];

        let (kept, exact, soft) = deduplicate(listings, &junk());

        assert_eq!(exact, 1);
        assert_eq!(soft, 1);
        let prices: Vec<f64> = kept.iter().map(|l| l.price).collect();
        assert_eq!(prices, vec![18_000.0, 19_500.0]);
    }

    #[test]
    fn test_bounds() {
        let config = CleaningConfig::default();
        let columns = HintColumns {
            cpu: false,
            ram: true,
            storage: true,
        };

        assert!(within_bounds(&listing("a", 15_000.0), &HintColumns::default(), &config));
        assert!(!within_bounds(&listing("a", 1_000.0), &HintColumns::default(), &config));
        assert!(!within_bounds(&listing("a", 300_000.0), &HintColumns::default(), &config));

        let mut hinted = listing("a", 15_000.0);
        hinted.ram_gb = Some(128.0);
        hinted.storage_gb = Some(64.0);
        assert!(within_bounds(&hinted, &columns, &config));
        hinted.ram_gb = Some(256.0);
        assert!(!within_bounds(&hinted, &columns, &config));
    }

    #[test]
    fn test_empty_hint_in_present_column_fails_bounds() {
        let config = CleaningConfig::default();
        let mut row = listing("a", 15_000.0);
        row.ram_gb = Some(8.0);

        let ram_only = HintColumns {
            ram: true,
            ..Default::default()
        };
        assert!(within_bounds(&row, &ram_only, &config));

        let ram_and_storage = HintColumns {
            ram: true,
            storage: true,
            ..Default::default()
        };
        assert!(!within_bounds(&row, &ram_and_storage, &config));
    }

    #[test]
    fn test_missing_cpu_dropped_when_column_present() {
        let mut with_cpu = listing("Laptop A", 20_000.0);
        with_cpu.cpu = Some("Intel Core i5-1235U".to_string());
        let listings = vec![with_cpu, listing("Laptop B", 21_000.0)];
        let columns = HintColumns {
            cpu: true,
            ..Default::default()
        };

        let (kept, report) = clean(listings.clone(), &columns, &CleaningConfig::default());
        assert_eq!(report.missing_cpu, 1);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "Laptop A");

        let (kept, report) = clean(listings, &HintColumns::default(), &CleaningConfig::default());
        assert_eq!(report.missing_cpu, 0);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&sorted, 0.25), Some(1.75));
        assert_eq!(quantile(&sorted, 0.5), Some(2.5));
        assert_eq!(quantile(&[7.0], 0.75), Some(7.0));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn test_iqr_filter() {
        let listings = [10.0, 20.0, 30.0, 40.0, 1_000.0]
            .iter()
            .enumerate()
            .map(|(i, price)| listing(&format!("laptop {i}"), *price))
            .collect();

        let kept = iqr_filter(listings, 1.5);

        let prices: Vec<f64> = kept.iter().map(|l| l.price).collect();
        assert_eq!(prices, vec![10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn test_clean_report() {
        let listings = vec![
            listing("Laptop A", 20_000.0),
            listing("Laptop A", 20_000.0),
            listing("Laptop B", 500.0),
            listing("Laptop C", 25_000.0),
        ];

        let (kept, report) = clean(listings, &HintColumns::default(), &CleaningConfig::default());

        assert_eq!(kept.len(), 2);
        assert_eq!(
            report,
            CleaningReport {
                input: 4,
                exact_duplicates: 1,
                soft_duplicates: 0,
                out_of_bounds: 1,
                iqr_outliers: 0,
                missing_cpu: 0,
                kept: 2,
            }
        );
    }
}
