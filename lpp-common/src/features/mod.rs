//! Feature derivation for laptop listings
//!
//! Stages, leaf first:
//! 1. [`extractor`] - title text → brand / model / CPU / RAM / storage / GPU fragments
//! 2. [`normalizer`] - RAM and storage fragments → integer gigabytes
//! 3. [`classifier`] - CPU / GPU descriptors → tier, generation, brand, GPU class
//!
//! Training and serving both go through [`derive_listing_features`]; there is
//! no second copy of the classification rules anywhere in the workspace.

pub mod classifier;
pub mod extractor;
pub mod normalizer;

use serde::Serialize;

pub use classifier::{classify, laptop_brand, ClassifiedFeatures, CpuBrand, GpuClass};
pub use extractor::{extract_features, ExtractedFeatures};
pub use normalizer::{normalize, normalize_ram, normalize_storage, NormalizedFeatures};

/// Placeholder for a text fragment the extractor could not resolve
pub const UNRESOLVED: &str = "-";

/// Catch-all laptop brand
pub const OTHER_BRAND: &str = "Other";

/// True for every spelling of "nothing was extracted here"
///
/// Covers the extractor placeholder, the legacy `unknown` marker of older
/// datasets and blank cells.
pub fn is_unresolved(text: &str) -> bool {
    let text = text.trim();
    text.is_empty() || text == UNRESOLVED || text.eq_ignore_ascii_case("unknown")
}

/// Everything the encoder needs for one listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingFeatures {
    pub ram_gb: f64,
    pub storage_gb: f64,
    #[serde(flatten)]
    pub classified: ClassifiedFeatures,
    pub laptop_brand: String,
}

/// Derive the pre-encoding features of one listing
///
/// This is the one place where raw CPU / GPU / brand strings become derived
/// attributes. The training run calls it once per table row, the inference
/// service once per request, with the same argument order.
pub fn derive_listing_features(
    ram_gb: f64,
    storage_gb: f64,
    cpu: &str,
    gpu: &str,
    brand: &str,
) -> ListingFeatures {
    ListingFeatures {
        ram_gb,
        storage_gb,
        classified: classify(cpu, gpu),
        laptop_brand: laptop_brand(brand),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_spellings() {
        assert!(is_unresolved("-"));
        assert!(is_unresolved(" unknown "));
        assert!(is_unresolved(""));
        assert!(!is_unresolved("16 GB"));
    }

    #[test]
    fn test_derive_listing_features() {
        let features = derive_listing_features(
            16.0,
            512.0,
            "Intel Core i7-12700H",
            "NVIDIA RTX 3060",
            "asus",
        );

        assert_eq!(features.classified.cpu_tier, 7);
        assert_eq!(features.classified.cpu_generation, 12);
        assert_eq!(features.classified.cpu_brand, CpuBrand::Intel);
        assert_eq!(features.classified.gpu_class, GpuClass::Rtx30);
        assert_eq!(features.laptop_brand, "Asus");
    }
}
