//! Category encoder
//!
//! Fit once per training run from the whole corpus, persisted next to the
//! model and loaded read-only by the inference service.
//!
//! # Codes
//! Observed values are sorted by byte order and numbered from 1. Code
//! [`UNKNOWN_CODE`] (0) is reserved: a value the training corpus never
//! contained encodes to 0, which no observed value shares.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::features::ListingFeatures;
use crate::vector::EncodedFeatureVector;

/// Code of every value not seen at fit time
pub const UNKNOWN_CODE: u32 = 0;

/// Mapping of one categorical field's values to dense integer codes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEncoding {
    classes: Vec<String>,
}

impl CategoryEncoding {
    /// Fit on every observed value (duplicates allowed)
    pub fn fit<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let distinct: BTreeSet<String> = values
            .into_iter()
            .map(|value| value.as_ref().to_string())
            .collect();
        Self {
            classes: distinct.into_iter().collect(),
        }
    }

    /// Code of `value`, `None` if it was not seen at fit time
    pub fn encode(&self, value: &str) -> Option<u32> {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(value))
            .ok()
            .and_then(|index| u32::try_from(index + 1).ok())
    }

    /// Code of `value`, [`UNKNOWN_CODE`] if it was not seen at fit time
    pub fn encode_or_unknown(&self, value: &str) -> u32 {
        self.encode(value).unwrap_or(UNKNOWN_CODE)
    }

    /// Value behind `code`, `None` for the unknown code or out of range
    pub fn decode(&self, code: u32) -> Option<&str> {
        let index = usize::try_from(code).ok()?.checked_sub(1)?;
        self.classes.get(index).map(String::as_str)
    }

    /// Known values in code order
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Reject an encoding that could not have come out of [`Self::fit`]
    pub fn validate(&self) -> Result<()> {
        if self.classes.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(Error::InvalidInput(
                "category classes must be sorted and unique".to_string(),
            ));
        }
        Ok(())
    }
}

/// Encodings of the three categorical model inputs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEncodings {
    pub cpu_brand: CategoryEncoding,
    pub gpu_class: CategoryEncoding,
    pub laptop_brand: CategoryEncoding,
}

impl CategoryEncodings {
    /// Field names, as reported by the service
    pub const FIELDS: [&'static str; 3] = ["cpu_brand", "gpu_class", "laptop_brand"];

    /// Fit all three encodings on the training corpus
    pub fn fit(rows: &[ListingFeatures]) -> Self {
        Self {
            cpu_brand: CategoryEncoding::fit(
                rows.iter().map(|row| row.classified.cpu_brand.label()),
            ),
            gpu_class: CategoryEncoding::fit(
                rows.iter().map(|row| row.classified.gpu_class.label()),
            ),
            laptop_brand: CategoryEncoding::fit(rows.iter().map(|row| row.laptop_brand.as_str())),
        }
    }

    /// (field name, encoding) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &CategoryEncoding)> {
        Self::FIELDS
            .into_iter()
            .zip([&self.cpu_brand, &self.gpu_class, &self.laptop_brand])
    }

    /// Encode one listing
    ///
    /// Returns the vector and the names of the fields that fell back to
    /// [`UNKNOWN_CODE`].
    pub fn encode(&self, features: &ListingFeatures) -> (EncodedFeatureVector, Vec<&'static str>) {
        let mut fallbacks = Vec::new();
        let mut code = |field: &'static str, encoding: &CategoryEncoding, value: &str| -> f64 {
            let code = encoding.encode(value).unwrap_or_else(|| {
                fallbacks.push(field);
                UNKNOWN_CODE
            });
            f64::from(code)
        };

        let classified = &features.classified;
        let cpu_brand_code = code("cpu_brand", &self.cpu_brand, classified.cpu_brand.label());
        let gpu_class_code = code("gpu_class", &self.gpu_class, classified.gpu_class.label());
        let laptop_brand_code = code("laptop_brand", &self.laptop_brand, &features.laptop_brand);

        let vector = EncodedFeatureVector {
            ram_gb: features.ram_gb,
            storage_gb: features.storage_gb,
            cpu_tier: f64::from(features.classified.cpu_tier),
            cpu_generation: f64::from(features.classified.cpu_generation),
            cpu_brand_code,
            gpu_class_code,
            laptop_brand_code,
        };
        (vector, fallbacks)
    }

    pub fn validate(&self) -> Result<()> {
        for (field, encoding) in self.iter() {
            encoding
                .validate()
                .map_err(|e| Error::InvalidInput(format!("{field}: {e}")))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::derive_listing_features;

    #[test]
    fn test_fit_sorted_from_one() {
        let encoding = CategoryEncoding::fit(["MSI", "Asus", "HP", "Asus"]);

        assert_eq!(encoding.classes(), ["Asus", "HP", "MSI"]);
        assert_eq!(encoding.encode("Asus"), Some(1));
        assert_eq!(encoding.encode("MSI"), Some(3));
        assert_eq!(encoding.encode("Zorin"), None);
        assert_eq!(encoding.encode_or_unknown("Zorin"), UNKNOWN_CODE);
    }

    #[test]
    fn test_fit_deterministic() {
        let first = CategoryEncoding::fit(["HP", "Dell", "Apple"]);
        let second = CategoryEncoding::fit(["Apple", "HP", "Dell", "HP"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_round_trip() {
        let encoding = CategoryEncoding::fit(["Intel", "AMD", "Apple"]);
        for class in ["Intel", "AMD", "Apple"] {
            let code = encoding.encode(class).unwrap();
            assert_eq!(encoding.decode(code), Some(class));
        }
        assert_eq!(encoding.decode(UNKNOWN_CODE), None);
        assert_eq!(encoding.decode(99), None);
    }

    #[test]
    fn test_validate_rejects_unsorted() {
        let encoding: CategoryEncoding = serde_json::from_str(r#"{"classes":["b","a"]}"#).unwrap();
        assert!(encoding.validate().is_err());
        assert!(CategoryEncoding::fit(["a", "b"]).validate().is_ok());
    }

    #[test]
    fn test_encode_listing_with_fallback() {
        let rows = vec![
            derive_listing_features(8.0, 256.0, "Intel Core i5-1235U", "Intel Iris Xe", "HP"),
            derive_listing_features(16.0, 512.0, "AMD Ryzen 7 7730U", "NVIDIA RTX 3060", "Asus"),
        ];
        let encodings = CategoryEncodings::fit(&rows);

        let request = derive_listing_features(
            16.0,
            512.0,
            "Intel Core i7-12700H",
            "NVIDIA RTX 3060",
            "Zorin",
        );
        let (vector, fallbacks) = encodings.encode(&request);

        assert_eq!(vector.cpu_tier, 7.0);
        assert_eq!(vector.cpu_generation, 12.0);
        assert_eq!(vector.cpu_brand_code, 2.0);
        assert_eq!(vector.gpu_class_code, 2.0);
        assert_eq!(vector.laptop_brand_code, 0.0);
        assert_eq!(fallbacks, vec!["laptop_brand"]);
    }
}
