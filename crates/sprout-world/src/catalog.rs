//! The crop catalog.
//!
//! The catalog is built once at startup, validated, and then shared
//! read-only for the life of the process. Planting copies the grow duration
//! out of the catalog, so nothing in the ground depends on the catalog
//! afterwards except the sell price.

use sprout_types::CropInfo;

use crate::error::FarmError;

/// Default number of grid rows.
pub const DEFAULT_ROWS: u32 = 10;

/// Default number of grid columns.
pub const DEFAULT_COLUMNS: u32 = 15;

/// Validated, immutable list of plantable crops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropCatalog {
    crops: Vec<CropInfo>,
}

impl CropCatalog {
    /// Build a catalog from a list of entries.
    ///
    /// # Errors
    ///
    /// Returns [`FarmError::InvalidCatalog`] if the list is empty, a name is
    /// blank or repeated, or a grow duration is zero.
    pub fn new(crops: Vec<CropInfo>) -> Result<Self, FarmError> {
        if crops.is_empty() {
            return Err(FarmError::InvalidCatalog {
                reason: String::from("at least one crop must be configured"),
            });
        }

        for (index, crop) in crops.iter().enumerate() {
            if crop.name.trim().is_empty() {
                return Err(FarmError::InvalidCatalog {
                    reason: format!("crop #{index} has an empty name"),
                });
            }
            if crop.grow_duration_secs == 0 {
                return Err(FarmError::InvalidCatalog {
                    reason: format!("crop {} has a zero grow duration", crop.name),
                });
            }
            if crops.iter().take(index).any(|other| other.name == crop.name) {
                return Err(FarmError::InvalidCatalog {
                    reason: format!("crop {} is listed twice", crop.name),
                });
            }
        }

        Ok(Self { crops })
    }

    /// Look up a crop by name.
    pub fn get(&self, name: &str) -> Option<&CropInfo> {
        self.crops.iter().find(|crop| crop.name == name)
    }

    /// Look up a crop by name, failing with [`FarmError::UnknownCrop`].
    ///
    /// # Errors
    ///
    /// Returns [`FarmError::UnknownCrop`] if the name is not in the catalog.
    pub fn require(&self, name: &str) -> Result<&CropInfo, FarmError> {
        self.get(name)
            .ok_or_else(|| FarmError::UnknownCrop(name.to_owned()))
    }

    /// All crops in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &CropInfo> {
        self.crops.iter()
    }

    /// Number of catalog entries.
    pub fn len(&self) -> usize {
        self.crops.len()
    }

    /// Whether the catalog is empty. Never true for a validated catalog.
    pub fn is_empty(&self) -> bool {
        self.crops.is_empty()
    }
}

impl Default for CropCatalog {
    /// The standard four-crop catalog.
    fn default() -> Self {
        let crop = |name: &str, icon: &str, sell_price: u64, grow_duration_secs: u32| CropInfo {
            name: name.to_owned(),
            icon: icon.to_owned(),
            sell_price,
            grow_duration_secs,
        };
        Self {
            crops: vec![
                crop("carrot", "🥕", 5, 10),
                crop("corn", "🌽", 8, 15),
                crop("tomato", "🍅", 12, 20),
                crop("apple", "🍎", 20, 30),
            ],
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn info(name: &str, secs: u32) -> CropInfo {
        CropInfo {
            name: name.to_owned(),
            icon: String::new(),
            sell_price: 1,
            grow_duration_secs: secs,
        }
    }

    #[test]
    fn default_catalog_is_valid() {
        let catalog = CropCatalog::default();
        let rebuilt = CropCatalog::new(catalog.iter().cloned().collect());
        assert!(rebuilt.is_ok());
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.get("carrot").unwrap().grow_duration_secs, 10);
        assert_eq!(catalog.get("apple").unwrap().sell_price, 20);
    }

    #[test]
    fn rejects_empty_catalog() {
        assert!(matches!(
            CropCatalog::new(Vec::new()),
            Err(FarmError::InvalidCatalog { .. })
        ));
    }

    #[test]
    fn rejects_zero_duration() {
        assert!(CropCatalog::new(vec![info("carrot", 0)]).is_err());
    }

    #[test]
    fn rejects_duplicate_names() {
        assert!(CropCatalog::new(vec![info("carrot", 10), info("carrot", 12)]).is_err());
    }

    #[test]
    fn rejects_blank_names() {
        assert!(CropCatalog::new(vec![info("  ", 10)]).is_err());
    }

    #[test]
    fn require_reports_unknown_crop() {
        let catalog = CropCatalog::default();
        assert_eq!(
            catalog.require("durian"),
            Err(FarmError::UnknownCrop(String::from("durian")))
        );
        assert!(catalog.require("corn").is_ok());
    }
}
