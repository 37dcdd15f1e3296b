// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Garment sizes: the fixed catalogue, the per-size quantity sheet used by the
//! product forms, and the size summary shown for a selected OP.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use thiserror::Error;

/// Kids sizes, in catalogue order.
pub const KIDS_SIZES: [&str; 7] = ["2", "4", "6", "8", "10", "12", "16"];

/// Adult sizes, in catalogue order.
pub const ADULT_SIZES: [&str; 6] = ["XS", "S", "M", "L", "XL", "XXL"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SizeError {
    #[error("unknown size '{0}' (kids: 2-16, adults: XS-XXL)")]
    Unknown(String),
    #[error("invalid size entry '{0}', expected SIZE=QUANTITY")]
    Malformed(String),
    #[error("quantity for size {size} must be a whole number >= 0, got '{value}'")]
    BadQuantity { size: String, value: String },
}

/// Which half of the catalogue a size belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeSection {
    Kids,
    Adult,
}

/// Quantities per catalogue size, as edited in a product form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeSheet {
    kids: Vec<(&'static str, i64)>,
    adult: Vec<(&'static str, i64)>,
}

impl Default for SizeSheet {
    fn default() -> Self {
        Self::new()
    }
}

impl SizeSheet {
    pub fn new() -> Self {
        Self {
            kids: KIDS_SIZES.iter().map(|s| (*s, 0)).collect(),
            adult: ADULT_SIZES.iter().map(|s| (*s, 0)).collect(),
        }
    }

    /// Rebuild a sheet from a backend `sizeQuantities` map. Sizes outside the
    /// catalogue are dropped.
    pub fn from_quantities(quantities: &BTreeMap<String, i64>) -> Self {
        let mut sheet = Self::new();
        for (size, quantity) in quantities {
            if let Err(e) = sheet.set(size, *quantity) {
                tracing::debug!("Ignoring size from backend: {}", e);
            }
        }
        sheet
    }

    /// Set the quantity of one size. Negative quantities are stored as zero.
    pub fn set(&mut self, size: &str, quantity: i64) -> Result<(), SizeError> {
        let wanted = size.trim().to_ascii_uppercase();
        let slot = self
            .kids
            .iter_mut()
            .chain(self.adult.iter_mut())
            .find(|(name, _)| *name == wanted)
            .ok_or_else(|| SizeError::Unknown(size.trim().to_string()))?;
        slot.1 = quantity.max(0);
        Ok(())
    }

    /// Parse a `SIZE=QUANTITY` entry (as given on the command line) into the sheet.
    pub fn apply_entry(&mut self, entry: &str) -> Result<(), SizeError> {
        let (size, value) = entry
            .split_once('=')
            .ok_or_else(|| SizeError::Malformed(entry.to_string()))?;
        let quantity = value
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|q| *q >= 0)
            .ok_or_else(|| SizeError::BadQuantity {
                size: size.trim().to_string(),
                value: value.trim().to_string(),
            })?;
        self.set(size, quantity)
    }

    pub fn quantity(&self, size: &str) -> Option<i64> {
        self.kids
            .iter()
            .chain(self.adult.iter())
            .find(|(name, _)| name.eq_ignore_ascii_case(size))
            .map(|(_, q)| *q)
    }

    /// Sizes with a quantity above zero, kids first, in catalogue order.
    pub fn selected(&self) -> Vec<(&'static str, i64)> {
        self.kids
            .iter()
            .chain(self.adult.iter())
            .filter(|(_, q)| *q > 0)
            .copied()
            .collect()
    }

    pub fn has_selection(&self) -> bool {
        self.kids.iter().chain(self.adult.iter()).any(|(_, q)| *q > 0)
    }

    /// Total garments across all sizes; this becomes the product quantity.
    pub fn total(&self) -> i64 {
        self.kids.iter().chain(self.adult.iter()).map(|(_, q)| q).sum()
    }

    /// Section to open first: adults when only adult sizes are filled.
    pub fn preferred_section(&self) -> SizeSection {
        let kids = self.kids.iter().any(|(_, q)| *q > 0);
        let adult = self.adult.iter().any(|(_, q)| *q > 0);
        if adult && !kids {
            SizeSection::Adult
        } else {
            SizeSection::Kids
        }
    }

    /// The `sizeQuantities` map sent to the backend (selected sizes only).
    pub fn to_quantities(&self) -> BTreeMap<String, i64> {
        self.selected()
            .into_iter()
            .map(|(name, q)| (name.to_string(), q))
            .collect()
    }
}

/// One row of a size summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeRow {
    pub size: String,
    pub quantity: i64,
}

/// Per-size breakdown of an OP plus its total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SizeSummary {
    pub rows: Vec<SizeRow>,
    pub total: i64,
}

impl SizeSummary {
    /// Summarize a `sizeQuantities` map. Numeric sizes come first in numeric
    /// order, then the rest in lexical order.
    pub fn from_quantities(quantities: &BTreeMap<String, i64>) -> Self {
        let mut rows: Vec<SizeRow> = quantities
            .iter()
            .map(|(size, quantity)| SizeRow { size: size.clone(), quantity: *quantity })
            .collect();
        rows.sort_by(|a, b| compare_sizes(&a.size, &b.size));
        let total = rows.iter().map(|r| r.quantity).sum();
        Self { rows, total }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn compare_sizes(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_totals_and_selection() {
        let mut sheet = SizeSheet::new();
        sheet.set("4", 10).unwrap();
        sheet.set("m", 5).unwrap();
        sheet.set("XL", 0).unwrap();

        assert_eq!(sheet.total(), 15);
        assert_eq!(sheet.selected(), vec![("4", 10), ("M", 5)]);
        assert!(sheet.has_selection());
        assert_eq!(sheet.quantity("M"), Some(5));
        assert_eq!(
            sheet.to_quantities(),
            BTreeMap::from([("4".to_string(), 10), ("M".to_string(), 5)])
        );
    }

    #[test]
    fn test_sheet_rejects_unknown_size() {
        let mut sheet = SizeSheet::new();
        assert_eq!(sheet.set("XXXL", 3), Err(SizeError::Unknown("XXXL".into())));
        assert!(!sheet.has_selection());
    }

    #[test]
    fn test_apply_entry() {
        let mut sheet = SizeSheet::new();
        sheet.apply_entry("S=12").unwrap();
        assert_eq!(sheet.quantity("S"), Some(12));
        assert!(matches!(sheet.apply_entry("S12"), Err(SizeError::Malformed(_))));
        assert!(matches!(sheet.apply_entry("S=-1"), Err(SizeError::BadQuantity { .. })));
        assert!(matches!(sheet.apply_entry("S=abc"), Err(SizeError::BadQuantity { .. })));
    }

    #[test]
    fn test_preferred_section() {
        let mut sheet = SizeSheet::new();
        assert_eq!(sheet.preferred_section(), SizeSection::Kids);
        sheet.set("L", 1).unwrap();
        assert_eq!(sheet.preferred_section(), SizeSection::Adult);
        sheet.set("2", 1).unwrap();
        assert_eq!(sheet.preferred_section(), SizeSection::Kids);
    }

    #[test]
    fn test_from_quantities_drops_unknown() {
        let map = BTreeMap::from([("6".to_string(), 4), ("XXXL".to_string(), 9)]);
        let sheet = SizeSheet::from_quantities(&map);
        assert_eq!(sheet.total(), 4);
    }

    #[test]
    fn test_summary_orders_numeric_then_lexical() {
        let map = BTreeMap::from([
            ("XL".to_string(), 2),
            ("10".to_string(), 5),
            ("2".to_string(), 3),
            ("M".to_string(), 7),
            ("16".to_string(), 1),
        ]);
        let summary = SizeSummary::from_quantities(&map);
        let order: Vec<&str> = summary.rows.iter().map(|r| r.size.as_str()).collect();
        assert_eq!(order, vec!["2", "10", "16", "M", "XL"]);
        assert_eq!(summary.total, 18);
    }

    #[test]
    fn test_empty_summary() {
        let summary = SizeSummary::from_quantities(&BTreeMap::new());
        assert!(summary.is_empty());
        assert_eq!(summary.total, 0);
    }
}
