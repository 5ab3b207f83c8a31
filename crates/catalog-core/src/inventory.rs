//! The slice of the application's inventory table the engine reads and writes.
//!
//! The free-text columns stay the legacy source of truth. The three id
//! columns are derived by the backfill and never edited by hand.

use serde::{Deserialize, Serialize};

use crate::{
  hierarchy::{CategoryId, ItemId, ManufacturerId, TrimLevelId},
  matcher::clean_label,
};

/// The derived foreign keys of one inventory item.
///
/// Always a prefix of the chain manufacturer → category → trim level: a trim
/// level implies a category, and a category implies a manufacturer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemLinks {
  pub manufacturer_id: Option<ManufacturerId>,
  pub category_id:     Option<CategoryId>,
  pub trim_level_id:   Option<TrimLevelId>,
}

impl ItemLinks {
  pub const NONE: Self =
    Self { manufacturer_id: None, category_id: None, trim_level_id: None };

  pub fn is_prefix_shaped(&self) -> bool {
    let trim_ok = self.trim_level_id.is_none() || self.category_id.is_some();
    let cat_ok = self.category_id.is_none() || self.manufacturer_id.is_some();
    trim_ok && cat_ok
  }
}

/// One inventory row as read by the extractor and the backfiller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRow {
  pub item_id:      ItemId,
  pub manufacturer: Option<String>,
  pub category:     Option<String>,
  pub trim_level:   Option<String>,
  /// The links currently stored on the row.
  pub links:        ItemLinks,
}

/// Trimmed, non-empty labels of an [`InventoryRow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemLabels<'a> {
  pub manufacturer: Option<&'a str>,
  pub category:     Option<&'a str>,
  pub trim_level:   Option<&'a str>,
}

impl InventoryRow {
  pub fn labels(&self) -> ItemLabels<'_> {
    ItemLabels {
      manufacturer: clean_label(self.manufacturer.as_deref()),
      category:     clean_label(self.category.as_deref()),
      trim_level:   clean_label(self.trim_level.as_deref()),
    }
  }
}

/// Input for seeding an inventory row (tests, fixtures, demos).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInventoryItem {
  pub manufacturer: Option<String>,
  pub category:     Option<String>,
  pub trim_level:   Option<String>,
}

impl NewInventoryItem {
  pub fn new(manufacturer: &str, category: &str, trim_level: Option<&str>) -> Self {
    Self {
      manufacturer: Some(manufacturer.to_owned()),
      category:     Some(category.to_owned()),
      trim_level:   trim_level.map(str::to_owned),
    }
  }
}

/// A write of all three link columns of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkUpdate {
  pub item_id: ItemId,
  pub links:   ItemLinks,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn labels_drop_blank_fields() {
    let row = InventoryRow {
      item_id:      ItemId(1),
      manufacturer: Some(" Mercedes ".into()),
      category:     Some("".into()),
      trim_level:   None,
      links:        ItemLinks::NONE,
    };
    let labels = row.labels();
    assert_eq!(labels.manufacturer, Some("Mercedes"));
    assert_eq!(labels.category, None);
    assert_eq!(labels.trim_level, None);
  }

  #[test]
  fn prefix_shape() {
    assert!(ItemLinks::NONE.is_prefix_shaped());
    let manufacturer_only =
      ItemLinks { manufacturer_id: Some(ManufacturerId(1)), ..ItemLinks::NONE };
    assert!(manufacturer_only.is_prefix_shaped());
    let dangling_trim = ItemLinks {
      manufacturer_id: Some(ManufacturerId(1)),
      category_id:     None,
      trim_level_id:   Some(TrimLevelId(4)),
    };
    assert!(!dangling_trim.is_prefix_shaped());
  }
}
