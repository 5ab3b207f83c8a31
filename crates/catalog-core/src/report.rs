//! Read-only consistency report produced after a backfill.

use serde::{Deserialize, Serialize};

/// Active rows per hierarchy level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyCounts {
  pub manufacturers: u64,
  pub categories:    u64,
  pub trim_levels:   u64,
}

/// How many inventory rows carry links.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCounts {
  pub items_total:       u64,
  pub with_manufacturer: u64,
  pub with_category:     u64,
  pub with_trim_level:   u64,
}

/// Violations of the referential rules. All zero on a healthy store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityCounts {
  /// Categories whose manufacturer row is missing.
  pub orphan_categories:  u64,
  /// Trim levels whose category row is missing.
  pub orphan_trim_levels: u64,
  /// Items whose trim level, category and manufacturer ids disagree, or whose
  /// links are not a prefix of the chain.
  pub inconsistent_items: u64,
}

impl IntegrityCounts {
  pub fn is_clean(&self) -> bool {
    self.orphan_categories == 0
      && self.orphan_trim_levels == 0
      && self.inconsistent_items == 0
  }
}

/// One fully joined (manufacturer, category, trim level) tuple with the
/// number of items linked to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchySample {
  pub manufacturer: String,
  pub category:     String,
  pub trim_level:   Option<String>,
  pub item_count:   u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyReport {
  pub hierarchy: HierarchyCounts,
  pub links:     LinkCounts,
  pub integrity: IntegrityCounts,
  pub sample:    Vec<HierarchySample>,
}
