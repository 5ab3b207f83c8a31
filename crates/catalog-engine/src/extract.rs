//! DistinctExtractor: the label tuples actually in use in the inventory.

use std::collections::BTreeSet;

use catalog_core::{inventory::InventoryRow, stage::Stage, store::CatalogStore};

use crate::{Result, error::AtStage as _};

/// Distinct cleaned labels, in lexicographic order so logs diff cleanly
/// between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistinctLabels {
  pub manufacturers: BTreeSet<String>,
  pub categories:    BTreeSet<(String, String)>,
  pub trim_levels:   BTreeSet<(String, String, String)>,
}

impl DistinctLabels {
  /// Collect from rows. A tuple is only recorded when every field in it is
  /// non-blank after trimming; a row without a trim level still contributes
  /// its manufacturer and category.
  pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a InventoryRow>) -> Self {
    let mut labels = Self::default();
    for row in rows {
      let l = row.labels();
      let Some(m) = l.manufacturer else { continue };
      labels.manufacturers.insert(m.to_owned());

      let Some(c) = l.category else { continue };
      labels.categories.insert((m.to_owned(), c.to_owned()));

      if let Some(t) = l.trim_level {
        labels.trim_levels.insert((m.to_owned(), c.to_owned(), t.to_owned()));
      }
    }
    labels
  }
}

/// Scan the inventory table once and collect its distinct labels.
#[tracing::instrument(skip_all)]
pub async fn extract<S: CatalogStore>(store: &S) -> Result<DistinctLabels> {
  let rows = store.list_inventory().await.at(Stage::Extracting)?;
  let labels = DistinctLabels::from_rows(&rows);
  tracing::info!(
    rows = rows.len(),
    manufacturers = labels.manufacturers.len(),
    categories = labels.categories.len(),
    trim_levels = labels.trim_levels.len(),
    "extracted distinct labels"
  );
  Ok(labels)
}

#[cfg(test)]
mod tests {
  use catalog_core::{hierarchy::ItemId, inventory::ItemLinks};

  use super::*;

  fn row(id: i64, m: Option<&str>, c: Option<&str>, t: Option<&str>) -> InventoryRow {
    InventoryRow {
      item_id:      ItemId(id),
      manufacturer: m.map(str::to_owned),
      category:     c.map(str::to_owned),
      trim_level:   t.map(str::to_owned),
      links:        ItemLinks::NONE,
    }
  }

  #[test]
  fn trailing_space_collapses_to_one_tuple() {
    let rows = [
      row(1, Some("Mercedes"), Some("C-Class"), None),
      row(2, Some("Mercedes"), Some("C-Class "), None),
    ];
    let labels = DistinctLabels::from_rows(&rows);
    assert_eq!(labels.manufacturers.len(), 1);
    assert_eq!(labels.categories.len(), 1);
    assert!(labels.trim_levels.is_empty());
  }

  #[test]
  fn blank_fields_stop_the_tuple() {
    let rows = [
      row(1, Some("Kia"), Some(""), Some("EX")),
      row(2, None, Some("Rio"), Some("LX")),
      row(3, Some("  "), None, None),
    ];
    let labels = DistinctLabels::from_rows(&rows);
    assert_eq!(labels.manufacturers.iter().collect::<Vec<_>>(), ["Kia"]);
    assert!(labels.categories.is_empty());
    assert!(labels.trim_levels.is_empty());
  }

  #[test]
  fn tuples_are_sorted() {
    let rows = [
      row(1, Some("Toyota"), Some("Corolla"), None),
      row(2, Some("Toyota"), Some("Camry"), Some("XLE")),
      row(3, Some("Toyota"), Some("Camry"), Some("LE")),
      row(4, Some("Audi"), Some("A4"), None),
    ];
    let labels = DistinctLabels::from_rows(&rows);
    let manufacturers: Vec<_> = labels.manufacturers.iter().map(String::as_str).collect();
    assert_eq!(manufacturers, ["Audi", "Toyota"]);
    let trims: Vec<_> = labels.trim_levels.iter().map(|(_, _, t)| t.as_str()).collect();
    assert_eq!(trims, ["LE", "XLE"]);
  }
}
