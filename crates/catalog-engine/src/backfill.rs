//! InventoryBackfiller: link every inventory row to the hierarchy by id.
//!
//! Resolution walks the chain manufacturer → category → trim level and stops
//! at the first level that cannot be resolved, so the stored links are always
//! a consistent prefix of the chain. A missing trim level is normal; a missing
//! manufacturer or category leaves the item unresolved, which is reported and
//! never fatal.

use catalog_core::{
  hierarchy::{ItemId, Level},
  inventory::{InventoryRow, ItemLinks, LinkUpdate},
  stage::Stage,
  store::CatalogStore,
  summary::{BackfillSummary, UnresolvedReason, UnresolvedReference},
};
use tracing::warn;

use crate::{Result, error::AtStage as _, repository::HierarchyRepository};

/// Where resolution of one item ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
  pub links:      ItemLinks,
  /// Set when resolution stopped short of the manufacturer/category pair,
  /// or when trim level text was present but matched nothing.
  pub unresolved: Option<UnresolvedReference>,
}

impl Resolution {
  /// Both manufacturer and category are linked.
  pub fn is_resolved(&self) -> bool {
    self.links.manufacturer_id.is_some() && self.links.category_id.is_some()
  }
}

fn stopped(
  item_id: ItemId,
  links: ItemLinks,
  level: Level,
  text: Option<&str>,
) -> Resolution {
  let reason = match text {
    Some(_) => UnresolvedReason::NoMatch,
    None => UnresolvedReason::MissingText,
  };
  Resolution {
    links,
    unresolved: Some(UnresolvedReference {
      item_id,
      level,
      text: text.map(str::to_owned),
      reason,
    }),
  }
}

/// Resolve one row against the hierarchy.
pub async fn resolve_item<S: CatalogStore>(
  repo: &mut HierarchyRepository<'_, S>,
  row:  &InventoryRow,
) -> Result<Resolution> {
  let stage = Stage::Backfilling;
  let labels = row.labels();
  let id = row.item_id;
  let mut links = ItemLinks::NONE;

  let Some(m_label) = labels.manufacturer else {
    return Ok(stopped(id, links, Level::Manufacturer, None));
  };
  let Some(manufacturer) = repo.find_manufacturer_by_name(m_label).await.at(stage)? else {
    return Ok(stopped(id, links, Level::Manufacturer, Some(m_label)));
  };
  links.manufacturer_id = Some(manufacturer.manufacturer_id);

  let Some(c_label) = labels.category else {
    return Ok(stopped(id, links, Level::Category, None));
  };
  let Some(category) = repo
    .find_category_by_name(manufacturer.manufacturer_id, c_label)
    .await
    .at(stage)?
  else {
    return Ok(stopped(id, links, Level::Category, Some(c_label)));
  };
  links.category_id = Some(category.category_id);

  let Some(t_label) = labels.trim_level else {
    return Ok(Resolution { links, unresolved: None });
  };
  match repo
    .find_trim_level_by_name(category.category_id, t_label)
    .await
    .at(stage)?
  {
    Some(trim_level) => {
      links.trim_level_id = Some(trim_level.trim_level_id);
      Ok(Resolution { links, unresolved: None })
    }
    None => Ok(stopped(id, links, Level::TrimLevel, Some(t_label))),
  }
}

/// Re-scan the inventory and write the links of every item whose stored
/// links differ from the resolved ones.
#[tracing::instrument(skip(repo))]
pub async fn backfill<S: CatalogStore>(
  repo:       &mut HierarchyRepository<'_, S>,
  batch_size: usize,
) -> Result<BackfillSummary> {
  let stage = Stage::Backfilling;
  let store = repo.store();
  let rows = store.list_inventory().await.at(stage)?;

  let batch_size = batch_size.max(1);
  let mut summary = BackfillSummary { items_total: rows.len() as u64, ..Default::default() };
  let mut pending: Vec<LinkUpdate> = Vec::with_capacity(batch_size);

  for row in &rows {
    let resolution = resolve_item(repo, row).await?;

    if resolution.is_resolved() {
      summary.items_resolved += 1;
      if row.labels().trim_level.is_none() {
        summary.items_without_trim_level += 1;
      }
    } else {
      summary.items_unresolved += 1;
    }

    if let Some(reference) = resolution.unresolved {
      if let Some(text) = &reference.text {
        warn!(
          item_id = %reference.item_id,
          level = %reference.level,
          text = %text,
          "unresolved reference"
        );
      }
      summary.record_unresolved(reference);
    }

    if resolution.links == row.links {
      summary.items_unchanged += 1;
      continue;
    }
    pending.push(LinkUpdate { item_id: row.item_id, links: resolution.links });
    if pending.len() >= batch_size {
      summary.items_updated += store.apply_links(std::mem::take(&mut pending)).await.at(stage)?;
    }
  }

  if !pending.is_empty() {
    summary.items_updated += store.apply_links(pending).await.at(stage)?;
  }

  tracing::info!(
    total = summary.items_total,
    resolved = summary.items_resolved,
    unresolved = summary.items_unresolved,
    updated = summary.items_updated,
    "backfill complete"
  );
  Ok(summary)
}
