//! HierarchyBuilder: upsert the canonical hierarchy level by level.
//!
//! Manufacturers are fully resolved before any category is touched, and
//! categories before any trim level, because a child cannot be created until
//! its parent's id is known. Every label is looked up before it is inserted,
//! so a second pass over unchanged labels inserts nothing.

use std::collections::{BTreeMap, BTreeSet};

use catalog_core::{
  hierarchy::{CategoryId, EntityNames, Level, ManufacturerId},
  stage::Stage,
  store::{CatalogStore, EntityRef},
  summary::CreatedCounts,
};
use tracing::debug;

use crate::{
  Error, Result,
  error::AtStage as _,
  repository::HierarchyRepository,
};

/// Manufacturer label → id, as resolved by [`build_manufacturers`].
pub type ManufacturerIds = BTreeMap<String, ManufacturerId>;

/// (manufacturer label, category label) → id, as resolved by
/// [`build_categories`].
pub type CategoryIds = BTreeMap<(String, String), CategoryId>;

fn canonical_names<S: CatalogStore>(
  repo:  &HierarchyRepository<'_, S>,
  level: Level,
  label: &str,
  stage: Stage,
) -> Result<EntityNames> {
  repo
    .matcher()
    .aliases()
    .canonical_names(level, label)
    .map_err(|e| Error::Logic { stage, detail: e.to_string() })
}

pub async fn build_manufacturers<S: CatalogStore>(
  repo:    &mut HierarchyRepository<'_, S>,
  labels:  &BTreeSet<String>,
  created: &mut CreatedCounts,
) -> Result<ManufacturerIds> {
  let stage = Stage::BuildingManufacturers;
  let mut ids = ManufacturerIds::new();

  for label in labels {
    let id = match repo.find_manufacturer_by_name(label).await.at(stage)? {
      Some(existing) => {
        let entity = EntityRef::Manufacturer(existing.manufacturer_id);
        if repo
          .fill_english_name(entity, &existing.name_ar, existing.name_en.as_deref())
          .await
          .at(stage)?
        {
          created.english_names_backfilled += 1;
        }
        existing.manufacturer_id
      }
      None => {
        let names = canonical_names(repo, Level::Manufacturer, label, stage)?;
        let inserted = repo.insert_manufacturer(names).await.at(stage)?;
        if inserted.created {
          created.manufacturers += 1;
          debug!(id = %inserted.id, label, "created manufacturer");
        }
        inserted.id
      }
    };
    ids.insert(label.clone(), id);
  }

  Ok(ids)
}

pub async fn build_categories<S: CatalogStore>(
  repo:          &mut HierarchyRepository<'_, S>,
  pairs:         &BTreeSet<(String, String)>,
  manufacturers: &ManufacturerIds,
  created:       &mut CreatedCounts,
) -> Result<CategoryIds> {
  let stage = Stage::BuildingCategories;
  let mut ids = CategoryIds::new();

  for (manufacturer, category) in pairs {
    let manufacturer_id = *manufacturers.get(manufacturer).ok_or_else(|| Error::Logic {
      stage,
      detail: format!("manufacturer {manufacturer:?} was not resolved before its categories"),
    })?;

    let id = match repo
      .find_category_by_name(manufacturer_id, category)
      .await
      .at(stage)?
    {
      Some(existing) => {
        let entity = EntityRef::Category(existing.category_id);
        if repo
          .fill_english_name(entity, &existing.name_ar, existing.name_en.as_deref())
          .await
          .at(stage)?
        {
          created.english_names_backfilled += 1;
        }
        existing.category_id
      }
      None => {
        let names = canonical_names(repo, Level::Category, category, stage)?;
        let inserted = repo.insert_category(manufacturer_id, names).await.at(stage)?;
        if inserted.created {
          created.categories += 1;
          debug!(id = %inserted.id, %manufacturer_id, label = category, "created category");
        }
        inserted.id
      }
    };
    ids.insert((manufacturer.clone(), category.clone()), id);
  }

  Ok(ids)
}

pub async fn build_trim_levels<S: CatalogStore>(
  repo:       &mut HierarchyRepository<'_, S>,
  triples:    &BTreeSet<(String, String, String)>,
  categories: &CategoryIds,
  created:    &mut CreatedCounts,
) -> Result<()> {
  let stage = Stage::BuildingTrimLevels;

  for (manufacturer, category, trim_level) in triples {
    let key = (manufacturer.clone(), category.clone());
    let category_id = *categories.get(&key).ok_or_else(|| Error::Logic {
      stage,
      detail: format!(
        "category {category:?} of {manufacturer:?} was not resolved before its trim levels"
      ),
    })?;

    match repo
      .find_trim_level_by_name(category_id, trim_level)
      .await
      .at(stage)?
    {
      Some(existing) => {
        let entity = EntityRef::TrimLevel(existing.trim_level_id);
        if repo
          .fill_english_name(entity, &existing.name_ar, existing.name_en.as_deref())
          .await
          .at(stage)?
        {
          created.english_names_backfilled += 1;
        }
      }
      None => {
        let names = canonical_names(repo, Level::TrimLevel, trim_level, stage)?;
        let inserted = repo.insert_trim_level(category_id, names).await.at(stage)?;
        if inserted.created {
          created.trim_levels += 1;
          debug!(id = %inserted.id, %category_id, label = trim_level, "created trim level");
        }
      }
    }
  }

  Ok(())
}
