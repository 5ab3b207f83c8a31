//! HierarchyRepository: name lookups and inserts over the three hierarchy
//! tables, scoped by parent.
//!
//! Each scope (all manufacturers, the categories of one manufacturer, the
//! trim levels of one category) is read from the store once and cached for
//! the rest of the run. A created row is appended to its loaded scope; an
//! insert that resolves to a row the cache has never seen drops the scope so
//! the next lookup re-reads it. The engine is the only writer during a run,
//! so the cache never goes stale underneath it.

use std::collections::HashMap;

use chrono::Utc;

use catalog_core::{
  hierarchy::{
    Category, CategoryId, EntityNames, Inserted, Manufacturer, ManufacturerId, NewCategory,
    NewManufacturer, NewTrimLevel, TrimLevel, TrimLevelId,
  },
  matcher::NameMatcher,
  store::{CatalogStore, EntityRef},
};
use tracing::debug;

pub struct HierarchyRepository<'s, S> {
  store:         &'s S,
  matcher:       NameMatcher,
  manufacturers: Option<Vec<Manufacturer>>,
  categories:    HashMap<ManufacturerId, Vec<Category>>,
  trim_levels:   HashMap<CategoryId, Vec<TrimLevel>>,
}

impl<'s, S: CatalogStore> HierarchyRepository<'s, S> {
  pub fn new(store: &'s S, matcher: NameMatcher) -> Self {
    Self {
      store,
      matcher,
      manufacturers: None,
      categories: HashMap::new(),
      trim_levels: HashMap::new(),
    }
  }

  pub fn store(&self) -> &'s S { self.store }

  pub fn matcher(&self) -> &NameMatcher { &self.matcher }

  // ── Lookups ───────────────────────────────────────────────────────────────

  pub async fn find_manufacturer_by_name(
    &mut self,
    label: &str,
  ) -> Result<Option<Manufacturer>, S::Error> {
    if self.manufacturers.is_none() {
      self.manufacturers = Some(self.store.list_manufacturers().await?);
    }
    let scope = self.manufacturers.as_deref().unwrap_or_default();
    Ok(self.matcher.find(scope, label).cloned())
  }

  pub async fn find_category_by_name(
    &mut self,
    manufacturer_id: ManufacturerId,
    label: &str,
  ) -> Result<Option<Category>, S::Error> {
    if !self.categories.contains_key(&manufacturer_id) {
      let rows = self.store.list_categories(manufacturer_id).await?;
      self.categories.insert(manufacturer_id, rows);
    }
    let scope = self.categories.get(&manufacturer_id).map(Vec::as_slice).unwrap_or_default();
    Ok(self.matcher.find(scope, label).cloned())
  }

  pub async fn find_trim_level_by_name(
    &mut self,
    category_id: CategoryId,
    label: &str,
  ) -> Result<Option<TrimLevel>, S::Error> {
    if !self.trim_levels.contains_key(&category_id) {
      let rows = self.store.list_trim_levels(category_id).await?;
      self.trim_levels.insert(category_id, rows);
    }
    let scope = self.trim_levels.get(&category_id).map(Vec::as_slice).unwrap_or_default();
    Ok(self.matcher.find(scope, label).cloned())
  }

  // ── Inserts ───────────────────────────────────────────────────────────────

  pub async fn insert_manufacturer(
    &mut self,
    names: EntityNames,
  ) -> Result<Inserted<ManufacturerId>, S::Error> {
    let inserted = self
      .store
      .insert_manufacturer(NewManufacturer { names: names.clone(), logo: None })
      .await?;
    if let Some(scope) = self.manufacturers.as_mut() {
      if inserted.created {
        scope.push(Manufacturer {
          manufacturer_id: inserted.id,
          name_ar:         names.name_ar,
          name_en:         names.name_en,
          logo:            None,
          is_active:       true,
          created_at:      Utc::now(),
        });
      } else if !scope.iter().any(|m| m.manufacturer_id == inserted.id) {
        self.manufacturers = None;
      }
    }
    Ok(inserted)
  }

  pub async fn insert_category(
    &mut self,
    manufacturer_id: ManufacturerId,
    names: EntityNames,
  ) -> Result<Inserted<CategoryId>, S::Error> {
    let inserted = self
      .store
      .insert_category(NewCategory { manufacturer_id, names: names.clone() })
      .await?;
    if let Some(scope) = self.categories.get_mut(&manufacturer_id) {
      if inserted.created {
        scope.push(Category {
          category_id: inserted.id,
          manufacturer_id,
          name_ar: names.name_ar,
          name_en: names.name_en,
          is_active: true,
          created_at: Utc::now(),
        });
      } else if !scope.iter().any(|c| c.category_id == inserted.id) {
        self.categories.remove(&manufacturer_id);
      }
    }
    Ok(inserted)
  }

  pub async fn insert_trim_level(
    &mut self,
    category_id: CategoryId,
    names: EntityNames,
  ) -> Result<Inserted<TrimLevelId>, S::Error> {
    let inserted = self
      .store
      .insert_trim_level(NewTrimLevel { category_id, names: names.clone() })
      .await?;
    if let Some(scope) = self.trim_levels.get_mut(&category_id) {
      if inserted.created {
        scope.push(TrimLevel {
          trim_level_id: inserted.id,
          category_id,
          name_ar: names.name_ar,
          name_en: names.name_en,
          is_active: true,
          created_at: Utc::now(),
        });
      } else if !scope.iter().any(|t| t.trim_level_id == inserted.id) {
        self.trim_levels.remove(&category_id);
      }
    }
    Ok(inserted)
  }

  /// Give an existing row its English name from the alias book if it has
  /// none. Returns whether a name was written.
  pub async fn fill_english_name(
    &mut self,
    entity: EntityRef,
    name_ar: &str,
    name_en: Option<&str>,
  ) -> Result<bool, S::Error> {
    if name_en.is_some_and(|n| !n.trim().is_empty()) {
      return Ok(false);
    }
    let Some(english) = self.matcher.aliases().english_for(name_ar).map(str::to_owned)
    else {
      return Ok(false);
    };
    if !self.store.fill_english_name(entity, english.clone()).await? {
      return Ok(false);
    }
    debug!(level = %entity.level(), name_ar, name_en = %english, "filled english name");

    let english = Some(english);
    match entity {
      EntityRef::Manufacturer(id) => self
        .manufacturers
        .iter_mut()
        .flatten()
        .filter(|m| m.manufacturer_id == id)
        .for_each(|m| m.name_en.clone_from(&english)),
      EntityRef::Category(id) => self
        .categories
        .values_mut()
        .flatten()
        .filter(|c| c.category_id == id)
        .for_each(|c| c.name_en.clone_from(&english)),
      EntityRef::TrimLevel(id) => self
        .trim_levels
        .values_mut()
        .flatten()
        .filter(|t| t.trim_level_id == id)
        .for_each(|t| t.name_en.clone_from(&english)),
    }
    Ok(true)
  }
}
