//! The `CatalogStore` trait: the relational store as the engine sees it.
//!
//! Implemented by storage backends (e.g. `catalog-store-sqlite`). The engine
//! and the API depend on this abstraction, not on a concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  hierarchy::{
    Category, CategoryId, Inserted, Level, Manufacturer, ManufacturerId,
    NewCategory, NewManufacturer, NewTrimLevel, TrimLevel, TrimLevelId,
  },
  inventory::{InventoryRow, LinkUpdate},
  report::{HierarchyCounts, HierarchySample, IntegrityCounts, LinkCounts},
};

// ─── Error classification ────────────────────────────────────────────────────

/// Coarse failure classes the engine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
  /// The store is unreachable.
  Connection,
  /// A write referenced a missing parent or broke a constraint.
  Integrity,
  Other,
}

/// Implemented by store error types so callers can classify failures without
/// knowing the backend.
pub trait Classify {
  fn class(&self) -> ErrorClass;
}

// ─── Supporting types ────────────────────────────────────────────────────────

/// A typed reference to one hierarchy row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "level", content = "id", rename_all = "snake_case")]
pub enum EntityRef {
  Manufacturer(ManufacturerId),
  Category(CategoryId),
  TrimLevel(TrimLevelId),
}

impl EntityRef {
  pub fn level(&self) -> Level {
    match self {
      Self::Manufacturer(_) => Level::Manufacturer,
      Self::Category(_) => Level::Category,
      Self::TrimLevel(_) => Level::TrimLevel,
    }
  }
}

/// The holder of the single-flight run lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLock {
  pub run_id:      Uuid,
  pub holder:      String,
  pub acquired_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockOutcome {
  Acquired,
  /// Someone else holds a lock that is not stale.
  Held(RunLock),
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the relational store holding the hierarchy tables and
/// the application's inventory table.
///
/// Inserts are insert-or-fetch: inserting a name that already exists among
/// the active rows of its scope returns the existing row's id with
/// `created == false` instead of producing a second row.
pub trait CatalogStore: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  // ── Hierarchy reads ───────────────────────────────────────────────────

  /// All manufacturers, active or not, ordered by id.
  fn list_manufacturers(
    &self,
  ) -> impl Future<Output = Result<Vec<Manufacturer>, Self::Error>> + Send + '_;

  /// All categories of one manufacturer, ordered by id.
  fn list_categories(
    &self,
    manufacturer_id: ManufacturerId,
  ) -> impl Future<Output = Result<Vec<Category>, Self::Error>> + Send + '_;

  /// All trim levels of one category, ordered by id.
  fn list_trim_levels(
    &self,
    category_id: CategoryId,
  ) -> impl Future<Output = Result<Vec<TrimLevel>, Self::Error>> + Send + '_;

  // ── Hierarchy writes ──────────────────────────────────────────────────

  fn insert_manufacturer(
    &self,
    input: NewManufacturer,
  ) -> impl Future<Output = Result<Inserted<ManufacturerId>, Self::Error>> + Send + '_;

  /// Fails with an integrity error if the manufacturer does not exist.
  fn insert_category(
    &self,
    input: NewCategory,
  ) -> impl Future<Output = Result<Inserted<CategoryId>, Self::Error>> + Send + '_;

  /// Fails with an integrity error if the category does not exist.
  fn insert_trim_level(
    &self,
    input: NewTrimLevel,
  ) -> impl Future<Output = Result<Inserted<TrimLevelId>, Self::Error>> + Send + '_;

  /// Set the English name of a row whose English name is currently absent.
  /// Returns `false` if the row already had one (or does not exist).
  fn fill_english_name(
    &self,
    entity: EntityRef,
    name_en: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Inventory ─────────────────────────────────────────────────────────

  /// Every inventory row with its text labels and current links.
  fn list_inventory(
    &self,
  ) -> impl Future<Output = Result<Vec<InventoryRow>, Self::Error>> + Send + '_;

  /// Write all three link columns of each item, one update per item, in a
  /// single transaction. Returns the number of rows written.
  fn apply_links(
    &self,
    updates: Vec<LinkUpdate>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Reporting ─────────────────────────────────────────────────────────

  fn hierarchy_counts(
    &self,
  ) -> impl Future<Output = Result<HierarchyCounts, Self::Error>> + Send + '_;

  fn link_counts(
    &self,
  ) -> impl Future<Output = Result<LinkCounts, Self::Error>> + Send + '_;

  fn integrity_counts(
    &self,
  ) -> impl Future<Output = Result<IntegrityCounts, Self::Error>> + Send + '_;

  /// The `limit` most-populated (manufacturer, category, trim level) tuples.
  fn sample_hierarchy(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<HierarchySample>, Self::Error>> + Send + '_;

  // ── Run lock ──────────────────────────────────────────────────────────

  /// Take the run lock unless someone holds one acquired after
  /// `stale_before`. Stale locks are taken over.
  fn acquire_run_lock(
    &self,
    lock: RunLock,
    stale_before: DateTime<Utc>,
  ) -> impl Future<Output = Result<LockOutcome, Self::Error>> + Send + '_;

  /// Release the lock if `run_id` holds it. Returns whether it was held.
  fn release_run_lock(
    &self,
    run_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn current_run_lock(
    &self,
  ) -> impl Future<Output = Result<Option<RunLock>, Self::Error>> + Send + '_;

  /// Remove any lock regardless of holder. Returns whether one existed.
  fn clear_run_lock(
    &self,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
