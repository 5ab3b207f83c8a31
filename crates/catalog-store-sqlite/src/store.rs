//! [`SqliteStore`] — the SQLite implementation of [`CatalogStore`].

use std::path::Path;

use catalog_core::{
  hierarchy::{
    Category, CategoryId, Inserted, ItemId, Manufacturer, ManufacturerId, NewCategory,
    NewManufacturer, NewTrimLevel, TrimLevel, TrimLevelId,
  },
  inventory::{InventoryRow, LinkUpdate, NewInventoryItem},
  report::{HierarchyCounts, HierarchySample, IntegrityCounts, LinkCounts},
  store::{CatalogStore, EntityRef, LockOutcome, RunLock},
};
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    RawChild, RawManufacturer, RawRunLock, decode_dt, encode_dt, encode_uuid,
    inventory_row_from,
  },
  schema::{LINK_COLUMNS, LINK_INDEXES, SCHEMA},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A catalog store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_owned();
    let conn = tokio_rusqlite::Connection::open(&path)
      .await
      .map_err(|e| Error::Connection(format!("{}: {e}", path.display())))?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory()
      .await
      .map_err(|e| Error::Connection(e.to_string()))?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;

        let existing: Vec<String> = {
          let mut stmt = conn.prepare("PRAGMA table_info(inventory_items)")?;
          stmt
            .query_map([], |row| row.get(1))?
            .collect::<rusqlite::Result<_>>()?
        };
        for (column, target) in LINK_COLUMNS {
          if !existing.iter().any(|c| c == column) {
            conn.execute(
              &format!(
                "ALTER TABLE inventory_items ADD COLUMN {column} INTEGER REFERENCES {target}"
              ),
              [],
            )?;
          }
        }

        conn.execute_batch(LINK_INDEXES)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert a row into the application's inventory table. The engine never
  /// calls this; it exists for fixtures and demos.
  pub async fn add_inventory_item(&self, item: NewInventoryItem) -> Result<ItemId> {
    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO inventory_items (manufacturer, category, trim_level)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![item.manufacturer, item.category, item.trim_level],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(ItemId(id))
  }

  /// Flip the active flag of a hierarchy row. Administrative edits live
  /// outside the engine; this is for fixtures.
  pub async fn set_active(&self, entity: EntityRef, active: bool) -> Result<bool> {
    let (table, column, id) = entity_location(entity);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          &format!("UPDATE {table} SET is_active = ?2 WHERE {column} = ?1"),
          rusqlite::params![id, active],
        )?)
      })
      .await?;
    Ok(changed == 1)
  }

  async fn count(&self, sql: &'static str) -> Result<u64> {
    let n: i64 = self
      .conn
      .call(move |conn| Ok(conn.query_row(sql, [], |row| row.get(0))?))
      .await?;
    Ok(n as u64)
  }
}

/// `(table, id column, id)` for an [`EntityRef`].
fn entity_location(entity: EntityRef) -> (&'static str, &'static str, i64) {
  match entity {
    EntityRef::Manufacturer(id) => ("manufacturers", "manufacturer_id", id.0),
    EntityRef::Category(id) => ("categories", "category_id", id.0),
    EntityRef::TrimLevel(id) => ("trim_levels", "trim_level_id", id.0),
  }
}

/// Insert a row unless its name already exists among the active rows of its
/// scope, then return the id holding the name. `None` means the parent row
/// named by `parent_check` does not exist.
fn insert_or_fetch(
  conn:          &mut rusqlite::Connection,
  parent_check:  Option<(&str, i64)>,
  insert_sql:    &str,
  insert_params: &[&dyn rusqlite::ToSql],
  select_sql:    &str,
  select_params: &[&dyn rusqlite::ToSql],
) -> rusqlite::Result<Option<(i64, bool)>> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

  if let Some((sql, parent_id)) = parent_check {
    let exists = tx.query_row(sql, [parent_id], |_| Ok(())).optional()?.is_some();
    if !exists {
      return Ok(None);
    }
  }

  let outcome = if tx.execute(insert_sql, insert_params)? == 1 {
    (tx.last_insert_rowid(), true)
  } else {
    (tx.query_row(select_sql, select_params, |row| row.get(0))?, false)
  };

  tx.commit()?;
  Ok(Some(outcome))
}

// ─── CatalogStore impl ───────────────────────────────────────────────────────

impl CatalogStore for SqliteStore {
  type Error = Error;

  // ── Hierarchy reads ───────────────────────────────────────────────────────

  async fn list_manufacturers(&self) -> Result<Vec<Manufacturer>> {
    let raws: Vec<RawManufacturer> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT manufacturer_id, name_ar, name_en, logo, is_active, created_at
           FROM manufacturers ORDER BY manufacturer_id",
        )?;
        let rows = stmt
          .query_map([], RawManufacturer::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawManufacturer::into_manufacturer).collect()
  }

  async fn list_categories(&self, manufacturer_id: ManufacturerId) -> Result<Vec<Category>> {
    let raws: Vec<RawChild> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT category_id, manufacturer_id, name_ar, name_en, is_active, created_at
           FROM categories WHERE manufacturer_id = ?1 ORDER BY category_id",
        )?;
        let rows = stmt
          .query_map([manufacturer_id.0], RawChild::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawChild::into_category).collect()
  }

  async fn list_trim_levels(&self, category_id: CategoryId) -> Result<Vec<TrimLevel>> {
    let raws: Vec<RawChild> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT trim_level_id, category_id, name_ar, name_en, is_active, created_at
           FROM trim_levels WHERE category_id = ?1 ORDER BY trim_level_id",
        )?;
        let rows = stmt
          .query_map([category_id.0], RawChild::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawChild::into_trim_level).collect()
  }

  // ── Hierarchy writes ──────────────────────────────────────────────────────

  async fn insert_manufacturer(
    &self,
    input: NewManufacturer,
  ) -> Result<Inserted<ManufacturerId>> {
    let at_str = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let names = &input.names;
        Ok(insert_or_fetch(
          conn,
          None,
          "INSERT INTO manufacturers (name_ar, name_en, logo, is_active, created_at)
           VALUES (?1, ?2, ?3, 1, ?4)
           ON CONFLICT DO NOTHING",
          rusqlite::params![names.name_ar, names.name_en, input.logo, at_str],
          "SELECT manufacturer_id FROM manufacturers
           WHERE name_ar = ?1 AND is_active = 1",
          rusqlite::params![names.name_ar],
        )?)
      })
      .await?;

    let (id, created) = outcome
      .ok_or_else(|| Error::IntegrityViolation("manufacturer insert had no outcome".into()))?;
    Ok(Inserted { id: ManufacturerId(id), created })
  }

  async fn insert_category(&self, input: NewCategory) -> Result<Inserted<CategoryId>> {
    let parent = input.manufacturer_id;
    let at_str = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let names = &input.names;
        Ok(insert_or_fetch(
          conn,
          Some(("SELECT 1 FROM manufacturers WHERE manufacturer_id = ?1", parent.0)),
          "INSERT INTO categories (manufacturer_id, name_ar, name_en, is_active, created_at)
           VALUES (?1, ?2, ?3, 1, ?4)
           ON CONFLICT DO NOTHING",
          rusqlite::params![parent.0, names.name_ar, names.name_en, at_str],
          "SELECT category_id FROM categories
           WHERE manufacturer_id = ?1 AND name_ar = ?2 AND is_active = 1",
          rusqlite::params![parent.0, names.name_ar],
        )?)
      })
      .await?;

    let (id, created) = outcome.ok_or_else(|| {
      Error::IntegrityViolation(format!("category parent manufacturer {parent} does not exist"))
    })?;
    Ok(Inserted { id: CategoryId(id), created })
  }

  async fn insert_trim_level(&self, input: NewTrimLevel) -> Result<Inserted<TrimLevelId>> {
    let parent = input.category_id;
    let at_str = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let names = &input.names;
        Ok(insert_or_fetch(
          conn,
          Some(("SELECT 1 FROM categories WHERE category_id = ?1", parent.0)),
          "INSERT INTO trim_levels (category_id, name_ar, name_en, is_active, created_at)
           VALUES (?1, ?2, ?3, 1, ?4)
           ON CONFLICT DO NOTHING",
          rusqlite::params![parent.0, names.name_ar, names.name_en, at_str],
          "SELECT trim_level_id FROM trim_levels
           WHERE category_id = ?1 AND name_ar = ?2 AND is_active = 1",
          rusqlite::params![parent.0, names.name_ar],
        )?)
      })
      .await?;

    let (id, created) = outcome.ok_or_else(|| {
      Error::IntegrityViolation(format!("trim level parent category {parent} does not exist"))
    })?;
    Ok(Inserted { id: TrimLevelId(id), created })
  }

  async fn fill_english_name(&self, entity: EntityRef, name_en: String) -> Result<bool> {
    let (table, column, id) = entity_location(entity);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          &format!(
            "UPDATE {table} SET name_en = ?2
             WHERE {column} = ?1 AND (name_en IS NULL OR TRIM(name_en) = '')"
          ),
          rusqlite::params![id, name_en],
        )?)
      })
      .await?;
    Ok(changed == 1)
  }

  // ── Inventory ─────────────────────────────────────────────────────────────

  async fn list_inventory(&self) -> Result<Vec<InventoryRow>> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT item_id, manufacturer, category, trim_level,
                  manufacturer_id, category_id, trim_level_id
           FROM inventory_items ORDER BY item_id",
        )?;
        let rows = stmt
          .query_map([], inventory_row_from)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn apply_links(&self, updates: Vec<LinkUpdate>) -> Result<u64> {
    if updates.is_empty() {
      return Ok(0);
    }
    if let Some(bad) = updates.iter().find(|u| !u.links.is_prefix_shaped()) {
      return Err(Error::IntegrityViolation(format!(
        "links of item {} skip a level of the hierarchy",
        bad.item_id
      )));
    }

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut written = 0usize;
        {
          let mut stmt = tx.prepare_cached(
            "UPDATE inventory_items
             SET manufacturer_id = ?2, category_id = ?3, trim_level_id = ?4
             WHERE item_id = ?1",
          )?;
          for u in &updates {
            written += stmt.execute(rusqlite::params![
              u.item_id.0,
              u.links.manufacturer_id.map(|id| id.0),
              u.links.category_id.map(|id| id.0),
              u.links.trim_level_id.map(|id| id.0),
            ])?;
          }
        }
        tx.commit()?;
        Ok(written)
      })
      .await?;
    Ok(written as u64)
  }

  // ── Reporting ─────────────────────────────────────────────────────────────

  async fn hierarchy_counts(&self) -> Result<HierarchyCounts> {
    Ok(HierarchyCounts {
      manufacturers: self
        .count("SELECT COUNT(*) FROM manufacturers WHERE is_active = 1")
        .await?,
      categories:    self
        .count("SELECT COUNT(*) FROM categories WHERE is_active = 1")
        .await?,
      trim_levels:   self
        .count("SELECT COUNT(*) FROM trim_levels WHERE is_active = 1")
        .await?,
    })
  }

  async fn link_counts(&self) -> Result<LinkCounts> {
    let (total, m, c, t): (i64, i64, i64, i64) = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*),
                  COUNT(manufacturer_id),
                  COUNT(category_id),
                  COUNT(trim_level_id)
           FROM inventory_items",
          [],
          |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )?)
      })
      .await?;

    Ok(LinkCounts {
      items_total:       total as u64,
      with_manufacturer: m as u64,
      with_category:     c as u64,
      with_trim_level:   t as u64,
    })
  }

  async fn integrity_counts(&self) -> Result<IntegrityCounts> {
    Ok(IntegrityCounts {
      orphan_categories:  self
        .count(
          "SELECT COUNT(*) FROM categories c
           LEFT JOIN manufacturers m ON m.manufacturer_id = c.manufacturer_id
           WHERE m.manufacturer_id IS NULL",
        )
        .await?,
      orphan_trim_levels: self
        .count(
          "SELECT COUNT(*) FROM trim_levels t
           LEFT JOIN categories c ON c.category_id = t.category_id
           WHERE c.category_id IS NULL",
        )
        .await?,
      inconsistent_items: self
        .count(
          "SELECT COUNT(*) FROM inventory_items i
           LEFT JOIN manufacturers m ON m.manufacturer_id = i.manufacturer_id
           LEFT JOIN categories    c ON c.category_id     = i.category_id
           LEFT JOIN trim_levels   t ON t.trim_level_id   = i.trim_level_id
           WHERE (i.manufacturer_id IS NOT NULL AND m.manufacturer_id IS NULL)
              OR (i.category_id IS NOT NULL
                  AND (c.category_id IS NULL
                       OR i.manufacturer_id IS NULL
                       OR c.manufacturer_id != i.manufacturer_id))
              OR (i.trim_level_id IS NOT NULL
                  AND (t.trim_level_id IS NULL
                       OR i.category_id IS NULL
                       OR t.category_id != i.category_id))",
        )
        .await?,
    })
  }

  async fn sample_hierarchy(&self, limit: usize) -> Result<Vec<HierarchySample>> {
    let limit_val = limit as i64;

    let rows: Vec<(String, String, Option<String>, i64)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT m.name_ar, c.name_ar, t.name_ar, COUNT(*) AS item_count
           FROM inventory_items i
           JOIN manufacturers    m ON m.manufacturer_id = i.manufacturer_id
           JOIN categories       c ON c.category_id     = i.category_id
           LEFT JOIN trim_levels t ON t.trim_level_id   = i.trim_level_id
           GROUP BY i.manufacturer_id, i.category_id, i.trim_level_id
           ORDER BY item_count DESC, m.name_ar, c.name_ar, t.name_ar
           LIMIT ?1",
        )?;
        let rows = stmt
          .query_map([limit_val], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      rows
        .into_iter()
        .map(|(manufacturer, category, trim_level, n)| HierarchySample {
          manufacturer,
          category,
          trim_level,
          item_count: n as u64,
        })
        .collect(),
    )
  }

  // ── Run lock ──────────────────────────────────────────────────────────────

  async fn acquire_run_lock(
    &self,
    lock:         RunLock,
    stale_before: DateTime<Utc>,
  ) -> Result<LockOutcome> {
    let run_id_str = encode_uuid(lock.run_id);
    let at_str     = encode_dt(lock.acquired_at);
    let holder     = lock.holder;

    let (taken, existing): (bool, Option<RawRunLock>) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let existing = tx
          .query_row(
            "SELECT run_id, holder, acquired_at FROM catalog_run_lock WHERE lock_id = 1",
            [],
            RawRunLock::from_row,
          )
          .optional()?;

        let stale = match &existing {
          None => true,
          Some(raw) => decode_dt(&raw.acquired_at)
            .map(|at| at < stale_before)
            .unwrap_or(true),
        };

        if stale {
          tx.execute(
            "INSERT INTO catalog_run_lock (lock_id, run_id, holder, acquired_at)
             VALUES (1, ?1, ?2, ?3)
             ON CONFLICT (lock_id) DO UPDATE
               SET run_id = excluded.run_id,
                   holder = excluded.holder,
                   acquired_at = excluded.acquired_at",
            rusqlite::params![run_id_str, holder, at_str],
          )?;
        }
        tx.commit()?;
        Ok((stale, existing))
      })
      .await?;

    match (taken, existing) {
      (true, _) | (false, None) => Ok(LockOutcome::Acquired),
      (false, Some(raw)) => Ok(LockOutcome::Held(raw.into_lock()?)),
    }
  }

  async fn release_run_lock(&self, run_id: Uuid) -> Result<bool> {
    let run_id_str = encode_uuid(run_id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM catalog_run_lock WHERE run_id = ?1",
          rusqlite::params![run_id_str],
        )?)
      })
      .await?;
    Ok(changed == 1)
  }

  async fn current_run_lock(&self) -> Result<Option<RunLock>> {
    let raw: Option<RawRunLock> = self
      .conn
      .call(|conn| {
        Ok(
          conn
            .query_row(
              "SELECT run_id, holder, acquired_at FROM catalog_run_lock WHERE lock_id = 1",
              [],
              RawRunLock::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRunLock::into_lock).transpose()
  }

  async fn clear_run_lock(&self) -> Result<bool> {
    let changed = self
      .conn
      .call(|conn| Ok(conn.execute("DELETE FROM catalog_run_lock", [])?))
      .await?;
    Ok(changed > 0)
  }
}
