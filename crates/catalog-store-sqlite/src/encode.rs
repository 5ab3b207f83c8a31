//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, UUIDs as hyphenated lowercase
//! strings, row ids as plain integers.

use catalog_core::{
  hierarchy::{
    Category, CategoryId, ItemId, Manufacturer, ManufacturerId, TrimLevel, TrimLevelId,
  },
  inventory::{InventoryRow, ItemLinks},
  store::RunLock,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Raw row types ────────────────────────────────────────────────────────────

pub struct RawManufacturer {
  pub manufacturer_id: i64,
  pub name_ar:         String,
  pub name_en:         Option<String>,
  pub logo:            Option<String>,
  pub is_active:       bool,
  pub created_at:      String,
}

impl RawManufacturer {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      manufacturer_id: row.get(0)?,
      name_ar:         row.get(1)?,
      name_en:         row.get(2)?,
      logo:            row.get(3)?,
      is_active:       row.get(4)?,
      created_at:      row.get(5)?,
    })
  }

  pub fn into_manufacturer(self) -> Result<Manufacturer> {
    Ok(Manufacturer {
      manufacturer_id: ManufacturerId(self.manufacturer_id),
      name_ar:         self.name_ar,
      name_en:         self.name_en,
      logo:            self.logo,
      is_active:       self.is_active,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

/// Categories and trim levels share a shape: id, parent id, names.
pub struct RawChild {
  pub id:         i64,
  pub parent_id:  i64,
  pub name_ar:    String,
  pub name_en:    Option<String>,
  pub is_active:  bool,
  pub created_at: String,
}

impl RawChild {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      parent_id:  row.get(1)?,
      name_ar:    row.get(2)?,
      name_en:    row.get(3)?,
      is_active:  row.get(4)?,
      created_at: row.get(5)?,
    })
  }

  pub fn into_category(self) -> Result<Category> {
    Ok(Category {
      category_id:     CategoryId(self.id),
      manufacturer_id: ManufacturerId(self.parent_id),
      name_ar:         self.name_ar,
      name_en:         self.name_en,
      is_active:       self.is_active,
      created_at:      decode_dt(&self.created_at)?,
    })
  }

  pub fn into_trim_level(self) -> Result<TrimLevel> {
    Ok(TrimLevel {
      trim_level_id: TrimLevelId(self.id),
      category_id:   CategoryId(self.parent_id),
      name_ar:       self.name_ar,
      name_en:       self.name_en,
      is_active:     self.is_active,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

pub fn inventory_row_from(row: &rusqlite::Row<'_>) -> rusqlite::Result<InventoryRow> {
  Ok(InventoryRow {
    item_id:      ItemId(row.get(0)?),
    manufacturer: row.get(1)?,
    category:     row.get(2)?,
    trim_level:   row.get(3)?,
    links:        ItemLinks {
      manufacturer_id: row.get::<_, Option<i64>>(4)?.map(ManufacturerId),
      category_id:     row.get::<_, Option<i64>>(5)?.map(CategoryId),
      trim_level_id:   row.get::<_, Option<i64>>(6)?.map(TrimLevelId),
    },
  })
}

pub struct RawRunLock {
  pub run_id:      String,
  pub holder:      String,
  pub acquired_at: String,
}

impl RawRunLock {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { run_id: row.get(0)?, holder: row.get(1)?, acquired_at: row.get(2)? })
  }

  pub fn into_lock(self) -> Result<RunLock> {
    Ok(RunLock {
      run_id:      decode_uuid(&self.run_id)?,
      holder:      self.holder,
      acquired_at: decode_dt(&self.acquired_at)?,
    })
  }
}
