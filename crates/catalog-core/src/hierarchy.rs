//! The canonical three-level hierarchy: Manufacturer → Category → TrimLevel.
//!
//! Every entity is identified by its integer row id. A category's identity is
//! the pair (manufacturer id, Arabic name); a trim level's is (category id,
//! Arabic name). Parent ids never change once a row exists.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::{Error, Result, matcher::clean_label};

// ─── Identifiers ─────────────────────────────────────────────────────────────

macro_rules! row_id {
  ($(#[$meta:meta])* $name:ident) => {
    $(#[$meta])*
    #[derive(
      Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    )]
    #[serde(transparent)]
    pub struct $name(pub i64);

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
    }
  };
}

row_id!(
  /// Row id of a [`Manufacturer`].
  ManufacturerId
);
row_id!(
  /// Row id of a [`Category`].
  CategoryId
);
row_id!(
  /// Row id of a [`TrimLevel`].
  TrimLevelId
);
row_id!(
  /// Row id of an inventory item. Owned by the surrounding application.
  ItemId
);

// ─── Levels ──────────────────────────────────────────────────────────────────

/// One of the three hierarchy levels.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Level {
  Manufacturer,
  Category,
  TrimLevel,
}

// ─── Entities ────────────────────────────────────────────────────────────────

/// Anything the [`NameMatcher`](crate::matcher::NameMatcher) can match against.
pub trait Named {
  fn name_ar(&self) -> &str;
  fn name_en(&self) -> Option<&str>;
  fn is_active(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manufacturer {
  pub manufacturer_id: ManufacturerId,
  pub name_ar:         String,
  pub name_en:         Option<String>,
  pub logo:            Option<String>,
  pub is_active:       bool,
  pub created_at:      DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
  pub category_id:     CategoryId,
  /// Owning manufacturer; immutable once set.
  pub manufacturer_id: ManufacturerId,
  pub name_ar:         String,
  pub name_en:         Option<String>,
  pub is_active:       bool,
  pub created_at:      DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrimLevel {
  pub trim_level_id: TrimLevelId,
  /// Owning category; immutable once set.
  pub category_id:   CategoryId,
  pub name_ar:       String,
  pub name_en:       Option<String>,
  pub is_active:     bool,
  pub created_at:    DateTime<Utc>,
}

macro_rules! impl_named {
  ($($ty:ty),*) => {
    $(
      impl Named for $ty {
        fn name_ar(&self) -> &str { &self.name_ar }
        fn name_en(&self) -> Option<&str> { self.name_en.as_deref() }
        fn is_active(&self) -> bool { self.is_active }
      }
    )*
  };
}

impl_named!(Manufacturer, Category, TrimLevel);

// ─── Insert inputs ───────────────────────────────────────────────────────────

/// The names shared by every insert input. Both are trimmed on construction
/// and an empty English name collapses to `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityNames {
  pub name_ar: String,
  pub name_en: Option<String>,
}

impl EntityNames {
  pub fn new(level: Level, name_ar: &str, name_en: Option<&str>) -> Result<Self> {
    let name_ar = clean_label(Some(name_ar)).ok_or(Error::EmptyName(level))?;
    let name_en = clean_label(name_en);
    Ok(Self { name_ar: name_ar.to_owned(), name_en: name_en.map(str::to_owned) })
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewManufacturer {
  pub names: EntityNames,
  pub logo:  Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
  pub manufacturer_id: ManufacturerId,
  pub names:           EntityNames,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTrimLevel {
  pub category_id: CategoryId,
  pub names:       EntityNames,
}

/// Outcome of an insert-or-fetch: the id of the row now holding the name in
/// its scope, and whether this call created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inserted<Id> {
  pub id:      Id,
  pub created: bool,
}
