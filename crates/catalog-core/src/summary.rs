//! The structured result of a run, returned to whoever triggered it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  hierarchy::{ItemId, Level},
  report::ConsistencyReport,
  stage::Stage,
};

/// Hierarchy rows created by the builder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedCounts {
  pub manufacturers:            u64,
  pub categories:               u64,
  pub trim_levels:              u64,
  /// Existing rows that gained an English name from the alias book.
  pub english_names_backfilled: u64,
}

impl CreatedCounts {
  pub fn total(&self) -> u64 { self.manufacturers + self.categories + self.trim_levels }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
  /// The item's text for this level is null or blank.
  MissingText,
  /// The text is present but no hierarchy entity matches it.
  NoMatch,
}

/// An item whose text could not be linked at `level`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedReference {
  pub item_id: ItemId,
  pub level:   Level,
  pub text:    Option<String>,
  pub reason:  UnresolvedReason,
}

/// Unresolved items keyed by the level at which resolution stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedCounts {
  pub manufacturer: u64,
  pub category:     u64,
  pub trim_level:   u64,
}

impl UnresolvedCounts {
  pub fn get(&self, level: Level) -> u64 {
    match level {
      Level::Manufacturer => self.manufacturer,
      Level::Category => self.category,
      Level::TrimLevel => self.trim_level,
    }
  }

  fn bump(&mut self, level: Level) {
    match level {
      Level::Manufacturer => self.manufacturer += 1,
      Level::Category => self.category += 1,
      Level::TrimLevel => self.trim_level += 1,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackfillSummary {
  pub items_total:              u64,
  /// Items with both manufacturer and category linked.
  pub items_resolved:           u64,
  /// Items missing a manufacturer or category link.
  pub items_unresolved:         u64,
  /// Items whose stored links were rewritten.
  pub items_updated:            u64,
  pub items_unchanged:          u64,
  /// Resolved items that legitimately carry no trim level.
  pub items_without_trim_level: u64,
  pub unresolved_by_level:      UnresolvedCounts,
  /// Items whose text was present but matched nothing.
  pub unresolved:               Vec<UnresolvedReference>,
}

impl BackfillSummary {
  pub fn record_unresolved(&mut self, reference: UnresolvedReference) {
    self.unresolved_by_level.bump(reference.level);
    if reference.reason == UnresolvedReason::NoMatch {
      self.unresolved.push(reference);
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepTiming {
  pub stage:      Stage,
  pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
  pub run_id:      Uuid,
  pub started_at:  DateTime<Utc>,
  pub finished_at: DateTime<Utc>,
  pub stage:       Stage,
  pub created:     CreatedCounts,
  pub backfill:    BackfillSummary,
  pub timings:     Vec<StepTiming>,
  pub report:      ConsistencyReport,
}

impl fmt::Display for RunSummary {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let c = &self.created;
    let b = &self.backfill;
    writeln!(f, "catalog run {} finished ({})", self.run_id, self.stage)?;
    writeln!(
      f,
      "  created: {} manufacturers, {} categories, {} trim levels ({} english names filled)",
      c.manufacturers, c.categories, c.trim_levels, c.english_names_backfilled
    )?;
    writeln!(
      f,
      "  items: {} total, {} linked, {} unresolved ({} updated, {} unchanged, {} without trim level)",
      b.items_total,
      b.items_resolved,
      b.items_unresolved,
      b.items_updated,
      b.items_unchanged,
      b.items_without_trim_level
    )?;
    let u = &b.unresolved_by_level;
    writeln!(
      f,
      "  unresolved at: manufacturer {}, category {}, trim level {}",
      u.manufacturer, u.category, u.trim_level
    )?;
    for r in &b.unresolved {
      writeln!(
        f,
        "    item {} {}: no match for {:?}",
        r.item_id,
        r.level,
        r.text.as_deref().unwrap_or_default()
      )?;
    }
    let timings: Vec<String> = self
      .timings
      .iter()
      .map(|t| format!("{}={}ms", t.stage, t.elapsed_ms))
      .collect();
    write!(f, "  timings: {}", timings.join(" "))
  }
}
