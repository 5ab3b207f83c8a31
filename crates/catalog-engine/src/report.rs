//! ConsistencyReporter: read-only counts and a joined sample for
//! spot-checking a run.

use catalog_core::{report::ConsistencyReport, stage::Stage, store::CatalogStore};

use crate::{Result, error::AtStage as _};

pub async fn consistency_report<S: CatalogStore>(
  store:       &S,
  sample_size: usize,
) -> Result<ConsistencyReport> {
  let stage = Stage::Reporting;
  let report = ConsistencyReport {
    hierarchy: store.hierarchy_counts().await.at(stage)?,
    links:     store.link_counts().await.at(stage)?,
    integrity: store.integrity_counts().await.at(stage)?,
    sample:    store.sample_hierarchy(sample_size).await.at(stage)?,
  };

  if !report.integrity.is_clean() {
    tracing::warn!(integrity = ?report.integrity, "hierarchy has integrity violations");
  }
  tracing::info!(
    manufacturers = report.hierarchy.manufacturers,
    categories = report.hierarchy.categories,
    trim_levels = report.hierarchy.trim_levels,
    linked = report.links.with_manufacturer,
    total = report.links.items_total,
    "consistency report"
  );
  Ok(report)
}
