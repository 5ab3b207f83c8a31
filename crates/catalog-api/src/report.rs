//! Read-only views: the consistency report and the run lock.

use axum::{
  Json,
  extract::{Query, State},
};
use catalog_core::{
  report::ConsistencyReport,
  store::{CatalogStore, RunLock},
};
use catalog_engine::report::consistency_report;
use serde::Deserialize;

use crate::{ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ReportParams {
  pub sample: Option<usize>,
}

/// `GET /catalog/report[?sample=<n>]`
pub async fn handler<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ReportParams>,
) -> Result<Json<ConsistencyReport>, ApiError>
where
  S: CatalogStore + 'static,
{
  let sample = params.sample.unwrap_or(state.engine.sample_size);
  let report = consistency_report(state.store.as_ref(), sample).await?;
  Ok(Json(report))
}

/// `GET /catalog/lock`
pub async fn lock<S>(State(state): State<ApiState<S>>) -> Result<Json<Option<RunLock>>, ApiError>
where
  S: CatalogStore + 'static,
{
  let lock = state.store.current_run_lock().await.map_err(ApiError::store)?;
  Ok(Json(lock))
}
