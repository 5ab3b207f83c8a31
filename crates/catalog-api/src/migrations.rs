//! `POST /catalog/migrations` — the administrative trigger.
//!
//! Takes no parameters. Responds with the run summary on success. The run
//! itself is a detached task: a client that disconnects or times out does
//! not cancel it, and the run gate stays held until it finishes.

use std::sync::Arc;

use axum::{Json, extract::State};
use catalog_core::{store::CatalogStore, summary::RunSummary};
use catalog_engine::Pipeline;

use crate::{ApiState, error::ApiError};

pub async fn trigger<S>(State(state): State<ApiState<S>>) -> Result<Json<RunSummary>, ApiError>
where
  S: CatalogStore + 'static,
{
  let Ok(running) = Arc::clone(&state.run_gate).try_lock_owned() else {
    return Err(ApiError::RunInProgress);
  };
  let store = Arc::clone(&state.store);
  let config = (*state.engine).clone();

  let run = tokio::spawn(async move {
    let _running = running;
    Pipeline::new(store.as_ref(), config).run().await
  });
  let summary = run
    .await
    .map_err(|e| ApiError::Aborted(e.to_string()))??;
  Ok(Json(summary))
}
