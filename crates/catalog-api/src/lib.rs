//! JSON API for triggering and inspecting catalog runs.
//!
//! Exposes an axum [`Router`] backed by any [`CatalogStore`]. Auth, TLS, and
//! transport concerns are the caller's responsibility.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/catalog/migrations` | Run the engine; 409 if a run is in progress |
//! | `GET`  | `/catalog/report` | Optional `?sample=<n>` |
//! | `GET`  | `/catalog/lock` | Current run-lock holder, or `null` |

pub mod error;
pub mod migrations;
pub mod report;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use catalog_core::store::CatalogStore;
use catalog_engine::EngineConfig;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store:    Arc<S>,
  pub engine:   Arc<EngineConfig>,
  /// Held for the duration of a run so one process never runs two at once.
  pub run_gate: Arc<Mutex<()>>,
}

impl<S> ApiState<S> {
  pub fn new(store: Arc<S>, engine: EngineConfig) -> Self {
    Self { store, engine: Arc::new(engine), run_gate: Arc::new(Mutex::new(())) }
  }
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      engine:   Arc::clone(&self.engine),
      run_gate: Arc::clone(&self.run_gate),
    }
  }
}

/// Build the API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: CatalogStore + 'static,
{
  Router::new()
    .route("/catalog/migrations", post(migrations::trigger::<S>))
    .route("/catalog/report", get(report::handler::<S>))
    .route("/catalog/lock", get(report::lock::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
