//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use catalog_core::store::{Classify, ErrorClass};
use serde_json::json;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("a catalog run is already in progress")]
  RunInProgress,

  /// The detached run task panicked or was cancelled by the runtime.
  #[error("catalog run aborted: {0}")]
  Aborted(String),

  /// A store read made outside of any run.
  #[error("store error: {source}")]
  Store {
    class:  ErrorClass,
    #[source]
    source: BoxError,
  },

  #[error(transparent)]
  Engine(#[from] catalog_engine::Error),
}

impl ApiError {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Classify + Send + Sync + 'static,
  {
    ApiError::Store { class: e.class(), source: Box::new(e) }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    use catalog_engine::Error as E;

    let status = match &self {
      ApiError::RunInProgress | ApiError::Engine(E::Locked(_)) => StatusCode::CONFLICT,
      ApiError::Engine(E::Connection { .. })
      | ApiError::Store { class: ErrorClass::Connection, .. } => StatusCode::SERVICE_UNAVAILABLE,
      ApiError::Aborted(_) | ApiError::Store { .. } | ApiError::Engine(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    };
    let stage = match &self {
      ApiError::Engine(e) => e.stage(),
      ApiError::RunInProgress | ApiError::Aborted(_) | ApiError::Store { .. } => None,
    };
    if status.is_server_error() {
      tracing::error!(error = %self, "catalog request failed");
    }
    (status, Json(json!({ "error": self.to_string(), "stage": stage }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, Error)]
  #[error("database is locked")]
  struct Unreachable;

  impl Classify for Unreachable {
    fn class(&self) -> ErrorClass { ErrorClass::Connection }
  }

  #[tokio::test]
  async fn store_read_failure_has_no_stage() {
    let resp = ApiError::store(Unreachable).into_response();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["stage"].is_null());
    assert_eq!(body["error"], "store error: database is locked");
  }
}
