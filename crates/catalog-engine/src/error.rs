//! Error type for `catalog-engine`.
//!
//! Every fatal error names the stage that failed. Item-level problems are
//! not errors; they are collected in the run summary.

use catalog_core::{
  stage::Stage,
  store::{Classify, ErrorClass, RunLock},
};
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{stage} failed: store unreachable: {source}")]
  Connection {
    stage:  Stage,
    #[source]
    source: BoxError,
  },

  #[error("{stage} failed: integrity violation: {source}")]
  IntegrityViolation {
    stage:  Stage,
    #[source]
    source: BoxError,
  },

  #[error("{stage} failed: store error: {source}")]
  Store {
    stage:  Stage,
    #[source]
    source: BoxError,
  },

  /// An earlier stage did not produce an id a later stage depends on.
  #[error("{stage} failed: {detail}")]
  Logic { stage: Stage, detail: String },

  #[error(
    "another catalog run is in progress (run {}, holder {:?}, since {})",
    .0.run_id, .0.holder, .0.acquired_at
  )]
  Locked(RunLock),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  /// Wrap a store error, classifying it onto the engine's taxonomy.
  pub fn from_store<E>(stage: Stage, e: E) -> Self
  where
    E: std::error::Error + Classify + Send + Sync + 'static,
  {
    match e.class() {
      ErrorClass::Connection => Error::Connection { stage, source: Box::new(e) },
      ErrorClass::Integrity => Error::IntegrityViolation { stage, source: Box::new(e) },
      ErrorClass::Other => Error::Store { stage, source: Box::new(e) },
    }
  }

  /// The stage that failed; `None` when the run never started.
  pub fn stage(&self) -> Option<Stage> {
    match self {
      Error::Connection { stage, .. }
      | Error::IntegrityViolation { stage, .. }
      | Error::Store { stage, .. }
      | Error::Logic { stage, .. } => Some(*stage),
      Error::Locked(_) => None,
    }
  }
}

/// Attach a stage to a store result.
pub trait AtStage<T> {
  fn at(self, stage: Stage) -> Result<T>;
}

impl<T, E> AtStage<T> for std::result::Result<T, E>
where
  E: std::error::Error + Classify + Send + Sync + 'static,
{
  fn at(self, stage: Stage) -> Result<T> { self.map_err(|e| Error::from_store(stage, e)) }
}
