//! Error type for `catalog-store-sqlite`.

use catalog_core::store::{Classify, ErrorClass};
use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] catalog_core::Error),

  #[error("cannot reach store: {0}")]
  Connection(String),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("integrity violation: {0}")]
  IntegrityViolation(String),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Classify for Error {
  fn class(&self) -> ErrorClass {
    match self {
      Error::Connection(_) => ErrorClass::Connection,
      Error::IntegrityViolation(_) => ErrorClass::Integrity,
      Error::Database(tokio_rusqlite::Error::ConnectionClosed) => ErrorClass::Connection,
      Error::Database(tokio_rusqlite::Error::Rusqlite(e)) => classify_sqlite(e),
      _ => ErrorClass::Other,
    }
  }
}

fn classify_sqlite(e: &rusqlite::Error) -> ErrorClass {
  match e.sqlite_error_code() {
    Some(ErrorCode::ConstraintViolation) => ErrorClass::Integrity,
    Some(
      ErrorCode::CannotOpen | ErrorCode::NotADatabase | ErrorCode::SystemIoFailure,
    ) => ErrorClass::Connection,
    _ => ErrorClass::Other,
  }
}
