//! Error types for `catalog-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("a {0} name must not be empty")]
  EmptyName(crate::hierarchy::Level),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
