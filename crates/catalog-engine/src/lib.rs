//! The catalog hierarchy normalization and backfill engine.
//!
//! A run derives the Manufacturer → Category → TrimLevel hierarchy from the
//! free-text columns of the inventory table, then links every inventory row
//! to it by id. Stages run strictly in order, starting at
//! [`Stage::Extracting`] and following [`Stage::next`]:
//!
//! 1. [`extract`] collects the distinct label tuples in use.
//! 2. [`builder`] upserts manufacturers, then categories, then trim levels.
//! 3. [`backfill`] writes the three link columns on every item.
//! 4. [`report`] reads back counts, integrity checks and a joined sample.
//!
//! Every stage is idempotent: re-running against unchanged input creates no
//! rows and rewrites no links.
//!
//! [`Stage::Extracting`]: catalog_core::stage::Stage::Extracting
//! [`Stage::next`]: catalog_core::stage::Stage::next

pub mod backfill;
pub mod builder;
pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod report;
pub mod repository;

pub use config::EngineConfig;
pub use error::{Error, Result};
pub use pipeline::Pipeline;

#[cfg(test)]
mod tests;
