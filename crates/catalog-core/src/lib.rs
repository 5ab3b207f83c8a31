//! Core types and trait definitions for the catalog hierarchy engine.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! storage backend (`catalog-store-sqlite`) implements [`store::CatalogStore`];
//! the engine (`catalog-engine`) drives it.

// Native `async fn` in traits; the `Send` bounds are spelled out on the
// returned futures instead.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod hierarchy;
pub mod inventory;
pub mod matcher;
pub mod report;
pub mod stage;
pub mod store;
pub mod summary;

pub use error::{Error, Result};
