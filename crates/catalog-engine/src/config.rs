//! Engine tuning knobs, deserialised from the `[engine]` table of the
//! configuration file.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  /// Link updates written per transaction during backfill.
  pub backfill_batch_size:   usize,
  /// Joined tuples included in the consistency report.
  pub sample_size:           usize,
  /// A run lock older than this is assumed abandoned and taken over.
  pub lock_stale_after_secs: u64,
  /// Recorded as the lock holder.
  pub holder:                String,
  /// Known Arabic → English name pairs.
  pub aliases:               BTreeMap<String, String>,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      backfill_batch_size:   500,
      sample_size:           10,
      lock_stale_after_secs: 3600,
      holder:                "catalog-engine".to_string(),
      aliases:               BTreeMap::new(),
    }
  }
}
