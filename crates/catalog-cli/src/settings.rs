//! Runtime configuration, deserialised from `catalog.toml` and `CATALOG_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use catalog_engine::EngineConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
  pub store_path: PathBuf,
  pub host:       String,
  pub port:       u16,
  pub engine:     EngineConfig,
}

impl Default for CatalogConfig {
  fn default() -> Self {
    Self {
      store_path: PathBuf::from("catalog.db"),
      host:       "127.0.0.1".to_string(),
      port:       8080,
      engine:     EngineConfig::default(),
    }
  }
}

impl CatalogConfig {
  /// Read `path` if it exists, then overlay the environment.
  ///
  /// Nested keys use a double underscore, e.g.
  /// `CATALOG_ENGINE__BACKFILL_BATCH_SIZE=1000`.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("CATALOG")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()
      .context("failed to read config file")?;
    Self::from_settings(settings)
  }

  fn from_settings(settings: config::Config) -> anyhow::Result<Self> {
    let mut cfg: CatalogConfig = settings
      .try_deserialize()
      .context("failed to deserialise CatalogConfig")?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    Ok(cfg)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn from_toml(s: &str) -> CatalogConfig {
    let settings = config::Config::builder()
      .add_source(config::File::from_str(s, config::FileFormat::Toml))
      .build()
      .unwrap();
    CatalogConfig::from_settings(settings).unwrap()
  }

  #[test]
  fn empty_file_uses_defaults() {
    let cfg = from_toml("");
    assert_eq!(cfg.store_path, PathBuf::from("catalog.db"));
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert_eq!(cfg.engine, EngineConfig::default());
  }

  #[test]
  fn engine_table_and_aliases() {
    let cfg = from_toml(
      r#"
      store_path = "/var/lib/catalog.db"
      port = 9000

      [engine]
      backfill_batch_size = 50
      holder = "nightly"

      [engine.aliases]
      "تويوتا" = "Toyota"
      "#,
    );
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.engine.backfill_batch_size, 50);
    assert_eq!(cfg.engine.sample_size, 10);
    assert_eq!(cfg.engine.holder, "nightly");
    assert_eq!(cfg.engine.aliases.get("تويوتا").map(String::as_str), Some("Toyota"));
  }

  #[test]
  fn tilde_is_expanded() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/x.db")), PathBuf::from(home).join("x.db"));
    assert_eq!(expand_tilde(Path::new("/abs/x.db")), PathBuf::from("/abs/x.db"));
  }
}
