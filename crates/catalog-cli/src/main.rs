//! `catalog` — operator entry point for the catalog engine.
//!
//! # Usage
//!
//! ```
//! catalog migrate            # run the full pipeline once
//! catalog report --json      # print the consistency report
//! catalog serve              # expose the JSON API
//! catalog unlock             # clear an abandoned run lock
//! ```

mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use catalog_api::ApiState;
use catalog_core::store::CatalogStore;
use catalog_engine::{Pipeline, report::consistency_report};
use catalog_store_sqlite::SqliteStore;
use clap::{Parser, Subcommand};
use settings::CatalogConfig;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Catalog hierarchy normalization and backfill")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "catalog.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Build the hierarchy and backfill inventory links.
  Migrate {
    /// Print the run summary as JSON.
    #[arg(long)]
    json: bool,
  },
  /// Print hierarchy counts, link coverage and a joined sample.
  Report {
    #[arg(long)]
    json:   bool,
    /// Sample size; defaults to `engine.sample_size`.
    #[arg(long)]
    sample: Option<usize>,
  },
  /// Serve the JSON API.
  Serve,
  /// Remove the run lock regardless of holder.
  Unlock,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let cfg = CatalogConfig::load(&cli.config)?;

  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;

  match cli.command {
    Command::Migrate { json } => {
      let summary = Pipeline::new(&store, cfg.engine.clone())
        .run()
        .await
        .context("catalog run failed")?;
      if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
      } else {
        print!("{summary}");
      }
    }
    Command::Report { json, sample } => {
      let sample = sample.unwrap_or(cfg.engine.sample_size);
      let report = consistency_report(&store, sample).await?;
      if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
      } else {
        let h = &report.hierarchy;
        let l = &report.links;
        println!(
          "{} manufacturers, {} categories, {} trim levels",
          h.manufacturers, h.categories, h.trim_levels
        );
        println!(
          "{} items: {} with manufacturer, {} with category, {} with trim level",
          l.items_total, l.with_manufacturer, l.with_category, l.with_trim_level
        );
        if !report.integrity.is_clean() {
          println!("integrity: {:?}", report.integrity);
        }
        for s in &report.sample {
          println!(
            "  {} / {} / {}  ({} items)",
            s.manufacturer,
            s.category,
            s.trim_level.as_deref().unwrap_or("-"),
            s.item_count
          );
        }
      }
    }
    Command::Serve => {
      let address = cfg.address();
      let app = catalog_api::api_router(ApiState::new(Arc::new(store), cfg.engine));

      tracing::info!("Listening on http://{address}");
      let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
      axum::serve(listener, app).await.context("server error")?;
    }
    Command::Unlock => match store.current_run_lock().await? {
      Some(lock) => {
        store.clear_run_lock().await?;
        println!(
          "cleared lock of run {} held by {:?} since {}",
          lock.run_id, lock.holder, lock.acquired_at
        );
      }
      None => println!("no run lock held"),
    },
  }

  Ok(())
}
