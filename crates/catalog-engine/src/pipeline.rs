//! The run driver: one ordered pass from [`Stage::Extracting`] along
//! [`Stage::next`].
//!
//! The stage sequence lives in [`Stage::next`]; each stage is a plain async
//! function taking the store (or the repository over it) explicitly. A
//! failing stage moves the run to [`Stage::Failed`] and aborts the rest.
//! Hierarchy rows already committed stay in place, since a retry will find
//! and reuse them.

use std::time::Instant;

use catalog_core::{
  matcher::{AliasBook, NameMatcher},
  report::ConsistencyReport,
  stage::Stage,
  store::{CatalogStore, LockOutcome, RunLock},
  summary::{BackfillSummary, CreatedCounts, RunSummary, StepTiming},
};
use chrono::{DateTime, TimeDelta, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
  EngineConfig, Error, Result,
  backfill::backfill,
  builder::{CategoryIds, ManufacturerIds, build_categories, build_manufacturers, build_trim_levels},
  error::AtStage as _,
  extract::{DistinctLabels, extract},
  report::consistency_report,
  repository::HierarchyRepository,
};

/// State threaded from one stage to the next.
#[derive(Default)]
struct RunState {
  labels:        DistinctLabels,
  manufacturers: ManufacturerIds,
  categories:    CategoryIds,
  created:       CreatedCounts,
  backfill:      BackfillSummary,
  report:        ConsistencyReport,
  timings:       Vec<StepTiming>,
}

pub struct Pipeline<'s, S> {
  store:  &'s S,
  config: EngineConfig,
}

impl<'s, S: CatalogStore> Pipeline<'s, S> {
  pub fn new(store: &'s S, config: EngineConfig) -> Self { Self { store, config } }

  pub fn config(&self) -> &EngineConfig { &self.config }

  /// Execute one full run.
  ///
  /// Fails with [`Error::Locked`] if another run holds the store's run lock.
  /// The lock is taken on entry to [`Stage::Extracting`] and released on
  /// exit whether the run succeeded or not.
  pub async fn run(&self) -> Result<RunSummary> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();

    self.acquire_lock(run_id, started_at).await?;
    let mut state = RunState::default();
    let outcome = self.run_stages(run_id, &mut state).await;
    self.release_lock(run_id).await;

    if let Err(e) = outcome {
      error!(
        %run_id,
        stage = %Stage::Failed,
        failed_stage = ?e.stage(),
        error = %e,
        "catalog run failed"
      );
      return Err(e);
    }

    let summary = RunSummary {
      run_id,
      started_at,
      finished_at: Utc::now(),
      stage: Stage::Done,
      created: state.created,
      backfill: state.backfill,
      timings: state.timings,
      report: state.report,
    };
    info!(
      %run_id,
      stage = %summary.stage,
      created = summary.created.total(),
      unresolved = summary.backfill.items_unresolved,
      "catalog run finished"
    );
    Ok(summary)
  }

  async fn run_stages(&self, run_id: Uuid, state: &mut RunState) -> Result<()> {
    let matcher = NameMatcher::new(AliasBook::new(&self.config.aliases));
    let mut repo = HierarchyRepository::new(self.store, matcher);

    let mut stage = Stage::Extracting;
    while !stage.is_terminal() {
      info!(%run_id, %stage, "entering stage");
      let started = Instant::now();

      match stage {
        Stage::Extracting => state.labels = extract(self.store).await?,
        Stage::BuildingManufacturers => {
          state.manufacturers =
            build_manufacturers(&mut repo, &state.labels.manufacturers, &mut state.created)
              .await?;
        }
        Stage::BuildingCategories => {
          state.categories = build_categories(
            &mut repo,
            &state.labels.categories,
            &state.manufacturers,
            &mut state.created,
          )
          .await?;
        }
        Stage::BuildingTrimLevels => {
          build_trim_levels(
            &mut repo,
            &state.labels.trim_levels,
            &state.categories,
            &mut state.created,
          )
          .await?;
        }
        Stage::Backfilling => {
          state.backfill = backfill(&mut repo, self.config.backfill_batch_size).await?;
        }
        Stage::Reporting => {
          state.report = consistency_report(self.store, self.config.sample_size).await?;
        }
        Stage::Done | Stage::Failed => {}
      }

      state.timings.push(StepTiming {
        stage,
        elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
      });
      stage = stage.next();
    }
    Ok(())
  }

  async fn acquire_lock(&self, run_id: Uuid, now: DateTime<Utc>) -> Result<()> {
    let max_age = i64::try_from(self.config.lock_stale_after_secs)
      .ok()
      .and_then(TimeDelta::try_seconds)
      .unwrap_or(TimeDelta::MAX);
    let stale_before = now.checked_sub_signed(max_age).unwrap_or(DateTime::<Utc>::MIN_UTC);

    let lock = RunLock { run_id, holder: self.config.holder.clone(), acquired_at: now };
    match self
      .store
      .acquire_run_lock(lock, stale_before)
      .await
      .at(Stage::Extracting)?
    {
      LockOutcome::Acquired => Ok(()),
      LockOutcome::Held(held) => {
        warn!(%run_id, held_by = %held.run_id, "catalog run lock is held");
        Err(Error::Locked(held))
      }
    }
  }

  async fn release_lock(&self, run_id: Uuid) {
    match self.store.release_run_lock(run_id).await {
      Ok(true) => {}
      Ok(false) => warn!(%run_id, "run lock was no longer held at release"),
      Err(e) => warn!(%run_id, error = %e, "failed to release run lock"),
    }
  }
}
