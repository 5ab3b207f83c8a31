//! End-to-end tests for the engine against an in-memory `SqliteStore`.

use std::collections::{BTreeMap, HashSet};

use catalog_core::{
  hierarchy::Level,
  inventory::NewInventoryItem,
  matcher::NameMatcher,
  stage::Stage,
  store::{CatalogStore, Classify, EntityRef, ErrorClass, RunLock},
  summary::UnresolvedReason,
};
use catalog_store_sqlite::SqliteStore;
use chrono::Utc;
use uuid::Uuid;

use crate::{
  EngineConfig, Error, Pipeline,
  backfill::{backfill, resolve_item},
  repository::HierarchyRepository,
};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn seed(s: &SqliteStore, rows: &[(&str, &str, Option<&str>)]) {
  for (m, c, t) in rows {
    s.add_inventory_item(NewInventoryItem::new(m, c, *t))
      .await
      .unwrap();
  }
}

fn scenario_a() -> Vec<(&'static str, &'static str, Option<&'static str>)> {
  vec![
    ("Toyota", "Camry", Some("LE")),
    ("Toyota", "Camry", Some("XLE")),
    ("Toyota", "Corolla", None),
  ]
}

// ─── Scenarios ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn scenario_a_builds_one_two_two() {
  let s = store().await;
  seed(&s, &scenario_a()).await;

  let summary = Pipeline::new(&s, EngineConfig::default()).run().await.unwrap();

  assert_eq!(summary.stage, Stage::Done);
  assert_eq!(summary.created.manufacturers, 1);
  assert_eq!(summary.created.categories, 2);
  assert_eq!(summary.created.trim_levels, 2);
  assert_eq!(summary.backfill.items_resolved, 3);
  assert_eq!(summary.backfill.items_unresolved, 0);
  assert_eq!(summary.backfill.items_without_trim_level, 1);

  let rows = s.list_inventory().await.unwrap();
  let corolla = rows.iter().find(|r| r.category.as_deref() == Some("Corolla")).unwrap();
  assert!(corolla.links.manufacturer_id.is_some());
  assert!(corolla.links.category_id.is_some());
  assert!(corolla.links.trim_level_id.is_none());

  let camrys: Vec<_> = rows.iter().filter(|r| r.category.as_deref() == Some("Camry")).collect();
  assert_eq!(camrys[0].links.category_id, camrys[1].links.category_id);
  assert_ne!(camrys[0].links.trim_level_id, camrys[1].links.trim_level_id);
}

#[tokio::test]
async fn scenario_b_trailing_space_is_one_category() {
  let s = store().await;
  seed(&s, &[("Mercedes", "C-Class", None), ("Mercedes", "C-Class ", None)]).await;

  let summary = Pipeline::new(&s, EngineConfig::default()).run().await.unwrap();

  assert_eq!(summary.created.categories, 1);
  assert_eq!(summary.report.hierarchy.categories, 1);
  let rows = s.list_inventory().await.unwrap();
  assert_eq!(rows[0].links, rows[1].links);
}

#[tokio::test]
async fn scenario_c_rerun_creates_nothing() {
  let s = store().await;
  seed(&s, &scenario_a()).await;
  let pipeline = Pipeline::new(&s, EngineConfig::default());

  let first = pipeline.run().await.unwrap();
  let links_after_first: Vec<_> =
    s.list_inventory().await.unwrap().into_iter().map(|r| r.links).collect();

  let second = pipeline.run().await.unwrap();

  assert_eq!(first.backfill.items_updated, 3);
  assert_eq!(second.created.total(), 0);
  assert_eq!(second.backfill.items_updated, 0);
  assert_eq!(second.backfill.items_unchanged, 3);
  assert_eq!(second.report.links.with_manufacturer, 3);

  let links_after_second: Vec<_> =
    s.list_inventory().await.unwrap().into_iter().map(|r| r.links).collect();
  assert_eq!(links_after_first, links_after_second);
}

#[tokio::test]
async fn scenario_d_empty_category_is_unresolved_not_fatal() {
  let s = store().await;
  seed(&s, &[("Kia", "", None), ("Kia", "Rio", None)]).await;

  let summary = Pipeline::new(&s, EngineConfig::default()).run().await.unwrap();

  assert_eq!(summary.backfill.items_unresolved, 1);
  assert_eq!(summary.backfill.unresolved_by_level.get(Level::Category), 1);
  assert!(summary.backfill.unresolved.is_empty(), "missing text is not listed");

  let rows = s.list_inventory().await.unwrap();
  let blank = rows.iter().find(|r| r.category.as_deref() == Some("")).unwrap();
  assert!(blank.links.manufacturer_id.is_some());
  assert!(blank.links.category_id.is_none());
  assert!(blank.links.trim_level_id.is_none());
}

#[tokio::test]
async fn missing_manufacturer_leaves_all_links_null() {
  let s = store().await;
  s.add_inventory_item(NewInventoryItem {
    manufacturer: None,
    category:     Some("Rio".into()),
    trim_level:   Some("LX".into()),
  })
  .await
  .unwrap();

  let summary = Pipeline::new(&s, EngineConfig::default()).run().await.unwrap();

  assert_eq!(summary.created.total(), 0);
  assert_eq!(summary.backfill.unresolved_by_level.get(Level::Manufacturer), 1);
  assert_eq!(s.list_inventory().await.unwrap()[0].links.manufacturer_id, None);
}

// ─── Properties ──────────────────────────────────────────────────────────────

fn mixed_rows() -> Vec<(&'static str, &'static str, Option<&'static str>)> {
  vec![
    ("Toyota", "Camry", Some("LE")),
    ("Toyota ", " Camry", Some("LE ")),
    ("Lexus", "ES", Some("LE")),
    ("Lexus", "Hybrid", None),
    ("Toyota", "Hybrid", Some("Base")),
    ("بي ام دبليو", "X5", None),
    ("بي إم دبليو", "X5", None),
  ]
}

#[tokio::test]
async fn builder_is_idempotent() {
  let s = store().await;
  seed(&s, &mixed_rows()).await;
  let pipeline = Pipeline::new(&s, EngineConfig::default());

  pipeline.run().await.unwrap();
  let before = s.hierarchy_counts().await.unwrap();
  let again = pipeline.run().await.unwrap();

  assert_eq!(again.created.total(), 0);
  assert_eq!(s.hierarchy_counts().await.unwrap(), before);
}

#[tokio::test]
async fn links_follow_the_parent_chain() {
  let s = store().await;
  seed(&s, &mixed_rows()).await;
  let summary = Pipeline::new(&s, EngineConfig::default()).run().await.unwrap();

  assert!(summary.report.integrity.is_clean());

  for row in s.list_inventory().await.unwrap() {
    let (Some(m), Some(c)) = (row.links.manufacturer_id, row.links.category_id) else {
      panic!("row {} should be fully linked", row.item_id);
    };
    let categories = s.list_categories(m).await.unwrap();
    assert!(categories.iter().any(|cat| cat.category_id == c));
    if let Some(t) = row.links.trim_level_id {
      let trims = s.list_trim_levels(c).await.unwrap();
      assert!(trims.iter().any(|trim| trim.trim_level_id == t));
    }
  }
}

#[tokio::test]
async fn names_are_unique_per_scope() {
  let s = store().await;
  seed(&s, &mixed_rows()).await;
  let summary = Pipeline::new(&s, EngineConfig::default()).run().await.unwrap();

  // The two BMW spellings differ by a hamza and stay distinct.
  assert_eq!(summary.created.manufacturers, 4);

  let manufacturers = s.list_manufacturers().await.unwrap();
  let names: HashSet<_> = manufacturers.iter().map(|m| m.name_ar.as_str()).collect();
  assert_eq!(names.len(), manufacturers.len());

  for m in &manufacturers {
    let categories = s.list_categories(m.manufacturer_id).await.unwrap();
    let names: HashSet<_> = categories.iter().map(|c| c.name_ar.as_str()).collect();
    assert_eq!(names.len(), categories.len());
    for c in &categories {
      let trims = s.list_trim_levels(c.category_id).await.unwrap();
      let names: HashSet<_> = trims.iter().map(|t| t.name_ar.as_str()).collect();
      assert_eq!(names.len(), trims.len());
    }
  }

  // "Hybrid" under Toyota and under Lexus are separate categories, as are
  // the two "X5"s.
  assert_eq!(summary.report.hierarchy.categories, 6);
  assert_eq!(summary.report.hierarchy.trim_levels, 3);
}

#[tokio::test]
async fn every_labelled_item_is_linked() {
  let s = store().await;
  seed(&s, &mixed_rows()).await;
  let summary = Pipeline::new(&s, EngineConfig::default()).run().await.unwrap();

  assert!(summary.backfill.unresolved.is_empty());
  assert_eq!(summary.backfill.items_resolved, mixed_rows().len() as u64);
  assert_eq!(summary.report.links.with_category, mixed_rows().len() as u64);
}

// ─── Aliases ─────────────────────────────────────────────────────────────────

fn alias_config() -> EngineConfig {
  EngineConfig {
    aliases: BTreeMap::from([("تويوتا".to_string(), "Toyota".to_string())]),
    ..EngineConfig::default()
  }
}

#[tokio::test]
async fn arabic_and_english_labels_share_one_manufacturer() {
  let s = store().await;
  seed(&s, &[("Toyota", "Camry", None), ("تويوتا", "Camry", None)]).await;

  let summary = Pipeline::new(&s, alias_config()).run().await.unwrap();

  assert_eq!(summary.created.manufacturers, 1);
  assert_eq!(summary.created.categories, 1);
  let m = &s.list_manufacturers().await.unwrap()[0];
  assert_eq!(m.name_ar, "تويوتا");
  assert_eq!(m.name_en.as_deref(), Some("Toyota"));
}

#[tokio::test]
async fn existing_row_gains_english_name() {
  let s = store().await;
  seed(&s, &[("تويوتا", "Camry", None)]).await;
  Pipeline::new(&s, EngineConfig::default()).run().await.unwrap();
  assert!(s.list_manufacturers().await.unwrap()[0].name_en.is_none());

  let summary = Pipeline::new(&s, alias_config()).run().await.unwrap();

  assert_eq!(summary.created.total(), 0);
  assert_eq!(summary.created.english_names_backfilled, 1);
  let m = &s.list_manufacturers().await.unwrap()[0];
  assert_eq!(m.name_en.as_deref(), Some("Toyota"));
}

// ─── Unresolved references ───────────────────────────────────────────────────

#[tokio::test]
async fn deactivated_category_is_reported_per_item() {
  let s = store().await;
  seed(&s, &scenario_a()).await;
  Pipeline::new(&s, EngineConfig::default()).run().await.unwrap();

  let toyota = s.list_manufacturers().await.unwrap()[0].manufacturer_id;
  let corolla = s
    .list_categories(toyota)
    .await
    .unwrap()
    .into_iter()
    .find(|c| c.name_ar == "Corolla")
    .unwrap();
  s.set_active(EntityRef::Category(corolla.category_id), false)
    .await
    .unwrap();

  let mut repo = HierarchyRepository::new(&s, NameMatcher::default());
  let summary = backfill(&mut repo, 2).await.unwrap();

  assert_eq!(summary.items_unresolved, 1);
  assert_eq!(summary.unresolved.len(), 1);
  let reference = &summary.unresolved[0];
  assert_eq!(reference.level, Level::Category);
  assert_eq!(reference.reason, UnresolvedReason::NoMatch);
  assert_eq!(reference.text.as_deref(), Some("Corolla"));

  let row = s
    .list_inventory()
    .await
    .unwrap()
    .into_iter()
    .find(|r| r.item_id == reference.item_id)
    .unwrap();
  assert_eq!(row.links.manufacturer_id, Some(toyota));
  assert_eq!(row.links.category_id, None);
}

#[tokio::test]
async fn unknown_trim_level_keeps_category_link() {
  let s = store().await;
  seed(&s, &[("Toyota", "Camry", None)]).await;
  Pipeline::new(&s, EngineConfig::default()).run().await.unwrap();

  s.add_inventory_item(NewInventoryItem::new("Toyota", "Camry", Some("TRD")))
    .await
    .unwrap();
  let row = s.list_inventory().await.unwrap().pop().unwrap();

  let mut repo = HierarchyRepository::new(&s, NameMatcher::default());
  let resolution = resolve_item(&mut repo, &row).await.unwrap();

  assert!(resolution.is_resolved());
  assert!(resolution.links.trim_level_id.is_none());
  let reference = resolution.unresolved.unwrap();
  assert_eq!(reference.level, Level::TrimLevel);
  assert_eq!(reference.reason, UnresolvedReason::NoMatch);
}

// ─── Run lock and errors ─────────────────────────────────────────────────────

#[tokio::test]
async fn held_lock_refuses_the_run() {
  let s = store().await;
  seed(&s, &scenario_a()).await;
  let holder = RunLock {
    run_id:      Uuid::new_v4(),
    holder:      "other-admin".into(),
    acquired_at: Utc::now(),
  };
  s.acquire_run_lock(holder.clone(), Utc::now() - chrono::TimeDelta::hours(1))
    .await
    .unwrap();

  let err = Pipeline::new(&s, EngineConfig::default()).run().await.unwrap_err();

  match err {
    Error::Locked(held) => assert_eq!(held.run_id, holder.run_id),
    other => panic!("expected Locked, got {other}"),
  }
  assert_eq!(s.hierarchy_counts().await.unwrap().manufacturers, 0);
}

#[tokio::test]
async fn run_releases_its_lock() {
  let s = store().await;
  seed(&s, &scenario_a()).await;

  Pipeline::new(&s, EngineConfig::default()).run().await.unwrap();

  assert!(s.current_run_lock().await.unwrap().is_none());
}

#[derive(Debug, thiserror::Error)]
#[error("fake: {0:?}")]
struct FakeError(ErrorClass);

impl Classify for FakeError {
  fn class(&self) -> ErrorClass { self.0 }
}

#[test]
fn store_errors_map_onto_the_taxonomy() {
  let stage = Stage::BuildingCategories;

  let e = Error::from_store(stage, FakeError(ErrorClass::Connection));
  assert!(matches!(e, Error::Connection { .. }));
  assert_eq!(e.stage(), Some(stage));

  let e = Error::from_store(stage, FakeError(ErrorClass::Integrity));
  assert!(matches!(e, Error::IntegrityViolation { .. }));
  assert!(e.to_string().starts_with("building_categories failed"));

  let e = Error::from_store(stage, FakeError(ErrorClass::Other));
  assert!(matches!(e, Error::Store { .. }));
}

#[tokio::test]
async fn category_under_unknown_manufacturer_fails_fast() {
  use std::collections::BTreeSet;

  use catalog_core::summary::CreatedCounts;

  use crate::builder::build_categories;

  let s = store().await;
  let mut repo = HierarchyRepository::new(&s, NameMatcher::default());
  let pairs = BTreeSet::from([("Ghost".to_string(), "Phantom".to_string())]);
  let mut created = CreatedCounts::default();

  let err = build_categories(&mut repo, &pairs, &Default::default(), &mut created)
    .await
    .unwrap_err();

  assert!(matches!(err, Error::Logic { stage: Stage::BuildingCategories, .. }));
  assert_eq!(created.categories, 0);
}
