//! Pipeline stages.
//!
//! A run starts at [`Stage::Extracting`] and follows [`Stage::next`] until a
//! terminal stage. Any stage's unrecoverable error moves the run to
//! [`Stage::Failed`] and the remaining stages are skipped.

use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
  Extracting,
  BuildingManufacturers,
  BuildingCategories,
  BuildingTrimLevels,
  Backfilling,
  Reporting,
  Done,
  Failed,
}

impl Stage {
  pub fn is_terminal(self) -> bool { matches!(self, Self::Done | Self::Failed) }

  /// The stage that follows `self` on success.
  pub fn next(self) -> Self {
    match self {
      Self::Extracting => Self::BuildingManufacturers,
      Self::BuildingManufacturers => Self::BuildingCategories,
      Self::BuildingCategories => Self::BuildingTrimLevels,
      Self::BuildingTrimLevels => Self::Backfilling,
      Self::Backfilling => Self::Reporting,
      Self::Reporting | Self::Done => Self::Done,
      Self::Failed => Self::Failed,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn run_walks_six_working_stages() {
    let mut stage = Stage::Extracting;
    let mut walked = Vec::new();
    while !stage.is_terminal() {
      walked.push(stage);
      stage = stage.next();
    }
    assert_eq!(walked, [
      Stage::Extracting,
      Stage::BuildingManufacturers,
      Stage::BuildingCategories,
      Stage::BuildingTrimLevels,
      Stage::Backfilling,
      Stage::Reporting,
    ]);
    assert_eq!(stage, Stage::Done);
    assert_eq!(Stage::Failed.next(), Stage::Failed);
  }

  #[test]
  fn stage_names_are_snake_case() {
    assert_eq!(Stage::BuildingTrimLevels.to_string(), "building_trim_levels");
    assert_eq!(
      serde_json::to_value(Stage::BuildingTrimLevels).unwrap(),
      "building_trim_levels"
    );
  }
}
