// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Define the domain model (task paths, slots, non-working set, strictness) shared by parsing, validation and reporting
// role: model/types
// outputs: Serializable structs with stable field names
// invariants:
// - TaskPath never holds an empty component (normalized to "misc")
// - Slot.end > Slot.start for every slot handed out by the parser
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeSet;
use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub const MISC: &str = "misc";

/// Top-level task names excluded from working totals by default.
pub const DEFAULT_NON_WORKING: [&str; 3] = ["afk", "tea", "lunch"];

/// Hierarchical task name, e.g. `project: feature: coding`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskPath(Vec<String>);

impl TaskPath {
  /// Split colon-delimited task text. Components are trimmed; empty ones
  /// (and blank text) become `misc`.
  pub fn parse(text: &str) -> Self {
    let parts = text
      .split(':')
      .map(|part| {
        let part = part.trim();
        if part.is_empty() { MISC.to_string() } else { part.to_string() }
      })
      .collect();
    TaskPath(parts)
  }

  pub fn misc() -> Self {
    TaskPath(vec![MISC.to_string()])
  }

  pub fn components(&self) -> &[String] {
    &self.0
  }

  pub fn top(&self) -> &str {
    self.0.first().map(String::as_str).unwrap_or(MISC)
  }

  /// True when `prefix` names this path or one of its ancestors.
  pub fn starts_with(&self, prefix: &TaskPath) -> bool {
    self.0.starts_with(&prefix.0)
  }
}

impl fmt::Display for TaskPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0.join(": "))
  }
}

/// A contiguous interval of time attributed to one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
  pub start: NaiveDateTime,
  pub end: NaiveDateTime,
  pub task: TaskPath,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub note: String,
}

impl Slot {
  pub fn duration(&self) -> Duration {
    self.end - self.start
  }

  /// Calendar date the slot starts on.
  pub fn date(&self) -> NaiveDate {
    self.start.date()
  }
}

/// Set of top-level task names that count as time away from work.
/// Matching is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonWorking(BTreeSet<String>);

impl NonWorking {
  pub fn new<I, S>(names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    NonWorking(names.into_iter().map(|n| n.as_ref().trim().to_lowercase()).collect())
  }

  pub fn contains(&self, name: &str) -> bool {
    self.0.contains(&name.to_lowercase())
  }

  /// True when the slot's top-level task is non-working.
  pub fn excludes(&self, task: &TaskPath) -> bool {
    self.contains(task.top())
  }
}

impl Default for NonWorking {
  fn default() -> Self {
    NonWorking::new(DEFAULT_NON_WORKING)
  }
}

/// How hard the parser and validator are on questionable input.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
  /// Ignore stray text; short/long days and day gaps are warnings.
  #[default]
  Lenient,
  /// Stray text is fatal; every validation finding is an error.
  Strict,
}
