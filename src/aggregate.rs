// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Bucket slots by calendar resolution and roll task durations up into a nested tree
// role: aggregation/grouping
// inputs: chronologically ordered &[Slot], ordered resolutions (coarse to fine), AggregateOptions
// outputs: Vec<PeriodReport> borrowing the input slots
// invariants:
// - group_runs is a single linear pass; runs keep input order and never reorder slots
// - a node's duration equals the sum of its children plus time attached directly to it
// - max_depth truncation never changes a root total
// - non-working slots never add to any total
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::clock;
use crate::model::{NonWorking, Slot, TaskPath};

/// Calendar bucket size, declared coarse to fine.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum Resolution {
  Year,
  Month,
  Week,
  Day,
}

impl Resolution {
  pub fn key(self, date: NaiveDate) -> GroupKey {
    match self {
      Resolution::Year => GroupKey::Year(date.year()),
      Resolution::Month => GroupKey::Month {
        year: date.year(),
        month: date.month(),
      },
      Resolution::Week => {
        let iso = date.iso_week();
        GroupKey::Week {
          year: iso.year(),
          week: iso.week(),
        }
      }
      Resolution::Day => GroupKey::Day(date),
    }
  }
}

/// Sort coarse to fine and drop repeats.
pub fn normalize_resolutions(mut resolutions: Vec<Resolution>) -> Vec<Resolution> {
  resolutions.sort();
  resolutions.dedup();
  resolutions
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub enum GroupKey {
  All,
  Year(i32),
  Month { year: i32, month: u32 },
  Week { year: i32, week: u32 },
  Day(NaiveDate),
}

impl GroupKey {
  pub fn label(&self) -> String {
    match self {
      GroupKey::All => "All".to_string(),
      GroupKey::Year(year) => format!("{year}"),
      GroupKey::Month { year, month } => match NaiveDate::from_ymd_opt(*year, *month, 1) {
        Some(first) => first.format("%b %Y").to_string(),
        None => format!("{year:04}-{month:02}"),
      },
      GroupKey::Week { year, week } => format!("{year}-W{week:02}"),
      GroupKey::Day(date) => date.format("%a %d %b %Y").to_string(),
    }
  }
}

/// Maximal runs of consecutive slots sharing a group key.
pub fn group_runs(slots: &[Slot], resolution: Resolution) -> Vec<(GroupKey, &[Slot])> {
  let mut runs = Vec::new();
  let mut run_start = 0;
  let mut current: Option<GroupKey> = None;

  for (idx, slot) in slots.iter().enumerate() {
    let key = resolution.key(slot.date());
    match &current {
      Some(open) if *open == key => {}
      Some(open) => {
        runs.push((open.clone(), &slots[run_start..idx]));
        run_start = idx;
        current = Some(key);
      }
      None => current = Some(key),
    }
  }
  if let Some(open) = current {
    runs.push((open, &slots[run_start..]));
  }
  runs
}

/// Node in the task-duration tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskNode {
  pub duration: Duration,
  pub children: BTreeMap<String, TaskNode>,
}

impl Default for TaskNode {
  fn default() -> Self {
    TaskNode {
      duration: Duration::zero(),
      children: BTreeMap::new(),
    }
  }
}

impl TaskNode {
  /// Add `duration` to this node and to each node along `components`.
  pub fn add_path(&mut self, components: &[String], duration: Duration) {
    self.duration = self.duration + duration;
    if let Some((head, rest)) = components.split_first() {
      self.children.entry(head.clone()).or_default().add_path(rest, duration);
    }
  }

  pub fn child(&self, name: &str) -> Option<&TaskNode> {
    self.children.get(name)
  }

  /// Children by descending duration, ties by name.
  pub fn sorted_children(&self) -> Vec<(&str, &TaskNode)> {
    let mut out: Vec<(&str, &TaskNode)> = self.children.iter().map(|(k, v)| (k.as_str(), v)).collect();
    out.sort_by(|a, b| b.1.duration.cmp(&a.1.duration).then_with(|| a.0.cmp(b.0)));
    out
  }

  /// The only child, when it carries all of this node's time.
  pub fn collapsible_child(&self) -> Option<(&str, &TaskNode)> {
    if self.children.len() != 1 {
      return None;
    }
    self
      .children
      .iter()
      .next()
      .filter(|(_, child)| child.duration == self.duration)
      .map(|(name, child)| (name.as_str(), child))
  }
}

#[derive(Debug, Clone)]
pub struct AggregateOptions {
  /// Number of task path components kept; 0 means totals only.
  pub max_depth: usize,
  pub non_working: NonWorking,
  /// Keep non-working tasks in the tree with zero weight.
  pub show_non_working: bool,
}

impl Default for AggregateOptions {
  fn default() -> Self {
    AggregateOptions {
      max_depth: 1,
      non_working: NonWorking::default(),
      show_non_working: false,
    }
  }
}

fn truncated(task: &TaskPath, max_depth: usize) -> &[String] {
  let parts = task.components();
  &parts[..parts.len().min(max_depth)]
}

/// Build the task tree for a group of slots.
pub fn aggregate(slots: &[Slot], options: &AggregateOptions) -> TaskNode {
  let mut root = TaskNode::default();
  for slot in slots {
    let path = truncated(&slot.task, options.max_depth);
    if options.non_working.excludes(&slot.task) {
      if options.show_non_working {
        root.add_path(path, Duration::zero());
      }
      continue;
    }
    root.add_path(path, slot.duration());
  }
  root
}

/// Working time in a group of slots.
pub fn working_total(slots: &[Slot], non_working: &NonWorking) -> Duration {
  clock::total(
    slots
      .iter()
      .filter(|s| !non_working.excludes(&s.task))
      .map(Slot::duration),
  )
}

/// One bucket of the report, with finer buckets nested beneath it.
#[derive(Debug, Clone)]
pub struct PeriodReport<'a> {
  pub resolution: Option<Resolution>,
  pub key: GroupKey,
  pub label: String,
  pub slots: &'a [Slot],
  pub tree: TaskNode,
  pub periods: Vec<PeriodReport<'a>>,
}

impl PeriodReport<'_> {
  pub fn total(&self) -> Duration {
    self.tree.duration
  }

  /// True for periods with nothing nested beneath them.
  pub fn is_leaf(&self) -> bool {
    self.periods.is_empty()
  }
}

fn build_level<'a>(slots: &'a [Slot], resolutions: &[Resolution], options: &AggregateOptions) -> Vec<PeriodReport<'a>> {
  let Some((resolution, finer)) = resolutions.split_first() else {
    return Vec::new();
  };
  group_runs(slots, *resolution)
    .into_iter()
    .map(|(key, run)| PeriodReport {
      resolution: Some(*resolution),
      label: key.label(),
      key,
      slots: run,
      tree: aggregate(run, options),
      periods: build_level(run, finer, options),
    })
    .collect()
}

/// Group `slots` by each resolution in turn, coarse to fine.
///
/// An empty resolution list gives a single `All` period; no slots give no
/// periods at all.
pub fn build_report<'a>(
  slots: &'a [Slot],
  resolutions: &[Resolution],
  options: &AggregateOptions,
) -> Vec<PeriodReport<'a>> {
  if slots.is_empty() {
    return Vec::new();
  }
  if resolutions.is_empty() {
    return vec![PeriodReport {
      resolution: None,
      key: GroupKey::All,
      label: GroupKey::All.label(),
      slots,
      tree: aggregate(slots, options),
      periods: Vec::new(),
    }];
  }
  build_level(slots, resolutions, options)
}
