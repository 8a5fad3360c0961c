// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Turn period reports into dotted text rows or a JSON document
// role: rendering/output
// inputs: &[PeriodReport], RenderOptions (collapse, notes), optional CommitLog, ReportMeta (files, skipped, findings)
// outputs: String (text) or pretty JSON String
// invariants:
// - siblings ordered by descending duration, then name
// - collapse merges rows for display only; JSON always carries the full tree
// - root rows of a period are never collapsed into their child
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::fmt::Write as _;

use anyhow::Result;
use chrono::Duration;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::aggregate::{PeriodReport, Resolution, TaskNode};
use crate::clock::{self, UnitStyle};
use crate::commits::{CommitEntry, CommitLog};
use crate::validate::Finding;

/// Column the dotted leader pads labels to.
pub const LABEL_WIDTH: usize = 40;

const TASK_INDENT: usize = 2;
const PERIOD_INDENT: usize = 4;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
  pub day_hours: f64,
  pub units: UnitStyle,
  pub collapse: bool,
  /// List slots with their notes under the finest periods.
  pub notes: bool,
}

impl Default for RenderOptions {
  fn default() -> Self {
    RenderOptions {
      day_hours: clock::DEFAULT_DAY_HOURS,
      units: UnitStyle::Compact,
      collapse: true,
      notes: false,
    }
  }
}

impl RenderOptions {
  pub fn duration(&self, d: Duration) -> String {
    clock::format_man_days(d, self.day_hours, self.units)
  }

  /// Whether `period` gets a per-slot listing.
  fn lists_slots(&self, period: &PeriodReport<'_>, commits: Option<&CommitLog>) -> bool {
    period.is_leaf() && (self.notes || commits.is_some())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
  pub depth: usize,
  pub label: String,
  pub duration: Duration,
}

/// Flatten a task tree into display rows, root first.
pub fn tree_rows(label: &str, root: &TaskNode, collapse: bool) -> Vec<Row> {
  let mut rows = vec![Row {
    depth: 0,
    label: label.to_string(),
    duration: root.duration,
  }];
  for (name, child) in root.sorted_children() {
    push_rows(&mut rows, name, child, 1, collapse);
  }
  rows
}

fn push_rows(rows: &mut Vec<Row>, name: &str, node: &TaskNode, depth: usize, collapse: bool) {
  let mut label = name.to_string();
  let mut node = node;
  if collapse {
    while let Some((child_name, child)) = node.collapsible_child() {
      label.push_str(": ");
      label.push_str(child_name);
      node = child;
    }
  }
  rows.push(Row {
    depth,
    label,
    duration: node.duration,
  });
  for (child_name, child) in node.sorted_children() {
    push_rows(rows, child_name, child, depth + 1, collapse);
  }
}

fn dotted(indent: usize, label: &str, value: &str) -> String {
  let text = format!("{}{}", " ".repeat(indent), label);
  format!("{text:.<width$} {value}", width = LABEL_WIDTH)
}

/// Plain text report. With notes or a commit log, the finest periods also
/// list their slots, each followed by its notes and the commits made during it.
pub fn render_text(periods: &[PeriodReport<'_>], options: &RenderOptions, commits: Option<&CommitLog>) -> String {
  let mut out = String::new();
  for period in periods {
    write_period(&mut out, period, 0, options, commits);
  }
  out
}

fn write_period(
  out: &mut String,
  period: &PeriodReport<'_>,
  level: usize,
  options: &RenderOptions,
  commits: Option<&CommitLog>,
) {
  let base = level * PERIOD_INDENT;
  for row in tree_rows(&period.label, &period.tree, options.collapse) {
    let _ = writeln!(
      out,
      "{}",
      dotted(base + row.depth * TASK_INDENT, &row.label, &options.duration(row.duration))
    );
  }

  if options.lists_slots(period, commits) {
    let pad = " ".repeat(base + TASK_INDENT);
    for slot in period.slots {
      let _ = writeln!(
        out,
        "{pad}{}-{} {}",
        slot.start.format("%H%M"),
        slot.end.format("%H%M"),
        slot.task
      );
      if options.notes {
        for line in slot.note.lines() {
          let _ = writeln!(out, "{pad}    {line}");
        }
      }
      for commit in commits.map(|log| log.for_slot(slot)).unwrap_or_default() {
        let _ = writeln!(out, "{pad}    {} {}", commit.timestamp.format("%H%M"), commit.subject());
      }
    }
  }
  out.push('\n');

  for child in &period.periods {
    write_period(out, child, level + 1, options, commits);
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
  pub path: String,
  pub error: String,
  /// Offending line, for parse errors that point at one.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub line: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileFinding {
  pub path: String,
  #[serde(flatten)]
  pub finding: Finding,
}

/// Run-level facts carried alongside the periods in JSON output.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportMeta {
  pub files: Vec<String>,
  pub skipped: Vec<SkippedFile>,
  pub findings: Vec<FileFinding>,
}

#[derive(Debug, Serialize)]
pub struct TaskView {
  pub name: String,
  pub minutes: i64,
  pub duration: String,
  pub children: Vec<TaskView>,
}

#[derive(Debug, Serialize)]
pub struct SlotView<'a> {
  pub start: String,
  pub end: String,
  pub task: String,
  pub note: &'a str,
  pub commits: &'a [CommitEntry],
}

#[derive(Debug, Serialize)]
pub struct PeriodView<'a> {
  pub label: &'a str,
  pub resolution: Option<Resolution>,
  pub total_minutes: i64,
  pub total: String,
  pub tasks: Vec<TaskView>,
  pub periods: Vec<PeriodView<'a>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub slots: Option<Vec<SlotView<'a>>>,
}

#[derive(Debug, Serialize)]
pub struct ReportDocument<'a> {
  #[serde(flatten)]
  pub meta: &'a ReportMeta,
  pub periods: Vec<PeriodView<'a>>,
}

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn task_views(node: &TaskNode, options: &RenderOptions) -> Vec<TaskView> {
  node
    .sorted_children()
    .into_iter()
    .map(|(name, child)| TaskView {
      name: name.to_string(),
      minutes: child.duration.num_minutes(),
      duration: options.duration(child.duration),
      children: task_views(child, options),
    })
    .collect()
}

fn period_view<'a>(period: &'a PeriodReport<'a>, options: &RenderOptions, commits: Option<&'a CommitLog>) -> PeriodView<'a> {
  let slots = options.lists_slots(period, commits).then(|| {
    period
      .slots
      .iter()
      .map(|slot| SlotView {
        start: slot.start.format(TIMESTAMP_FORMAT).to_string(),
        end: slot.end.format(TIMESTAMP_FORMAT).to_string(),
        task: slot.task.to_string(),
        note: &slot.note,
        commits: commits.map(|log| log.for_slot(slot)).unwrap_or_default(),
      })
      .collect()
  });

  PeriodView {
    label: &period.label,
    resolution: period.resolution,
    total_minutes: period.total().num_minutes(),
    total: options.duration(period.total()),
    tasks: task_views(&period.tree, options),
    periods: period.periods.iter().map(|p| period_view(p, options, commits)).collect(),
    slots,
  }
}

pub fn build_document<'a>(
  meta: &'a ReportMeta,
  periods: &'a [PeriodReport<'a>],
  options: &RenderOptions,
  commits: Option<&'a CommitLog>,
) -> ReportDocument<'a> {
  ReportDocument {
    meta,
    periods: periods.iter().map(|p| period_view(p, options, commits)).collect(),
  }
}

pub fn render_json(
  meta: &ReportMeta,
  periods: &[PeriodReport<'_>],
  options: &RenderOptions,
  commits: Option<&CommitLog>,
) -> Result<String> {
  let doc = build_document(meta, periods, options, commits);
  let mut text = serde_json::to_string_pretty(&doc)?;
  text.push('\n');
  Ok(text)
}
