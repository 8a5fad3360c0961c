//! Second pass over one file's slots: overlaps, gaps between days and day
//! lengths. Findings are reported, slots are never touched.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::aggregate::{group_runs, working_total, Resolution};
use crate::clock;
use crate::model::{NonWorking, Slot, Strictness};

/// Longest working day accepted without a finding, in hours.
pub const DEFAULT_MAX_DAY_HOURS: f64 = 12.0;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
  Overlap,
  DaySequence,
  ShortDay,
  LongDay,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Warning,
  Error,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct Finding {
  pub kind: FindingKind,
  pub severity: Severity,
  pub date: NaiveDate,
  pub message: String,
}

#[derive(Debug, Clone)]
pub struct ValidateOptions {
  pub strictness: Strictness,
  pub non_working: NonWorking,
  pub day_hours: f64,
  pub min_day: Duration,
  pub max_day: Duration,
}

impl Default for ValidateOptions {
  fn default() -> Self {
    ValidateOptions {
      strictness: Strictness::Lenient,
      non_working: NonWorking::default(),
      day_hours: clock::DEFAULT_DAY_HOURS,
      min_day: hours(clock::DEFAULT_DAY_HOURS),
      max_day: hours(DEFAULT_MAX_DAY_HOURS),
    }
  }
}

/// Whole minutes in `h` hours.
pub fn hours(h: f64) -> Duration {
  Duration::minutes((h * 60.0).round() as i64)
}

impl ValidateOptions {
  fn soft_severity(&self) -> Severity {
    match self.strictness {
      Strictness::Lenient => Severity::Warning,
      Strictness::Strict => Severity::Error,
    }
  }

  fn fmt(&self, d: Duration) -> String {
    clock::format_man_days(d, self.day_hours, clock::UnitStyle::Compact)
  }
}

/// Check the slots of one timesheet.
pub fn validate(slots: &[Slot], options: &ValidateOptions) -> Vec<Finding> {
  let mut findings = Vec::new();
  let soft = options.soft_severity();

  for pair in slots.windows(2) {
    let (prev, next) = (&pair[0], &pair[1]);
    if next.start < prev.end {
      findings.push(Finding {
        kind: FindingKind::Overlap,
        severity: Severity::Error,
        date: next.date(),
        message: format!(
          "{} at {} starts before {} ends at {}",
          next.task,
          next.start.format("%H%M"),
          prev.task,
          prev.end.format("%H%M")
        ),
      });
    }

    let (from, to) = (prev.date(), next.date());
    if from != to && from.succ_opt() != Some(to) {
      findings.push(Finding {
        kind: FindingKind::DaySequence,
        severity: soft,
        date: to,
        message: format!("day {} does not follow {}", to.format("%a %d %b"), from.format("%a %d %b")),
      });
    }
  }

  for (_, day) in group_runs(slots, Resolution::Day) {
    let Some(first) = day.first() else { continue };
    let date = first.date();
    let worked = working_total(day, &options.non_working);
    if worked < options.min_day {
      findings.push(Finding {
        kind: FindingKind::ShortDay,
        severity: soft,
        date,
        message: format!(
          "short day on {}: {} worked, expected at least {}",
          date.format("%a %d %b"),
          options.fmt(worked),
          options.fmt(options.min_day)
        ),
      });
    } else if worked > options.max_day {
      findings.push(Finding {
        kind: FindingKind::LongDay,
        severity: soft,
        date,
        message: format!(
          "long day on {}: {} worked, expected at most {}",
          date.format("%a %d %b"),
          options.fmt(worked),
          options.fmt(options.max_day)
        ),
      });
    }
  }

  findings
}

pub fn has_errors(findings: &[Finding]) -> bool {
  findings.iter().any(|f| f.severity == Severity::Error)
}
