use anyhow::{Result, bail};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::aggregate::{Resolution, normalize_resolutions};
use crate::clock::{DEFAULT_DAY_HOURS, UnitStyle};
use crate::model::{DEFAULT_NON_WORKING, Strictness, TaskPath};
use crate::render::OutputFormat;
use crate::util;
use crate::validate::DEFAULT_MAX_DAY_HOURS;
use crate::window::WindowSpec;

#[derive(Parser, Debug)]
#[command(
    name = "timesheet-report",
    version,
    about = "Summarise weekly plain-text timesheets by period and task",
    long_about = None
)]
pub struct Cli {
  /// Timesheet files or directories of them (default: this week's file in --dir)
  #[arg(value_name = "TIMESHEET")]
  pub paths: Vec<PathBuf>,

  /// Group by year, month, week and/or day (repeatable; nested coarse to fine)
  #[arg(short = 'g', long = "granularity", value_enum)]
  pub granularity: Vec<Resolution>,

  /// Task path components to show (0 = totals only)
  #[arg(short = 'd', long, default_value_t = 1)]
  pub max_depth: usize,

  /// Keep slots starting on or after this point (date, timestamp or phrase)
  #[arg(long, alias = "start")]
  pub since: Option<String>,

  /// Keep slots starting before this point (exclusive)
  #[arg(long, alias = "end")]
  pub until: Option<String>,

  /// Calendar month, e.g. 2014-02
  #[arg(long)]
  pub month: Option<String>,

  /// Natural language window, e.g. "last week" or "yesterday"
  #[arg(long = "for")]
  pub for_str: Option<String>,

  /// Previous working day through today
  #[arg(long)]
  pub standup: bool,

  /// Only tasks under this path, e.g. "www: calendar"
  #[arg(short = 't', long)]
  pub task: Option<String>,

  /// Annotate slots with the commits made during them
  #[arg(short = 'c', long)]
  pub commits: bool,

  /// Git repository to read commits from
  #[arg(long, default_value = ".")]
  pub repo: PathBuf,

  /// JSON commit log to use instead of git
  #[arg(long)]
  pub commit_log: Option<PathBuf>,

  /// Treat stray text and every validation finding as errors
  #[arg(long)]
  pub strict: bool,

  /// Allow times to run past midnight into the next day
  #[arg(long)]
  pub wrap_midnight: bool,

  /// Count time after a bare timestamp as "misc" instead of dropping it
  #[arg(long)]
  pub blank_as_misc: bool,

  /// Non-working task name (repeatable; replaces the default afk/tea/lunch)
  #[arg(long = "afk", value_name = "NAME")]
  pub afk: Vec<String>,

  /// List non-working tasks in reports with zero weight
  #[arg(long)]
  pub show_afk: bool,

  /// Hours in a man-day
  #[arg(long, default_value_t = DEFAULT_DAY_HOURS)]
  pub day_hours: f64,

  /// Warn about days with fewer working hours (default: --day-hours)
  #[arg(long)]
  pub min_day_hours: Option<f64>,

  /// Warn about days with more working hours
  #[arg(long, default_value_t = DEFAULT_MAX_DAY_HOURS)]
  pub max_day_hours: f64,

  /// Show every task level on its own row
  #[arg(long)]
  pub no_collapse: bool,

  /// List each slot and its notes under the finest periods
  #[arg(short = 'n', long)]
  pub notes: bool,

  /// Spell durations out ("3 days, 3 hours") instead of "3d 3h"
  #[arg(long)]
  pub long_units: bool,

  /// Output format
  #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
  pub format: OutputFormat,

  /// Skip timesheets that fail to parse instead of aborting
  #[arg(long)]
  pub skip_invalid: bool,

  /// Output file (default stdout "-")
  #[arg(long, default_value = "-")]
  pub out: String,

  /// Directory holding the weekly timesheets
  #[arg(long, env = "TIMESHEET_DIR", default_value = ".")]
  pub dir: PathBuf,

  /// Timesheet file extension
  #[arg(long, default_value = "txt")]
  pub ext: String,

  /// More logging on stderr (-v info, -vv debug)
  #[arg(short = 'v', long, action = clap::ArgAction::Count)]
  pub verbose: u8,

  /// Emit a troff man page to stdout (internal; for packaging)
  #[arg(long, hide = true)]
  pub gen_man: bool,

  /// Override the "now" instant for natural-language parsing (hidden; tests only)
  #[arg(long = "now-override", hide = true)]
  pub now_override: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EffectiveConfig {
  pub paths: Vec<String>,
  pub dir: String,
  pub ext: String,
  pub resolutions: Vec<Resolution>,
  pub max_depth: usize,
  pub window: WindowSpec,
  pub task: Option<TaskPath>,
  pub commits: bool,
  pub repo: String,
  pub commit_log: Option<String>,
  pub strictness: Strictness,
  pub wrap_midnight: bool,
  pub blank_as_misc: bool,
  pub non_working: Vec<String>,
  pub show_non_working: bool,
  pub day_hours: f64,
  pub min_day_hours: f64,
  pub max_day_hours: f64,
  pub collapse: bool,
  pub notes: bool,
  pub units: UnitStyle,
  pub format: OutputFormat,
  pub skip_invalid: bool,
  pub out: String,
  pub now_override: Option<String>,
}

fn check_hours(flag: &str, value: f64) -> Result<f64> {
  if !value.is_finite() || value <= 0.0 || value > 24.0 {
    bail!("{flag} must be between 0 and 24 hours, got {value}");
  }
  Ok(value)
}

pub fn normalize(cli: Cli) -> Result<EffectiveConfig> {
  // Validate window selection
  let ranged = cli.since.is_some() || cli.until.is_some();
  let window = match (&cli.month, &cli.for_str, ranged, cli.standup) {
    (None, None, false, false) => WindowSpec::All,
    (Some(ym), None, false, false) => WindowSpec::Month { ym: ym.clone() },
    (None, Some(p), false, false) => WindowSpec::ForPhrase { phrase: p.clone() },
    (None, None, true, false) => WindowSpec::SinceUntil {
      since: cli.since.clone(),
      until: cli.until.clone(),
    },
    (None, None, false, true) => WindowSpec::Standup,
    _ => bail!("Ambiguous time selection: choose only one of --month | --for | --since/--until | --standup"),
  };

  if cli.commit_log.is_some() && !cli.commits {
    bail!("--commit-log requires --commits");
  }

  let day_hours = check_hours("--day-hours", cli.day_hours)?;
  let min_day_hours = check_hours("--min-day-hours", cli.min_day_hours.unwrap_or(day_hours))?;
  let max_day_hours = check_hours("--max-day-hours", cli.max_day_hours)?;
  if min_day_hours > max_day_hours {
    bail!("--min-day-hours ({min_day_hours}) is above --max-day-hours ({max_day_hours})");
  }

  let non_working = if cli.afk.is_empty() {
    DEFAULT_NON_WORKING.iter().map(|s| s.to_string()).collect()
  } else {
    cli.afk.clone()
  };

  let task = cli.task.as_deref().map(str::trim).filter(|t| !t.is_empty()).map(TaskPath::parse);

  Ok(EffectiveConfig {
    paths: cli.paths.iter().map(|p| p.to_string_lossy().to_string()).collect(),
    dir: cli.dir.to_string_lossy().to_string(),
    ext: cli.ext,
    resolutions: normalize_resolutions(cli.granularity),
    max_depth: cli.max_depth,
    window,
    task,
    commits: cli.commits,
    repo: util::canonicalize_lossy(&cli.repo),
    commit_log: cli.commit_log.as_deref().map(util::canonicalize_lossy),
    strictness: if cli.strict { Strictness::Strict } else { Strictness::Lenient },
    wrap_midnight: cli.wrap_midnight,
    blank_as_misc: cli.blank_as_misc,
    non_working,
    show_non_working: cli.show_afk,
    day_hours,
    min_day_hours,
    max_day_hours,
    collapse: !cli.no_collapse,
    notes: cli.notes,
    units: if cli.long_units { UnitStyle::Long } else { UnitStyle::Compact },
    format: cli.format,
    skip_invalid: cli.skip_invalid,
    out: cli.out,
    now_override: cli.now_override.clone(),
  })
}
