// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Orchestrate a run: find timesheets, parse them in parallel, validate, filter, aggregate, annotate and render
// role: processing/orchestrator
// inputs: EffectiveConfig, resolved now
// outputs: Rendered report text; written to stdout or --out by process
// side_effects: Reads timesheets; may spawn git; prints notices to stderr; writes the report
// invariants:
// - parse results are consumed in input order regardless of rayon scheduling
// - a file with a fatal parse error or an error finding aborts the run unless skip_invalid
// - every skipped file and every finding produces a stderr line
// errors: Propagates parse/IO/git errors with file path context
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::NaiveDateTime;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::aggregate::build_report;
use crate::cli::EffectiveConfig;
use crate::commits::CommitLog;
use crate::error::{FileError, ParseError};
use crate::gitio;
use crate::model::Slot;
use crate::params::{ReportParams, build_report_params};
use crate::parse::parse_file;
use crate::render::{FileFinding, OutputFormat, ReportMeta, SkippedFile, render_json, render_text};
use crate::util;
use crate::validate::{Severity, has_errors, validate};
use crate::window::{default_timesheet, parse_now_override};

/// Files named on the command line, with directories expanded; this week's
/// file in `dir` when nothing was named.
pub fn resolve_inputs(cfg: &EffectiveConfig, now: NaiveDateTime) -> Result<Vec<PathBuf>> {
  if cfg.paths.is_empty() {
    let path = default_timesheet(Path::new(&cfg.dir), &cfg.ext, now);
    info!(path = %path.display(), "no timesheets given; using this week's");
    return Ok(vec![path]);
  }

  let mut out = Vec::new();
  for raw in &cfg.paths {
    let path = PathBuf::from(raw);
    if path.is_dir() {
      let found = util::timesheets_in_dir(&path)?;
      debug!(dir = %path.display(), files = found.len(), "expanded directory");
      out.extend(found);
    } else {
      out.push(path);
    }
  }
  Ok(out)
}

fn severity_tag(severity: Severity) -> &'static str {
  match severity {
    Severity::Warning => "warning",
    Severity::Error => "error",
  }
}

/// Parsed and validated slots of every usable file, in input order.
fn collect_slots(paths: &[PathBuf], params: &ReportParams, skip_invalid: bool) -> Result<(Vec<Slot>, ReportMeta)> {
  let parsed: Vec<Result<Vec<Slot>, FileError>> = paths.par_iter().map(|p| parse_file(p, &params.parse)).collect();

  let mut meta = ReportMeta::default();
  let mut slots = Vec::new();
  let mut failed = 0usize;

  for (path, result) in paths.iter().zip(parsed) {
    let display = path.display().to_string();
    let file_slots = match result {
      Ok(s) => s,
      Err(err) if skip_invalid => {
        eprintln!("warning: skipping {err}");
        meta.skipped.push(SkippedFile {
          path: display,
          error: err.to_string(),
          line: err.parse_error().and_then(ParseError::line),
        });
        continue;
      }
      Err(err) => return Err(err.into()),
    };

    let findings = validate(&file_slots, &params.validate);
    for finding in &findings {
      eprintln!("{}: {}: {}", severity_tag(finding.severity), display, finding.message);
    }
    let fatal = has_errors(&findings);
    meta
      .findings
      .extend(findings.into_iter().map(|finding| FileFinding {
        path: display.clone(),
        finding,
      }));

    if fatal {
      if !skip_invalid {
        failed += 1;
        continue;
      }
      eprintln!("warning: skipping {display}: validation errors");
      meta.skipped.push(SkippedFile {
        path: display,
        error: "validation errors".into(),
        line: None,
      });
      continue;
    }

    let path = &display;
    debug!(path = %path, slots = file_slots.len(), "accepted timesheet");
    meta.files.push(display);
    slots.extend(file_slots);
  }

  if failed > 0 {
    bail!("{failed} timesheet(s) failed validation");
  }

  slots.sort_by_key(|s| s.start);
  Ok((slots, meta))
}

fn load_commits(cfg: &EffectiveConfig, slots: &[Slot]) -> Result<Option<CommitLog>> {
  if !cfg.commits {
    return Ok(None);
  }
  if let Some(path) = &cfg.commit_log {
    return CommitLog::from_json_file(Path::new(path)).map(Some);
  }
  let (Some(first), Some(last)) = (slots.first(), slots.iter().map(|s| s.end).max()) else {
    return Ok(Some(CommitLog::default()));
  };
  if !gitio::is_work_tree(&cfg.repo) {
    bail!("--commits: {} is not a git work tree", cfg.repo);
  }
  CommitLog::from_git(&cfg.repo, first.start, last).map(Some)
}

/// Build the report text for `cfg` as of `now`.
pub fn generate_report(cfg: &EffectiveConfig, now: NaiveDateTime) -> Result<String> {
  let params = build_report_params(cfg, now)?;
  debug!(config = %serde_json::to_string(cfg)?, "effective config");

  let paths = resolve_inputs(cfg, now)?;
  if paths.is_empty() {
    bail!("no timesheets found");
  }

  let (slots, meta) = collect_slots(&paths, &params, cfg.skip_invalid)?;
  let slots = params.filter.apply(slots);
  info!(files = meta.files.len(), slots = slots.len(), "slots selected");

  let commits = load_commits(cfg, &slots).context("loading commits")?;
  if let Some(log) = &commits {
    info!(commits = log.len(), "commit log loaded");
    if log.is_empty() && !slots.is_empty() {
      eprintln!("warning: no commits found while the selected slots were open");
    }
  }
  let periods = build_report(&slots, &cfg.resolutions, &params.aggregate);
  if periods.is_empty() {
    eprintln!("warning: no time recorded in the selected window");
  }

  match cfg.format {
    OutputFormat::Text => Ok(render_text(&periods, &params.render, commits.as_ref())),
    OutputFormat::Json => render_json(&meta, &periods, &params.render, commits.as_ref()),
  }
}

pub fn process(cfg: &EffectiveConfig) -> Result<()> {
  let now = util::effective_now(parse_now_override(cfg.now_override.as_deref()));
  let text = generate_report(cfg, now)?;
  util::write_output(&cfg.out, &text)
}
