// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Load a commit log once per run and answer which commits fall inside a slot
// role: annotation/lookup
// inputs: git repository path or JSON commit-log file; slot intervals
// outputs: CommitLog (sorted, read-only); borrowed &[CommitEntry] per interval
// side_effects: from_git spawns git; from_json_file reads one file
// invariants:
// - entries are sorted by timestamp; equal timestamps keep load order
// - within(start, end) is half-open: start <= t < end
// errors: git/IO/JSON failures bubble as anyhow errors with context
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::gitio;
use crate::model::Slot;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitEntry {
  pub timestamp: NaiveDateTime,
  pub message: String,
}

impl CommitEntry {
  pub fn subject(&self) -> &str {
    self.message.lines().next().unwrap_or_default()
  }
}

/// Drop `#` comment lines and surrounding blank lines from a commit message.
pub fn clean_message(raw: &str) -> String {
  raw
    .lines()
    .filter(|l| !l.starts_with('#'))
    .collect::<Vec<_>>()
    .join("\n")
    .trim()
    .to_string()
}

#[derive(Debug, Clone, Default)]
pub struct CommitLog {
  entries: Vec<CommitEntry>,
}

impl CommitLog {
  pub fn new(mut entries: Vec<CommitEntry>) -> Self {
    entries.sort_by_key(|e| e.timestamp);
    CommitLog { entries }
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Commits with `start <= timestamp < end`, oldest first.
  pub fn within(&self, start: NaiveDateTime, end: NaiveDateTime) -> &[CommitEntry] {
    let lo = self.entries.partition_point(|e| e.timestamp < start);
    let hi = self.entries.partition_point(|e| e.timestamp < end).max(lo);
    &self.entries[lo..hi]
  }

  pub fn for_slot(&self, slot: &Slot) -> &[CommitEntry] {
    self.within(slot.start, slot.end)
  }

  /// Commits reachable from any ref in `repo` between `since` and `until`.
  pub fn from_git(repo: &str, since: NaiveDateTime, until: NaiveDateTime) -> Result<Self> {
    let raw = gitio::commit_log(repo, since, until).with_context(|| format!("reading commit log from {repo}"))?;
    let mut entries = Vec::with_capacity(raw.len());
    for (date, message) in raw {
      let timestamp = NaiveDateTime::parse_from_str(&date, gitio::GIT_DATE_FORMAT)
        .with_context(|| format!("parsing commit date {date:?}"))?;
      entries.push(CommitEntry {
        timestamp,
        message: clean_message(&message),
      });
    }
    debug!(repo, commits = entries.len(), "loaded git commit log");
    Ok(CommitLog::new(entries))
  }

  /// A JSON array of `{ "timestamp": "YYYY-MM-DDTHH:MM:SS", "message": "..." }`.
  pub fn from_json_file(path: &Path) -> Result<Self> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading commit log {}", path.display()))?;
    let entries: Vec<CommitEntry> =
      serde_json::from_str(&text).with_context(|| format!("parsing commit log {}", path.display()))?;
    let entries = entries
      .into_iter()
      .map(|e| CommitEntry {
        message: clean_message(&e.message),
        ..e
      })
      .collect::<Vec<_>>();
    debug!(path = %path.display(), commits = entries.len(), "loaded commit log file");
    Ok(CommitLog::new(entries))
  }
}
