// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Typed parse failures with line-level context, plus file-level wrapping for IO and parse errors
// role: errors/types
// outputs: ParseError (one variant per structural failure), FileError (path + cause)
// invariants:
// - every line-anchored variant carries the 1-based line number of the offending line
// - Display strings are single-line and suitable for stderr
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime, Weekday};
use thiserror::Error;

/// Structural failures raised while turning timesheet lines into slots.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
  /// The file name does not start with a `YYYYMMDD` date.
  #[error("cannot read a start date from file name {name:?} (expected YYYYMMDD)")]
  MalformedFileName { name: String },

  /// The first day marker is not the weekday of the file's start date.
  #[error("line {line}: week does not start where expected: expected {expected}, found {found}")]
  WeekStartMismatch { line: usize, expected: Weekday, found: Weekday },

  #[error("line {line}: day does not follow day: expected {expected} after {previous}, found {found}")]
  DaySequenceError {
    line: usize,
    previous: Weekday,
    expected: Weekday,
    found: Weekday,
  },

  /// The day ended while a real task was still open.
  #[error("line {line}: no end time given for last task {task:?} on {date}")]
  UnterminatedTask { line: usize, task: String, date: NaiveDate },

  /// A day marker that never got a timestamp.
  #[error("line {line}: no end time given for {date}")]
  NoEndTime { line: usize, date: NaiveDate },

  #[error("line {line}: task cannot start before previous task ({found} is not after {previous})")]
  TaskOrderingError {
    line: usize,
    previous: NaiveDateTime,
    found: NaiveDateTime,
  },

  #[error("no days found")]
  NoDaysFound,

  #[error("line {line}: stray text outside any task: {text:?}")]
  StrayNoteError { line: usize, text: String },

  #[error("line {line}: task {task:?} starts before the first day marker")]
  TaskOutsideDay { line: usize, task: String },

  #[error("line {line}: invalid time {token:?}")]
  InvalidTime { line: usize, token: String },
}

impl ParseError {
  /// Line number the error points at, when it has one.
  pub fn line(&self) -> Option<usize> {
    match self {
      ParseError::MalformedFileName { .. } | ParseError::NoDaysFound => None,
      ParseError::WeekStartMismatch { line, .. }
      | ParseError::DaySequenceError { line, .. }
      | ParseError::UnterminatedTask { line, .. }
      | ParseError::NoEndTime { line, .. }
      | ParseError::TaskOrderingError { line, .. }
      | ParseError::StrayNoteError { line, .. }
      | ParseError::TaskOutsideDay { line, .. }
      | ParseError::InvalidTime { line, .. } => Some(*line),
    }
  }
}

/// Failure to turn one timesheet file into slots.
#[derive(Error, Debug)]
pub enum FileError {
  #[error("reading {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("{}: {source}", path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: ParseError,
  },
}

impl FileError {
  pub fn path(&self) -> &std::path::Path {
    match self {
      FileError::Io { path, .. } | FileError::Parse { path, .. } => path,
    }
  }

  /// The underlying parse error, if this was not an IO failure.
  pub fn parse_error(&self) -> Option<&ParseError> {
    match self {
      FileError::Parse { source, .. } => Some(source),
      FileError::Io { .. } => None,
    }
  }
}
