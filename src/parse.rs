// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Turn the lines of one weekly timesheet into an ordered list of closed slots
// role: parsing/state machine
// inputs: start date (from the YYYYMMDD file name), lines, ParseOptions
// outputs: Vec<Slot> in chronological order
// side_effects: parse_file reads one file; everything else is pure
// invariants:
// - each parse owns a fresh SlotParser; no state is shared between files
// - every returned slot has end > start; successive slots do not overlap
// - taskless clock marks never appear in the output
// errors: ParseError with the 1-based offending line; FileError adds the path
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::io::BufRead;
use std::path::Path;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::clock;
use crate::error::{FileError, ParseError};
use crate::model::{Slot, Strictness, TaskPath};

pub const DAYS: [&str; 7] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"];

/// Minimum run of `-` or `#` that ends the machine-readable part of a file.
pub const NOTES_DELIMITER_MIN: usize = 20;

static TASK_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})\s?(.*)$").expect("task start regex"));
static DATE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date marker regex"));

#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
  pub strictness: Strictness,
  /// Let a time earlier than the previous one on the same day roll over to the next date.
  pub allow_midnight_wrap: bool,
  /// Blank task lines open a `misc` slot instead of acting as clock marks.
  pub blank_as_misc: bool,
  /// Time of day substituted for the `9999` token.
  pub now: Option<NaiveTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DayMarker {
  Weekday(Weekday),
  Date(NaiveDate),
}

impl DayMarker {
  fn weekday(self) -> Weekday {
    match self {
      DayMarker::Weekday(w) => w,
      DayMarker::Date(d) => d.weekday(),
    }
  }

  fn matches(self, expected: NaiveDate) -> bool {
    match self {
      DayMarker::Weekday(w) => w == expected.weekday(),
      DayMarker::Date(d) => d == expected,
    }
  }
}

#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
  Blank,
  Day(DayMarker),
  Stamp { token: &'a str, task: Option<&'a str> },
  EndOfContent,
  Text(&'a str),
}

fn weekday_from_name(name: &str) -> Option<Weekday> {
  const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
  ];
  DAYS.iter().position(|d| *d == name).map(|i| WEEKDAYS[i])
}

fn weekday_name(day: Weekday) -> &'static str {
  DAYS[day.num_days_from_monday() as usize]
}

fn is_notes_delimiter(line: &str) -> bool {
  let mut chars = line.chars();
  match chars.next() {
    Some(first @ ('-' | '#')) => line.len() >= NOTES_DELIMITER_MIN && chars.all(|c| c == first),
    _ => false,
  }
}

fn classify(raw: &str) -> Line<'_> {
  let line = raw.trim();
  if line.is_empty() {
    return Line::Blank;
  }
  if let Some(day) = weekday_from_name(line) {
    return Line::Day(DayMarker::Weekday(day));
  }
  if DATE_MARKER.is_match(line) {
    if let Ok(date) = NaiveDate::parse_from_str(line, "%Y-%m-%d") {
      return Line::Day(DayMarker::Date(date));
    }
  }
  if let Some(caps) = TASK_START.captures(line) {
    let token = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    let task = caps.get(2).map(|m| m.as_str().trim()).filter(|t| !t.is_empty());
    return Line::Stamp { token, task };
  }
  if is_notes_delimiter(line) {
    return Line::EndOfContent;
  }
  Line::Text(line)
}

/// Whether parsing should go on after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
  Continue,
  Stop,
}

#[derive(Debug)]
struct DayCursor {
  date: NaiveDate,
  /// Date that clock times are anchored to; moves past `date` after a midnight wrap.
  clock_date: NaiveDate,
  stamped: bool,
  /// Line of the day marker.
  line: usize,
}

#[derive(Debug)]
struct OpenSlot {
  start: NaiveDateTime,
  task: TaskPath,
  /// Opened by a timestamp with no task text.
  blank: bool,
  note: Vec<String>,
  line: usize,
}

/// Line-driven parser for one timesheet. Feed lines in order, then call
/// [`SlotParser::finish`].
#[derive(Debug)]
pub struct SlotParser<'o> {
  options: &'o ParseOptions,
  start_date: NaiveDate,
  day: Option<DayCursor>,
  open: Option<OpenSlot>,
  last_stamp: Option<NaiveDateTime>,
  slots: Vec<Slot>,
  last_line: usize,
  stopped: bool,
}

impl<'o> SlotParser<'o> {
  pub fn new(start_date: NaiveDate, options: &'o ParseOptions) -> Self {
    Self {
      options,
      start_date,
      day: None,
      open: None,
      last_stamp: None,
      slots: Vec::new(),
      last_line: 0,
      stopped: false,
    }
  }

  /// Consume one line (`line_no` is 1-based).
  pub fn feed(&mut self, line_no: usize, raw: &str) -> Result<Flow, ParseError> {
    if self.stopped {
      return Ok(Flow::Stop);
    }
    self.last_line = line_no;

    match classify(raw) {
      Line::Blank => {}
      Line::Day(marker) => self.start_day(line_no, marker)?,
      Line::Stamp { token, task } => self.stamp(line_no, token, task)?,
      Line::EndOfContent => {
        debug!(line = line_no, "notes section reached");
        self.stopped = true;
        return Ok(Flow::Stop);
      }
      Line::Text(text) => self.note(line_no, text)?,
    }
    Ok(Flow::Continue)
  }

  /// Close the last day and hand out the slots.
  pub fn finish(mut self) -> Result<Vec<Slot>, ParseError> {
    if self.day.is_none() {
      return Err(ParseError::NoDaysFound);
    }
    self.close_day(true)?;
    Ok(self.slots)
  }

  fn start_day(&mut self, line: usize, marker: DayMarker) -> Result<(), ParseError> {
    let date = match &self.day {
      None => {
        if !marker.matches(self.start_date) {
          return Err(ParseError::WeekStartMismatch {
            line,
            expected: self.start_date.weekday(),
            found: marker.weekday(),
          });
        }
        self.start_date
      }
      Some(cursor) => {
        let previous = cursor.date;
        let expected = previous.succ_opt().filter(|next| marker.matches(*next));
        match expected {
          Some(next) => next,
          None => {
            return Err(ParseError::DaySequenceError {
              line,
              previous: previous.weekday(),
              expected: previous.weekday().succ(),
              found: marker.weekday(),
            })
          }
        }
      }
    };

    self.close_day(false)?;
    debug!(line, day = weekday_name(date.weekday()), %date, "day started");
    self.day = Some(DayCursor {
      date,
      clock_date: date,
      stamped: false,
      line,
    });
    Ok(())
  }

  /// End-of-day rule: the day must finish on a clock mark. A day with no
  /// timestamps at all is only tolerated mid-week, and only when lenient.
  fn close_day(&mut self, last: bool) -> Result<(), ParseError> {
    if let Some(open) = self.open.take() {
      let clean_mark = open.blank && (open.note.is_empty() || !self.options.blank_as_misc);
      if !clean_mark {
        return Err(ParseError::UnterminatedTask {
          line: open.line,
          task: open.task.to_string(),
          date: open.start.date(),
        });
      }
    }

    match &self.day {
      Some(day) if !day.stamped => {
        if last || self.options.strictness == Strictness::Strict {
          return Err(ParseError::NoEndTime {
            line: day.line,
            date: day.date,
          });
        }
        debug!(line = day.line, date = %day.date, "day has no entries");
        Ok(())
      }
      _ => Ok(()),
    }
  }

  fn stamp(&mut self, line: usize, token: &str, task: Option<&str>) -> Result<(), ParseError> {
    let allow_wrap = self.options.allow_midnight_wrap;
    let last_stamp = self.last_stamp;

    let day = match self.day.as_mut() {
      Some(day) => day,
      None => {
        return Err(ParseError::TaskOutsideDay {
          line,
          task: task.unwrap_or_default().to_string(),
        })
      }
    };

    let time = clock::parse_clock(token, self.options.now).ok_or_else(|| ParseError::InvalidTime {
      line,
      token: token.to_string(),
    })?;

    let mut stamp = day.clock_date.and_time(time);
    if let Some(previous) = last_stamp {
      if stamp <= previous {
        // at most one wrap per day marker
        let wraps = allow_wrap
          && day.stamped
          && stamp < previous
          && day.clock_date == day.date
          && previous.date() == day.clock_date;
        let next_date = if wraps { day.clock_date.succ_opt() } else { None };
        match next_date {
          Some(next) => {
            debug!(line, "clock wrapped past midnight");
            day.clock_date = next;
            stamp = next.and_time(time);
          }
          None => {
            return Err(ParseError::TaskOrderingError {
              line,
              previous,
              found: stamp,
            })
          }
        }
      }
    }
    day.stamped = true;

    if let Some(open) = self.open.take() {
      self.close_slot(open, stamp);
    }

    self.open = Some(OpenSlot {
      start: stamp,
      task: task.map(TaskPath::parse).unwrap_or_else(TaskPath::misc),
      blank: task.is_none(),
      note: Vec::new(),
      line,
    });
    self.last_stamp = Some(stamp);
    Ok(())
  }

  fn close_slot(&mut self, open: OpenSlot, end: NaiveDateTime) {
    if open.blank && !self.options.blank_as_misc {
      return;
    }
    self.slots.push(Slot {
      start: open.start,
      end,
      task: open.task,
      note: open.note.join("\n"),
    });
  }

  fn note(&mut self, line: usize, text: &str) -> Result<(), ParseError> {
    let accepts_notes = self.options.blank_as_misc;
    match self.open.as_mut() {
      Some(open) if !open.blank || accepts_notes => {
        open.note.push(text.to_string());
        Ok(())
      }
      _ => match self.options.strictness {
        Strictness::Strict => Err(ParseError::StrayNoteError {
          line,
          text: text.to_string(),
        }),
        Strictness::Lenient => {
          debug!(line, text, "ignoring text outside any task");
          Ok(())
        }
      },
    }
  }
}

/// Parse the lines of one timesheet whose first day is `start_date`.
pub fn parse_lines<I, S>(start_date: NaiveDate, lines: I, options: &ParseOptions) -> Result<Vec<Slot>, ParseError>
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  let mut parser = SlotParser::new(start_date, options);
  for (idx, line) in lines.into_iter().enumerate() {
    if parser.feed(idx + 1, line.as_ref())? == Flow::Stop {
      break;
    }
  }
  parser.finish()
}

/// Parse a timesheet from any buffered reader.
pub fn parse_reader<R: BufRead>(
  start_date: NaiveDate,
  reader: R,
  options: &ParseOptions,
  path: &Path,
) -> Result<Vec<Slot>, FileError> {
  let mut parser = SlotParser::new(start_date, options);
  for (idx, line) in reader.lines().enumerate() {
    let line = line.map_err(|source| FileError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    let flow = parser.feed(idx + 1, &line).map_err(|source| FileError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    if flow == Flow::Stop {
      break;
    }
  }
  parser.finish().map_err(|source| FileError::Parse {
    path: path.to_path_buf(),
    source,
  })
}

/// Start date encoded in a timesheet file name (`YYYYMMDD`, extension optional).
pub fn start_date_from_path(path: &Path) -> Result<NaiveDate, ParseError> {
  let name = path
    .file_name()
    .map(|n| n.to_string_lossy().to_string())
    .unwrap_or_default();
  let stem = path
    .file_stem()
    .map(|s| s.to_string_lossy().to_string())
    .unwrap_or_default();

  if stem.len() != 8 || !stem.bytes().all(|b| b.is_ascii_digit()) {
    return Err(ParseError::MalformedFileName { name });
  }
  NaiveDate::parse_from_str(&stem, "%Y%m%d").map_err(|_| ParseError::MalformedFileName { name })
}

/// Read and parse one timesheet file.
pub fn parse_file(path: &Path, options: &ParseOptions) -> Result<Vec<Slot>, FileError> {
  let start_date = start_date_from_path(path).map_err(|source| FileError::Parse {
    path: path.to_path_buf(),
    source,
  })?;
  let file = std::fs::File::open(path).map_err(|source| FileError::Io {
    path: path.to_path_buf(),
    source,
  })?;
  let slots = parse_reader(start_date, std::io::BufReader::new(file), options, path)?;
  debug!(path = %path.display(), slots = slots.len(), "parsed timesheet");
  Ok(slots)
}
