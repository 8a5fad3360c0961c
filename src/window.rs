use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Weekday};
use chrono_english::{Interval, parse_duration};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use two_timer::parse as parse_natural;

// Report windows: which slots make it into the report, and where this week's file lives.

static LAST_WEEKDAY: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^last\s+(monday|tuesday|wednesday|thursday|friday|saturday|sunday)$").expect("last weekday regex")
});

#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum WindowSpec {
  All,
  Month { ym: String },
  ForPhrase { phrase: String },
  SinceUntil { since: Option<String>, until: Option<String> },
  Standup,
}

/// Resolved bounds; `since` is inclusive and `until` exclusive.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Default, Serialize)]
pub struct Window {
  pub since: Option<NaiveDateTime>,
  pub until: Option<NaiveDateTime>,
}

impl Window {
  pub fn new(since: NaiveDateTime, until: NaiveDateTime) -> Self {
    Window {
      since: Some(since),
      until: Some(until),
    }
  }

  pub fn is_unbounded(&self) -> bool {
    self.since.is_none() && self.until.is_none()
  }

  pub fn contains(&self, t: NaiveDateTime) -> bool {
    self.since.map_or(true, |s| t >= s) && self.until.map_or(true, |u| t < u)
  }
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
  date.and_time(chrono::NaiveTime::MIN)
}

pub fn month_bounds(year_month: &str) -> Result<(NaiveDateTime, NaiveDateTime)> {
  let parts: Vec<&str> = year_month.split('-').collect();

  if parts.len() != 2 {
    bail!("invalid --month, expected YYYY-MM");
  }
  let y: i32 = parts[0].parse().context("parsing year in --month")?;
  let m: u32 = parts[1].parse().context("parsing month in --month")?;

  if !(1..=12).contains(&m) {
    bail!("invalid month in --month");
  }
  let (next_y, next_m) = if m == 12 { (y + 1, 1) } else { (y, m + 1) };

  let start = NaiveDate::from_ymd_opt(y, m, 1).context("invalid --month")?;
  let end = NaiveDate::from_ymd_opt(next_y, next_m, 1).context("invalid --month")?;
  Ok((midnight(start), midnight(end)))
}

/// Resolve a window against `now` (local, naive).
pub fn resolve_window(window: &WindowSpec, now: NaiveDateTime) -> Result<Window> {
  match window {
    WindowSpec::All => Ok(Window::default()),
    WindowSpec::Month { ym } => {
      let (since, until) = month_bounds(ym)?;
      Ok(Window::new(since, until))
    }
    WindowSpec::ForPhrase { phrase } => {
      let (since, until) = for_phrase_bounds(phrase, now)?;
      Ok(Window::new(since, until))
    }
    WindowSpec::SinceUntil { since, until } => Ok(Window {
      since: since
        .as_deref()
        .map(|s| parse_bound(s, now).with_context(|| format!("parsing --since {s:?}")))
        .transpose()?,
      until: until
        .as_deref()
        .map(|u| parse_bound(u, now).with_context(|| format!("parsing --until {u:?}")))
        .transpose()?,
    }),
    WindowSpec::Standup => {
      let (since, until) = standup_bounds(now);
      Ok(Window::new(since, until))
    }
  }
}

pub fn start_of_week(date: NaiveDate) -> NaiveDate {
  date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Default timesheet for the week containing `now`: `<dir>/<Monday as YYYYMMDD>.<ext>`.
pub fn default_timesheet(dir: &Path, ext: &str, now: NaiveDateTime) -> PathBuf {
  let monday = start_of_week(now.date());
  let stem = monday.format("%Y%m%d").to_string();
  if ext.is_empty() {
    dir.join(stem)
  } else {
    dir.join(format!("{stem}.{}", ext.trim_start_matches('.')))
  }
}

/// Most recent working day before `date`; weekends count back to Friday.
pub fn previous_working_day(date: NaiveDate) -> NaiveDate {
  let back = match date.weekday() {
    Weekday::Mon => 3,
    Weekday::Sun => 2,
    _ => 1,
  };
  date - Duration::days(back)
}

/// Previous working day 00:00 through the end of today.
pub fn standup_bounds(now: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
  let today = now.date();
  let since = midnight(previous_working_day(today));
  let until = midnight(today) + Duration::days(1);
  (since, until)
}

fn last_week_range(now: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
  let start_this_week = start_of_week(now.date());
  let start_last_week = start_this_week - Duration::days(7);
  (midnight(start_last_week), midnight(start_this_week))
}

fn last_month_range(now: NaiveDateTime) -> Option<(NaiveDateTime, NaiveDateTime)> {
  let y = now.year();
  let m = now.month();
  let (last_y, last_m) = if m == 1 { (y - 1, 12) } else { (y, m - 1) };
  let start_last = NaiveDate::from_ymd_opt(last_y, last_m, 1)?;
  let start_this = NaiveDate::from_ymd_opt(y, m, 1)?;
  Some((midnight(start_last), midnight(start_this)))
}

fn weekday_index(day: &str) -> i64 {
  match day {
    "monday" => 0,
    "tuesday" => 1,
    "wednesday" => 2,
    "thursday" => 3,
    "friday" => 4,
    "saturday" => 5,
    "sunday" => 6,
    _ => 0,
  }
}

fn apply_interval(now: NaiveDateTime, interval: Interval) -> Option<NaiveDateTime> {
  match interval {
    Interval::Seconds(secs) => Some(now + Duration::seconds(secs.into())),
    Interval::Days(days) => Some(now + Duration::days(days.into())),
    Interval::Months(months) => add_months(now, months),
  }
}

fn natural_range(phrase: &str, now: NaiveDateTime) -> Option<(NaiveDateTime, NaiveDateTime)> {
  let config = two_timer::Config::new().now(now);
  parse_natural(phrase, Some(config)).ok().map(|(start, end, _lit)| (start, end))
}

/// Bounds for a `--for` phrase.
fn for_phrase_bounds(input: &str, now: NaiveDateTime) -> Result<(NaiveDateTime, NaiveDateTime)> {
  let phrase = input.trim().to_lowercase();
  let today = midnight(now.date());

  // Whole calendar days for the common phrases.
  if phrase == "today" {
    return Ok((today, today + Duration::days(1)));
  }

  if phrase == "yesterday" {
    return Ok((today - Duration::days(1), today));
  }

  if phrase == "this week" {
    let (_, start_this_week) = last_week_range(now);
    return Ok((start_this_week, start_this_week + Duration::days(7)));
  }

  if phrase == "last week" {
    return Ok(last_week_range(now));
  }

  if phrase == "last month" {
    return last_month_range(now).context("computing last month");
  }

  // last <weekday>: the strictly previous occurrence, that day only
  if let Some(caps) = LAST_WEEKDAY.captures(&phrase) {
    let target_idx = caps.get(1).map(|m| weekday_index(m.as_str())).unwrap_or_default();
    let cur_idx = i64::from(now.weekday().num_days_from_monday());
    let mut delta_days = cur_idx - target_idx;
    if delta_days <= 0 {
      delta_days += 7;
    }
    let since = today - Duration::days(delta_days);
    return Ok((since, since + Duration::days(1)));
  }

  // Durations ("2 weeks ago", "3 days") run between that point and now.
  if let Ok(interval) = parse_duration(&phrase) {
    let other = apply_interval(now, interval).context("duration out of range")?;
    return Ok(if other < now { (other, now) } else { (now, other) });
  }

  if let Some((start, end)) = natural_range(&phrase, now) {
    return Ok((start, end));
  }

  bail!("could not understand --for {input:?}")
}

/// Parse one `--since`/`--until` value.
///
/// Dates and timestamps are taken literally; durations count from `now`;
/// other phrases resolve to the start of the range they describe.
pub fn parse_bound(input: &str, now: NaiveDateTime) -> Result<NaiveDateTime> {
  let raw = input.trim();
  if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
    return Ok(midnight(date));
  }
  for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
      return Ok(ts);
    }
  }

  let phrase = raw.to_lowercase();
  if phrase == "now" {
    return Ok(now);
  }
  if let Ok(interval) = parse_duration(&phrase) {
    return apply_interval(now, interval).context("duration out of range");
  }
  if let Some((start, _)) = natural_range(&phrase, now) {
    return Ok(start);
  }
  bail!("expected YYYY-MM-DD, YYYY-MM-DDTHH:MM:SS or a phrase like \"2 weeks ago\"")
}

/// Parse a `--now-override` string into a naive local timestamp.
/// Accepts RFC3339 (e.g. 2025-08-15T12:00:00Z) or `%Y-%m-%dT%H:%M:%S`.
pub fn parse_now_override(s: Option<&str>) -> Option<NaiveDateTime> {
  s.and_then(|raw| {
    chrono::DateTime::parse_from_rfc3339(raw)
      .ok()
      .map(|dt| dt.with_timezone(&chrono::Local).naive_local())
      .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").ok())
  })
}

fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
  let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
  let first_next = NaiveDate::from_ymd_opt(ny, nm, 1)?;
  first_next.pred_opt().map(|d| d.day())
}

fn add_months(dt: NaiveDateTime, n: i32) -> Option<NaiveDateTime> {
  let total = (dt.year() * 12 + dt.month() as i32 - 1) + n;
  let y = total.div_euclid(12);
  let m = (total.rem_euclid(12) + 1) as u32;
  let d = dt.day().min(last_day_of_month(y, m)?);
  NaiveDate::from_ymd_opt(y, m, d)?.and_hms_opt(dt.hour(), dt.minute(), dt.second())
}
