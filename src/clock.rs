//! Clock and duration helpers: `HHMM` tokens and man-day formatting.

use chrono::{Duration, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Timestamp token that stands for the current time of day.
pub const NOW_TOKEN: &str = "9999";

/// Default length of a man-day, in hours.
pub const DEFAULT_DAY_HOURS: f64 = 7.5;

/// Convert an `HHMM` token to minutes past midnight.
///
/// Returns `None` unless the token is exactly four digits with hours in
/// `00..=23` and minutes in `00..=59`.
pub fn hhmm_to_minutes(token: &str) -> Option<u32> {
  if token.len() != 4 || !token.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  let hours: u32 = token[..2].parse().ok()?;
  let minutes: u32 = token[2..].parse().ok()?;
  if hours > 23 || minutes > 59 {
    return None;
  }
  Some(hours * 60 + minutes)
}

/// Resolve a timestamp token to a time of day. [`NOW_TOKEN`] maps to `now`
/// (truncated to the minute) when one is supplied.
pub fn parse_clock(token: &str, now: Option<NaiveTime>) -> Option<NaiveTime> {
  if token == NOW_TOKEN {
    return now.and_then(|t| NaiveTime::from_hms_opt(t.hour(), t.minute(), 0));
  }
  let minutes = hhmm_to_minutes(token)?;
  NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitStyle {
  /// `3d 3h 20m`
  #[default]
  Compact,
  /// `3 days, 3 hours, 20 minutes`
  Long,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ManDays {
  pub days: i64,
  pub hours: i64,
  pub minutes: i64,
}

/// Split a duration into man-days of `day_hours` hours, then hours and
/// minutes. Negative durations count as zero; seconds are dropped.
pub fn man_days(duration: Duration, day_hours: f64) -> ManDays {
  let day_minutes = ((day_hours * 60.0).round() as i64).max(1);
  let total = duration.num_minutes().max(0);
  let days = total / day_minutes;
  let rest = total % day_minutes;
  ManDays {
    days,
    hours: rest / 60,
    minutes: rest % 60,
  }
}

/// Human readable man-days, longest unit first, zero components omitted.
pub fn format_man_days(duration: Duration, day_hours: f64, style: UnitStyle) -> String {
  let md = man_days(duration, day_hours);
  let parts = [(md.days, "d", "day"), (md.hours, "h", "hour"), (md.minutes, "m", "minute")];

  let out: Vec<String> = parts
    .iter()
    .filter(|(amount, _, _)| *amount != 0)
    .map(|(amount, short, long)| match style {
      UnitStyle::Compact => format!("{amount}{short}"),
      UnitStyle::Long => format!("{amount} {long}{}", if *amount == 1 { "" } else { "s" }),
    })
    .collect();

  if out.is_empty() {
    return match style {
      UnitStyle::Compact => "0m".to_string(),
      UnitStyle::Long => "0 minutes".to_string(),
    };
  }

  match style {
    UnitStyle::Compact => out.join(" "),
    UnitStyle::Long => out.join(", "),
  }
}

/// Sum of a sequence of durations.
pub fn total<I: IntoIterator<Item = Duration>>(durations: I) -> Duration {
  durations.into_iter().fold(Duration::zero(), |acc, d| acc + d)
}
