use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use timesheet_report::aggregate::{AggregateOptions, aggregate};
use timesheet_report::model::NonWorking;
use timesheet_report::parse::{ParseOptions, parse_lines};

const TASKS: [&str; 6] = ["www", "www: blog", "admin", "lunch", "clientx: support: calls", ""];

fn monday() -> NaiveDate {
  NaiveDate::from_ymd_opt(2014, 2, 3).unwrap()
}

/// Render one Monday starting 08:00 from (minutes, task) steps.
fn day_text(steps: &[(u32, usize)]) -> String {
  let mut text = String::from("Monday\n");
  let mut clock = 8 * 60;
  for (minutes, task) in steps {
    text.push_str(&format!("{:02}{:02} {}\n", clock / 60, clock % 60, TASKS[*task]));
    clock += minutes;
  }
  text.push_str(&format!("{:02}{:02}\n", clock / 60, clock % 60));
  text
}

proptest! {
  #[test]
  fn slots_are_ordered_and_cover_named_time(steps in prop::collection::vec((1u32..=60, 0usize..TASKS.len()), 1..12)) {
    let text = day_text(&steps);
    let slots = parse_lines(monday(), text.lines(), &ParseOptions::default()).unwrap();

    prop_assert!(slots.iter().all(|s| s.end > s.start));
    for pair in slots.windows(2) {
      prop_assert!(pair[1].start >= pair[0].end);
    }

    let named: u32 = steps.iter().filter(|(_, t)| !TASKS[*t].is_empty()).map(|(m, _)| *m).sum();
    let parsed: i64 = slots.iter().map(|s| s.duration().num_minutes()).sum();
    prop_assert_eq!(parsed, i64::from(named));
  }

  #[test]
  fn depth_does_not_change_totals(steps in prop::collection::vec((1u32..=60, 0usize..TASKS.len()), 1..12)) {
    let text = day_text(&steps);
    let slots = parse_lines(monday(), text.lines(), &ParseOptions::default()).unwrap();

    let shallow = aggregate(&slots, &AggregateOptions { max_depth: 1, ..Default::default() });
    let deep = aggregate(&slots, &AggregateOptions { max_depth: 3, ..Default::default() });
    prop_assert_eq!(shallow.duration, deep.duration);

    let afk = NonWorking::default();
    let working: i64 = slots.iter().filter(|s| !afk.excludes(&s.task)).map(|s| s.duration().num_minutes()).sum();
    prop_assert_eq!(deep.duration, Duration::minutes(working));
    prop_assert!(deep.child("lunch").is_none());
  }
}
