use test_support::{fixture_arg, report_cmd, report_cmd_at};

fn total_minutes(args: &[&str]) -> i64 {
  let out = report_cmd()
    .args(["--format", "json"])
    .args(args)
    .arg(fixture_arg("weeks"))
    .output()
    .unwrap();
  assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
  let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
  v["periods"]
    .as_array()
    .unwrap()
    .iter()
    .map(|p| p["total_minutes"].as_i64().unwrap())
    .sum()
}

#[test]
fn since_until_select_slots_by_start() {
  assert_eq!(total_minutes(&[]), 1350);
  assert_eq!(total_minutes(&["--since", "2014-02-10"]), 930);
  assert_eq!(total_minutes(&["--until", "2014-02-10"]), 420);
  assert_eq!(total_minutes(&["--since", "2014-02-11T12:15:00", "--until", "2014-02-12"]), 300);
}

#[test]
fn month_window() {
  assert_eq!(total_minutes(&["--month", "2014-02"]), 1350);
  assert_eq!(total_minutes(&["--month", "2014-03"]), 0);
}

#[test]
fn for_phrases_follow_now_override() {
  // now is Wed 05 Feb 2014
  assert_eq!(total_minutes(&["--for", "this week"]), 420);
  assert_eq!(total_minutes(&["--for", "last monday"]), 420);
  assert_eq!(total_minutes(&["--for", "yesterday"]), 0);
}

#[test]
fn standup_looks_back_one_working_day() {
  let out = report_cmd_at("2014-02-11T09:00:00")
    .args(["--standup", "--format", "json"])
    .arg(fixture_arg("weeks"))
    .output()
    .unwrap();
  assert!(out.status.success());
  let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
  // Mon 10 Feb and Tue 11 Feb
  assert_eq!(v["periods"][0]["total_minutes"], 930);
}

#[test]
fn unknown_phrase_is_an_error() {
  let out = report_cmd()
    .args(["--for", "whenever the moon is full"])
    .arg(fixture_arg("weeks"))
    .output()
    .unwrap();
  assert!(!out.status.success());
  assert!(String::from_utf8_lossy(&out.stderr).contains("could not understand --for"));
}
