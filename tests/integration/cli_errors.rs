use predicates::prelude::*;
use test_support::{fixture_arg, report_cmd, tempdir, write_timesheet};

#[test]
fn wrong_first_day_fails_with_line() {
  report_cmd()
    .arg(fixture_arg("bad/20140203.txt"))
    .assert()
    .failure()
    .stderr(predicate::str::contains("20140203.txt: line 1: week does not start where expected"));
}

#[test]
fn unterminated_day_fails() {
  report_cmd()
    .arg(fixture_arg("bad/20140210.txt"))
    .assert()
    .failure()
    .stderr(predicate::str::contains("line 4: no end time given for last task \"www\""));
}

#[test]
fn skip_invalid_keeps_going() {
  let td = tempdir();
  std::fs::copy(
    fixture_arg("weeks/20140203.txt"),
    td.path().join("20140203.txt"),
  )
  .unwrap();
  std::fs::copy(fixture_arg("bad/20140210.txt"), td.path().join("20140210.txt")).unwrap();

  report_cmd()
    .args(["--skip-invalid", &td.path().to_string_lossy()])
    .assert()
    .success()
    .stdout(predicate::str::starts_with("All....."))
    .stderr(predicate::str::contains("warning: skipping").and(predicate::str::contains("20140210.txt")));
}

#[test]
fn short_day_is_a_warning_unless_strict() {
  let example = fixture_arg("weeks/20140203.txt");
  report_cmd()
    .arg(&example)
    .assert()
    .success()
    .stderr(predicate::str::contains("warning:").and(predicate::str::contains("short day on Mon 03 Feb")));

  report_cmd()
    .args(["--strict", &example])
    .assert()
    .failure()
    .stderr(predicate::str::contains("error:").and(predicate::str::contains("failed validation")));

  report_cmd()
    .args(["--min-day-hours", "6", &example])
    .assert()
    .success()
    .stderr(predicate::str::contains("short day").not());
}

#[test]
fn stray_text_only_fails_when_strict() {
  let td = tempdir();
  let sheet = write_timesheet(
    td.path(),
    "20140203.txt",
    "Week one of the new job\nMonday\n0900 onboarding\n1630\n",
  );
  let sheet = sheet.to_string_lossy().to_string();

  report_cmd().args(["--min-day-hours", "1", &sheet]).assert().success();
  report_cmd()
    .args(["--strict", "--min-day-hours", "1", &sheet])
    .assert()
    .failure()
    .stderr(predicate::str::contains("line 1: stray text"));
}

#[test]
fn malformed_file_name_is_rejected() {
  let td = tempdir();
  let sheet = write_timesheet(td.path(), "monday.txt", "Monday\n0900 a\n1000\n");
  report_cmd()
    .arg(sheet)
    .assert()
    .failure()
    .stderr(predicate::str::contains("cannot read a start date from file name"));
}

#[test]
fn missing_default_file_mentions_path() {
  let td = tempdir();
  report_cmd()
    .args(["--dir", &td.path().to_string_lossy()])
    .assert()
    .failure()
    .stderr(predicate::str::contains("20140203.txt"));
}

#[test]
fn conflicting_windows_are_rejected() {
  report_cmd()
    .args(["--month", "2014-02", "--for", "last week", &fixture_arg("weeks")])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Ambiguous time selection"));
}

#[test]
fn day_left_without_timestamps_fails() {
  let td = tempdir();
  let sheet = write_timesheet(td.path(), "20140203.txt", "Monday\n0900 a\n1000\nTuesday\n");
  report_cmd()
    .arg(sheet)
    .assert()
    .failure()
    .stderr(predicate::str::contains("line 4: no end time given for 2014-02-04"));
}

#[test]
fn time_glued_to_task_still_opens_it() {
  let td = tempdir();
  let sheet = write_timesheet(td.path(), "20140203.txt", "Monday\n0900 www\n0930Admin\n1000\n");
  report_cmd()
    .args(["--min-day-hours", "1", "--format", "json"])
    .arg(sheet)
    .assert()
    .success()
    .stdout(predicate::str::contains("\"name\": \"Admin\""));
}
