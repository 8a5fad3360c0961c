use clap::Parser;
use serial_test::serial;
use test_support::{fixtures_dir, report_cmd, with_env};
use timesheet_report::cli::{Cli, normalize};

#[test]
#[serial]
fn timesheet_dir_comes_from_env() {
  let _env = with_env(&[("TIMESHEET_DIR", "/srv/timesheets")]);
  let cli = Cli::try_parse_from(["timesheet-report"]).unwrap();
  assert_eq!(cli.dir, std::path::PathBuf::from("/srv/timesheets"));

  let cli = Cli::try_parse_from(["timesheet-report", "--dir", "weeks"]).unwrap();
  assert_eq!(normalize(cli).unwrap().dir, "weeks");
}

#[test]
#[serial]
fn default_dir_without_env_is_cwd() {
  let _env = with_env(&[("TIMESHEET_DIR", "")]);
  std::env::remove_var("TIMESHEET_DIR");
  let cli = Cli::try_parse_from(["timesheet-report"]).unwrap();
  assert_eq!(cli.dir, std::path::PathBuf::from("."));
}

#[test]
fn binary_finds_this_weeks_file_through_env() {
  let dir = fixtures_dir().join("weeks");
  report_cmd()
    .env("TIMESHEET_DIR", &dir)
    .assert()
    .success()
    .stdout(predicates::str::starts_with("All....."));
}

#[test]
fn extension_is_configurable() {
  let td = test_support::tempdir();
  std::fs::copy(fixtures_dir().join("weeks/20140203.txt"), td.path().join("20140203.ts")).unwrap();
  report_cmd()
    .args(["--dir", &td.path().to_string_lossy(), "--ext", "ts"])
    .assert()
    .success();
}
