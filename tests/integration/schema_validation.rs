use jsonschema::validator_for;
use test_support::{fixture_arg, report_cmd};

fn read_schema(name: &str) -> serde_json::Value {
  let manifest_dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
  let path = manifest_dir.join("tests").join("schemas").join(name);
  let data = std::fs::read(&path).expect("schema file");
  serde_json::from_slice(&data).expect("valid schema JSON")
}

fn compile_schema(name: &str) -> jsonschema::Validator {
  let schema = read_schema(name);
  validator_for(&schema).expect("compile schema")
}

fn json_report(args: &[&str]) -> serde_json::Value {
  let out = report_cmd().args(["--format", "json"]).args(args).output().unwrap();
  assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
  serde_json::from_slice(&out.stdout).unwrap()
}

#[test]
fn nested_report_conforms_to_schema() {
  let v = json_report(&["-g", "month", "-g", "week", "-g", "day", "-d", "3", &fixture_arg("weeks")]);
  compile_schema("report.schema.json")
    .validate(&v)
    .expect("schema validation failed for nested report");

  let month = &v["periods"][0];
  assert_eq!(month["label"], "Feb 2014");
  assert_eq!(month["resolution"], "month");
  assert_eq!(month["total"], "3d");
  assert_eq!(month["periods"].as_array().unwrap().len(), 2);
  assert_eq!(month["periods"][1]["periods"][1]["label"], "Tue 11 Feb 2014");
  assert_eq!(v["findings"][0]["kind"], "short_day");
}

#[test]
fn annotated_and_skipped_report_conforms_to_schema() {
  let td = test_support::tempdir();
  std::fs::copy(fixture_arg("weeks/20140203.txt"), td.path().join("20140203.txt")).unwrap();
  std::fs::copy(fixture_arg("bad/20140210.txt"), td.path().join("20140210.txt")).unwrap();
  let v = json_report(&[
    "--skip-invalid",
    "-c",
    "--commit-log",
    &fixture_arg("commits.json"),
    &td.path().to_string_lossy(),
  ]);
  compile_schema("report.schema.json")
    .validate(&v)
    .expect("schema validation failed for annotated report");
  assert_eq!(v["skipped"].as_array().unwrap().len(), 1);
  assert_eq!(v["skipped"][0]["line"], 4);
  assert_eq!(v["periods"][0]["resolution"], serde_json::Value::Null);
}

#[test]
fn empty_window_still_conforms() {
  let v = json_report(&["--month", "2015-01", &fixture_arg("weeks")]);
  compile_schema("report.schema.json").validate(&v).expect("schema validation failed for empty report");
  assert!(v["periods"].as_array().unwrap().is_empty());
}
