use anyhow::Result;
use chrono::NaiveDateTime;

use crate::util::run_git;

/// Timestamp format requested from `git log --date=format-local:`.
pub const GIT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Raw `(local author date, full message)` pairs for commits on any ref
/// between `since` and `until`, oldest first.
pub fn commit_log(repo: &str, since: NaiveDateTime, until: NaiveDateTime) -> Result<Vec<(String, String)>> {
  let args: Vec<String> = vec![
    "-c".into(),
    "log.showSignature=false".into(),
    "log".into(),
    "--all".into(),
    "--no-merges".into(),
    "--date-order".into(),
    "--reverse".into(),
    format!("--since={}", since.format("%Y-%m-%d %H:%M:%S")),
    format!("--until={}", until.format("%Y-%m-%d %H:%M:%S")),
    format!("--date=format-local:{GIT_DATE_FORMAT}"),
    "--format=%ad%x00%B%x1e".into(),
  ];
  let out = run_git(repo, &args)?;
  Ok(split_records(&out))
}

fn split_records(out: &str) -> Vec<(String, String)> {
  out
    .split('\u{1e}')
    .filter_map(|record| {
      let record = record.trim_start_matches('\n');
      let (date, message) = record.split_once('\u{0}')?;
      let date = date.trim();
      if date.is_empty() {
        None
      } else {
        Some((date.to_string(), message.to_string()))
      }
    })
    .collect()
}

pub fn is_work_tree(repo: &str) -> bool {
  run_git(repo, &["rev-parse".into(), "--is-inside-work-tree".into()])
    .map(|out| out.trim() == "true")
    .unwrap_or(false)
}
