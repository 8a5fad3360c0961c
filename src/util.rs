// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Utilities for paths, timesheet discovery, git subprocesses, output writing and man page rendering
// role: utilities/helpers
// inputs: Various primitives; paths; clap CommandFactory
// outputs: Canonicalized paths, sorted timesheet lists, written reports, man page text
// side_effects: run_git invokes subprocesses; write_output creates parent directories and writes files
// invariants:
// - timesheets_in_dir returns only names whose stem is a YYYYMMDD date, sorted by name
// - write_output treats "-" as stdout
// errors: run_git surfaces command + stderr; IO errors bubble with context
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use clap::CommandFactory;

use crate::parse::start_date_from_path;

pub fn canonicalize_lossy<P: AsRef<Path>>(p: P) -> String {
  let p = p.as_ref();
  let pb: PathBuf = match std::fs::canonicalize(p) {
    Ok(x) => x,
    Err(_) => match std::env::current_dir() {
      Ok(cwd) => cwd.join(p),
      Err(_) => PathBuf::from(p),
    },
  };
  pb.to_string_lossy().to_string()
}

pub fn run_git(repo: &str, args: &[String]) -> Result<String> {
  let out = Command::new("git")
    .args(args)
    .current_dir(repo)
    .output()
    .with_context(|| format!("spawning git {:?}", args))?;

  if out.status.success() {
    Ok(String::from_utf8_lossy(&out.stdout).to_string())
  } else {
    let stderr = String::from_utf8_lossy(&out.stderr);
    anyhow::bail!("git {:?} failed: {}", args, stderr)
  }
}

/// Returns the effective "now" given an optional override.
///
/// When `override_now` is `Some`, that instant is returned; otherwise
/// the current local time is used.
pub fn effective_now(override_now: Option<NaiveDateTime>) -> NaiveDateTime {
  override_now.unwrap_or_else(|| Local::now().naive_local())
}

/// Timesheets directly inside `dir`: entries whose stem is a `YYYYMMDD` date,
/// sorted by file name.
pub fn timesheets_in_dir(dir: &Path) -> Result<Vec<PathBuf>> {
  let mut found = Vec::new();
  for entry in std::fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
    let path = entry.with_context(|| format!("listing {}", dir.display()))?.path();
    if path.is_file() && start_date_from_path(&path).is_ok() {
      found.push(path);
    }
  }
  found.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
  Ok(found)
}

/// Write `text` to stdout (`-`) or to a file, creating parent directories.
pub fn write_output(out: &str, text: &str) -> Result<()> {
  if out == "-" {
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    lock.write_all(text.as_bytes()).context("writing report to stdout")?;
    return lock.flush().context("flushing stdout");
  }

  let out_path = Path::new(out);
  if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
  }
  std::fs::write(out_path, text).with_context(|| format!("writing {}", out_path.display()))
}

/// Render a section-1 man page for a clap `CommandFactory` implementor.
/// Returns the troff content as a UTF-8 string.
pub fn render_man_page<T: CommandFactory>() -> anyhow::Result<String> {
  let cmd = T::command();
  let man = clap_mangen::Man::new(cmd);
  let mut buf: Vec<u8> = Vec::new();

  man.render(&mut buf)?;

  Ok(String::from_utf8_lossy(&buf).to_string())
}
