//! test-support: helpers for robust, nextest-friendly tests.
//!
//! Add as a dev-dependency in your top-level `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test_support = { path = "tests/support" }
//! ```
//!
//! Then in tests:
//! ```rust
//! use test_support::{init_tracing, fixtures_dir};
//!
//! #[test]
//! fn example() {
//!     init_tracing();
//!     let _root = fixtures_dir();
//! }
//! ```

use once_cell::sync::Lazy;
use tracing_subscriber::{fmt, EnvFilter};

use std::process::Command;
use std::{env, path::{Path, PathBuf}};

/// Name of the binary under test.
pub const BIN: &str = "timesheet-report";

/// Fixed "now" used by CLI tests: Wed 05 Feb 2014, midday.
pub const NOW: &str = "2014-02-05T12:00:00";

/// Initialize `tracing` once, honoring `RUST_LOG` and writing via the test writer.
///
/// Safe to call from multiple tests; only the first call configures the global subscriber.
pub fn init_tracing() {
    static INIT: Lazy<()> = Lazy::new(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new("warn,test=info"))
            .unwrap();
        // with_test_writer() causes logs to appear alongside failing tests only (cargo/nextest)
        let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
    });
    Lazy::force(&INIT);
}

/// Return the path to the repository's `tests/fixtures` directory.
///
/// Uses the package directory (where `Cargo.toml` lives), so it's stable regardless
/// of the runner's working directory (cargo vs nextest).
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(|tests| tests.join("fixtures"))
        .expect("tests/support lives under tests/")
}

/// Absolute path of a fixture, as a string ready for a command line.
pub fn fixture_arg<P: AsRef<Path>>(rel_path: P) -> String {
    fixtures_dir().join(rel_path).to_string_lossy().to_string()
}

/// Read a UTF-8 text fixture into a string.
pub fn read_fixture_text<P: AsRef<Path>>(rel_path: P) -> String {
    let path = fixtures_dir().join(rel_path);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
}

/// Create a temp directory that deletes on drop.
pub fn tempdir() -> tempfile::TempDir {
    tempfile::tempdir().expect("create tempdir")
}

/// Write a timesheet named `name` into `dir`, returning its path.
pub fn write_timesheet(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, text)
        .unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
    path
}

/// Create (and return) a temp working directory for CLI tests.
/// Also sets CWD to that directory for the duration of `_guard`'s lifetime.
pub fn temp_cwd() -> (tempfile::TempDir, CwdGuard) {
    let td = tempdir();
    let guard = CwdGuard::push(td.path());
    (td, guard)
}

/// Set multiple environment variables for the duration of the returned guard.
pub fn with_env(vars: &[(&str, &str)]) -> EnvGuard {
    EnvGuard::set_many(vars)
}

/// Run a binary target with `assert_cmd`, returning the ready-to-run `Command`.
///
/// Example:
/// ```
/// use test_support::cmd_bin;
///
/// let mut cmd = cmd_bin("my-cli");
/// cmd.arg("--help").assert().success();
/// ```
pub fn cmd_bin(bin: &str) -> assert_cmd::Command {
    init_tracing();
    assert_cmd::Command::cargo_bin(bin).expect("binary target not found")
}

/// The report binary with a pinned clock, local timezone and no inherited
/// timesheet directory.
pub fn report_cmd() -> assert_cmd::Command {
    report_cmd_at(NOW)
}

/// Like [`report_cmd`], with "now" pinned to `now` (`YYYY-MM-DDTHH:MM:SS`).
pub fn report_cmd_at(now: &str) -> assert_cmd::Command {
    let mut cmd = cmd_bin(BIN);
    cmd.env("TZ", "UTC")
        .env_remove("TIMESHEET_DIR")
        .env_remove("RUST_LOG")
        .args(["--now-override", now]);
    cmd
}

/// Guard that restores the previous current working directory when dropped.
pub struct CwdGuard {
    prev: PathBuf,
}

impl CwdGuard {
    pub fn push<P: AsRef<Path>>(new_dir: P) -> Self {
        let prev = env::current_dir().expect("cwd");
        env::set_current_dir(&new_dir).unwrap_or_else(|e| {
            panic!("failed to set cwd to {}: {e}", new_dir.as_ref().display())
        });
        Self { prev }
    }
}

impl Drop for CwdGuard {
    fn drop(&mut self) {
        let _ = env::set_current_dir(&self.prev);
    }
}

/// Guard for temporarily setting environment variables.
pub struct EnvGuard {
    prev: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    pub fn set_many(kv: &[(&str, &str)]) -> Self {
        let mut prev = Vec::with_capacity(kv.len());
        for (k, v) in kv {
            let k_owned = k.to_string();
            prev.push((k_owned.clone(), env::var(k).ok()));
            env::set_var(k, v);
        }
        Self { prev }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (k, old) in self.prev.drain(..) {
            match old {
                Some(v) => env::set_var(&k, v),
                None => env::remove_var(&k),
            }
        }
    }
}

pub fn run(repo: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(repo)
        .env("TZ", "UTC")
        .status()
        .unwrap();
    assert!(status.success(), "git {:?} failed", args);
}

fn commit_at(repo: &Path, file: &str, when: &str, message: &str) {
    std::fs::write(repo.join(file), format!("{message}\n")).unwrap();
    run(repo, &["add", "."]);

    let env = [
        ("GIT_AUTHOR_DATE", when),
        ("GIT_COMMITTER_DATE", when),
        ("TZ", "UTC"),
    ];

    let status = Command::new("git")
        .arg("commit")
        .arg("-q")
        .arg("-m")
        .arg(message)
        .current_dir(repo)
        .envs(env.iter().cloned())
        .status()
        .unwrap();

    assert!(status.success());
}

/// A throwaway git repository with commits made during the example week.
///
/// main: 2014-02-03 10:15 and 14:45; branch `feature/blog`: 2014-02-03 16:00
/// (reachable only from the branch, so it shows up through `--all`).
pub fn init_fixture_repo() -> tempfile::TempDir {
    let dir = tempfile::TempDir::new().unwrap();

    run(dir.path(), &["init", "-q", "-b", "main"]);
    run(dir.path(), &["config", "user.name", "Fixture Bot"]);
    run(dir.path(), &["config", "user.email", "fixture@example.com"]);
    run(dir.path(), &["config", "commit.gpgsign", "false"]);

    commit_at(dir.path(), "index.html", "2014-02-03T10:15:00", "Tweak home page header");
    commit_at(dir.path(), "about.html", "2014-02-03T14:45:00", "Add about page\n\nWith a body line.");

    run(dir.path(), &["checkout", "-q", "-b", "feature/blog"]);
    commit_at(dir.path(), "blog.html", "2014-02-03T16:00:00", "Start blog layout");
    run(dir.path(), &["switch", "-q", "main"]);

    dir
}
