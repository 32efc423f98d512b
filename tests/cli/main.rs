use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn bin() -> Command {
  Command::new(env!("CARGO_BIN_EXE_pfl-testrun"))
}

fn project(files: &[(&str, &str)]) -> TempDir {
  let dir = TempDir::new().unwrap();
  for (name, content) in files {
    std::fs::write(dir.path().join(name), content).unwrap();
  }
  dir
}

fn run_in(dir: &Path, args: &[&str]) -> Output {
  bin()
    .args(args)
    .arg(dir)
    .env("RUST_LOG", "warn")
    .output()
    .unwrap()
}

fn stdout(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).to_string()
}

// --- detect ---

#[test]
fn detect_uv_project() {
  let dir = project(&[("uv.lock", ""), ("poetry.lock", "")]);
  let output = run_in(dir.path(), &["detect"]);
  assert!(output.status.success());
  let out = stdout(&output);
  assert!(out.contains("Framework: pytest"));
  assert!(out.contains("Command:   uv run pytest"));
}

#[test]
fn detect_json_for_pnpm_script() {
  let dir = project(&[
    ("pnpm-lock.yaml", ""),
    ("package.json", r#"{"scripts": {"test": "vitest run"}}"#),
  ]);
  let output = run_in(dir.path(), &["detect", "--json"]);
  assert!(output.status.success());

  let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(value["framework"], "js_test");
  assert_eq!(value["manager"], "pnpm");
  assert_eq!(value["script"], "test");
  assert_eq!(value["command"]["program"], "pnpm");
  assert_eq!(value["command"]["args"], serde_json::json!(["run", "test"]));
}

#[test]
fn detect_empty_dir_fails_with_checked_markers() {
  let dir = project(&[]);
  let output = run_in(dir.path(), &["detect"]);
  assert_eq!(output.status.code(), Some(1));
  assert!(output.stdout.is_empty());
  let err = String::from_utf8_lossy(&output.stderr);
  assert!(err.contains("unknown project type"));
  assert!(err.contains("uv.lock"));
  assert!(err.contains("package-lock.json"));
}

#[test]
fn detect_is_stable_across_calls() {
  let dir = project(&[("yarn.lock", ""), ("package.json", "{}")]);
  let first = stdout(&run_in(dir.path(), &["detect", "--json"]));
  let second = stdout(&run_in(dir.path(), &["detect", "--json"]));
  assert_eq!(first, second);
}

#[test]
fn detect_uses_project_config() {
  let dir = project(&[
    ("setup.py", ""),
    ("pfl-testrun.yaml", "settings:\n  python_invocation: path\n"),
  ]);
  let out = stdout(&run_in(dir.path(), &["detect"]));
  assert!(out.contains("Command:   pytest"));
}

#[test]
fn detect_missing_explicit_config_fails() {
  let dir = project(&[("uv.lock", "")]);
  let missing = dir.path().join("missing.yaml");
  let output = bin()
    .args(["--config", missing.to_str().unwrap(), "detect"])
    .arg(dir.path())
    .output()
    .unwrap();
  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("config file not found"));
}

// --- run ---

#[test]
fn run_dry_run_appends_flags() {
  let dir = project(&[("package.json", r#"{"scripts": {"test": "jest"}}"#)]);
  let output = run_in(
    dir.path(),
    &["run", "--dry-run", "--coverage", "--filter", "login"],
  );
  assert!(output.status.success());
  assert_eq!(
    stdout(&output).trim(),
    "npm run test -- --coverage -t login"
  );
}

#[test]
fn run_dry_run_python_filter() {
  let dir = project(&[("poetry.lock", "")]);
  let output = run_in(dir.path(), &["run", "--dry-run", "-f", "test_parse"]);
  assert_eq!(stdout(&output).trim(), "poetry run pytest -k test_parse");
}

#[test]
fn run_unknown_project_does_not_spawn() {
  let dir = project(&[("go.mod", "")]);
  let output = run_in(dir.path(), &["run"]);
  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("unknown project type"));
}

// --- markers ---

#[test]
fn markers_lists_precedence_order() {
  let output = bin().arg("markers").output().unwrap();
  assert!(output.status.success());
  let out = stdout(&output);
  let lines: Vec<&str> = out.lines().collect();
  assert_eq!(lines.len(), 11);
  assert_eq!(lines[0].trim(), "1. uv.lock");
  assert_eq!(lines[1].trim(), "2. poetry.lock");
  assert_eq!(lines[2].trim(), "3. Pipfile.lock");
}

// --- run (executes) ---

/// A uv project whose `uv` is a stub on PATH that records its arguments.
#[cfg(unix)]
fn stub_uv_project(exit_code: i32) -> (TempDir, TempDir) {
  use std::os::unix::fs::PermissionsExt;

  let bin_dir = TempDir::new().unwrap();
  let stub = bin_dir.path().join("uv");
  std::fs::write(
    &stub,
    format!("#!/bin/sh\nprintf '%s\\n' \"$@\" > args.txt\necho ran\nexit {exit_code}\n"),
  )
  .unwrap();
  std::fs::set_permissions(&stub, std::fs::Permissions::from_mode(0o755)).unwrap();

  let dir = project(&[
    ("uv.lock", ""),
    ("pfl-testrun.yaml", "settings:\n  extra_args: [\"-x\"]\n"),
  ]);
  (dir, bin_dir)
}

#[cfg(unix)]
fn run_with_stub(dir: &Path, bin_dir: &Path, args: &[&str], extra: &[&str]) -> Output {
  let path = format!(
    "{}:{}",
    bin_dir.display(),
    std::env::var("PATH").unwrap_or_default()
  );
  bin()
    .args(args)
    .arg(dir)
    .arg("--")
    .args(extra)
    .env("PATH", path)
    .env("RUST_LOG", "warn")
    .output()
    .unwrap()
}

#[cfg(unix)]
#[test]
fn run_exits_with_child_code_and_merges_args() {
  let (dir, bin_dir) = stub_uv_project(3);
  let output = run_with_stub(dir.path(), bin_dir.path(), &["run"], &["--maxfail", "1"]);

  assert_eq!(output.status.code(), Some(3));
  assert!(stdout(&output).contains("ran"));
  let args = std::fs::read_to_string(dir.path().join("args.txt")).unwrap();
  assert_eq!(
    args.lines().collect::<Vec<_>>(),
    vec!["run", "pytest", "-x", "--maxfail", "1"]
  );
}

#[cfg(unix)]
#[test]
fn run_writes_report() {
  let (dir, bin_dir) = stub_uv_project(3);
  let report = dir.path().join("out").join("report.yaml");
  let output = run_with_stub(
    dir.path(),
    bin_dir.path(),
    &["run", "--quiet", "--report", report.to_str().unwrap()],
    &["--maxfail", "1"],
  );
  assert_eq!(output.status.code(), Some(3));

  let value: serde_yaml::Value =
    serde_yaml::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
  assert_eq!(value["exit_code"].as_i64(), Some(3));
  assert_eq!(value["success"].as_bool(), Some(false));
  assert_eq!(value["framework"].as_str(), Some("pytest"));
  assert_eq!(value["manager"].as_str(), Some("uv"));
  let command: Vec<String> = serde_yaml::from_value(value["command"].clone()).unwrap();
  assert_eq!(command, vec!["uv", "run", "pytest", "-x", "--maxfail", "1"]);
  let tail: Vec<String> = serde_yaml::from_value(value["stdout_tail"].clone()).unwrap();
  assert_eq!(tail, vec!["ran"]);
}
