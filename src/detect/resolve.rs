use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use crate::command::{CommandTemplate, FlagStyle};
use crate::config::{PythonInvocation, Settings};
use crate::detect::manifest::{self, Manifest};
use crate::detect::marker::{Marker, MarkerSet};
use crate::error::{Result, RunnerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Framework {
  Pytest,
  JsTest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageManager {
  Uv,
  Poetry,
  Pipenv,
  Python,
  Pnpm,
  Yarn,
  Npm,
}

impl PackageManager {
  pub fn program(self) -> &'static str {
    match self {
      PackageManager::Uv => "uv",
      PackageManager::Poetry => "poetry",
      PackageManager::Pipenv => "pipenv",
      PackageManager::Python => "python",
      PackageManager::Pnpm => "pnpm",
      PackageManager::Yarn => "yarn",
      PackageManager::Npm => "npm",
    }
  }

  fn from_python_lock(marker: Marker) -> Option<Self> {
    match marker {
      Marker::UvLock => Some(PackageManager::Uv),
      Marker::PoetryLock => Some(PackageManager::Poetry),
      Marker::PipfileLock => Some(PackageManager::Pipenv),
      _ => None,
    }
  }

  fn from_js_lock(marker: Option<Marker>) -> Self {
    match marker {
      Some(Marker::PnpmLock) => PackageManager::Pnpm,
      Some(Marker::YarnLock) => PackageManager::Yarn,
      _ => PackageManager::Npm,
    }
  }
}

impl std::fmt::Display for Framework {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Framework::Pytest => f.write_str("pytest"),
      Framework::JsTest => f.write_str("js-test"),
    }
  }
}

impl std::fmt::Display for PackageManager {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.program())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
  pub framework: Framework,
  pub manager: PackageManager,
  pub command: CommandTemplate,
  pub marker: Option<Marker>,
  pub script: Option<String>,
  pub runner_hint: Option<String>,
}

/// Maps the marker files in `project_root` to one test invocation.
///
/// Python lock files win over everything, then Python manifests, then
/// `package.json` scripts, then JS lock files. Nothing recognised is an
/// error rather than a guess.
pub fn resolve(project_root: &Path, settings: &Settings) -> Result<Resolution> {
  if !project_root.is_dir() {
    return Err(RunnerError::NotADirectory(project_root.to_path_buf()));
  }

  let markers = MarkerSet::probe(project_root);
  let resolution = match resolve_python(&markers, settings) {
    Some(resolution) => Some(resolution),
    None => resolve_js(project_root, &markers, settings)?,
  };

  match resolution {
    Some(resolution) => {
      info!(
        "resolved {} via {}: {}",
        project_root.display(),
        resolution
          .marker
          .map(|m| m.filename())
          .unwrap_or("defaults"),
        resolution.command
      );
      Ok(resolution)
    }
    None => Err(RunnerError::UnknownProjectType {
      root: project_root.to_path_buf(),
      checked: Marker::checked_filenames(),
    }),
  }
}

fn resolve_python(markers: &MarkerSet, settings: &Settings) -> Option<Resolution> {
  if let Some(lock) = markers.first_of(&Marker::PYTHON_LOCKS) {
    let manager = PackageManager::from_python_lock(lock)?;
    return Some(Resolution {
      framework: Framework::Pytest,
      manager,
      command: CommandTemplate::new(manager.program(), ["run", "pytest"], FlagStyle::Pytest),
      marker: Some(lock),
      script: None,
      runner_hint: Some("pytest".into()),
    });
  }

  let manifest = markers.first_of(&Marker::PYTHON_MANIFESTS)?;
  debug!("no python lock file, falling back to bare pytest");
  let command = match settings.python_invocation {
    PythonInvocation::Module => CommandTemplate::new("python", ["-m", "pytest"], FlagStyle::Pytest),
    PythonInvocation::Path => CommandTemplate::new("pytest", Vec::<String>::new(), FlagStyle::Pytest),
  };
  Some(Resolution {
    framework: Framework::Pytest,
    manager: PackageManager::Python,
    command,
    marker: Some(manifest),
    script: None,
    runner_hint: Some("pytest".into()),
  })
}

fn resolve_js(
  project_root: &Path,
  markers: &MarkerSet,
  settings: &Settings,
) -> Result<Option<Resolution>> {
  let lock = markers.first_of(&Marker::JS_LOCKS);
  let has_manifest = markers.contains(Marker::PackageJson);
  if lock.is_none() && !has_manifest {
    return Ok(None);
  }

  let manager = PackageManager::from_js_lock(lock);
  let package = if has_manifest {
    Manifest::load(&project_root.join(Marker::PackageJson.filename()))?
  } else {
    Manifest::default()
  };

  let (args, script, hint) = match package.find_script(&settings.test_scripts) {
    Some((name, body)) => (
      vec!["run".to_string(), name.to_string()],
      Some(name.to_string()),
      // display only; the invocation never depends on the body
      manifest::runner_hint(body).map(str::to_string),
    ),
    None => {
      debug!("no test script declared, using generic `{manager} test`");
      (vec!["test".to_string()], None, None)
    }
  };

  let mut command = CommandTemplate::new(manager.program(), args, FlagStyle::Js);
  if manager == PackageManager::Npm {
    command = command.with_forwarding_separator();
  }

  Ok(Some(Resolution {
    framework: Framework::JsTest,
    manager,
    command,
    marker: lock.or(Some(Marker::PackageJson)),
    script,
    runner_hint: hint,
  }))
}
