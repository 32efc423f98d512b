use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
  UvLock,
  PoetryLock,
  PipfileLock,
  PyprojectToml,
  SetupPy,
  SetupCfg,
  RequirementsTxt,
  PackageJson,
  PnpmLock,
  YarnLock,
  NpmLock,
}

impl Marker {
  /// Every consulted marker, in precedence order.
  pub const ALL: [Marker; 11] = [
    Marker::UvLock,
    Marker::PoetryLock,
    Marker::PipfileLock,
    Marker::PyprojectToml,
    Marker::SetupPy,
    Marker::SetupCfg,
    Marker::RequirementsTxt,
    Marker::PackageJson,
    Marker::PnpmLock,
    Marker::YarnLock,
    Marker::NpmLock,
  ];

  pub const PYTHON_LOCKS: [Marker; 3] = [Marker::UvLock, Marker::PoetryLock, Marker::PipfileLock];

  pub const PYTHON_MANIFESTS: [Marker; 4] = [
    Marker::PyprojectToml,
    Marker::SetupPy,
    Marker::SetupCfg,
    Marker::RequirementsTxt,
  ];

  pub const JS_LOCKS: [Marker; 3] = [Marker::PnpmLock, Marker::YarnLock, Marker::NpmLock];

  pub fn filename(self) -> &'static str {
    match self {
      Marker::UvLock => "uv.lock",
      Marker::PoetryLock => "poetry.lock",
      Marker::PipfileLock => "Pipfile.lock",
      Marker::PyprojectToml => "pyproject.toml",
      Marker::SetupPy => "setup.py",
      Marker::SetupCfg => "setup.cfg",
      Marker::RequirementsTxt => "requirements.txt",
      Marker::PackageJson => "package.json",
      Marker::PnpmLock => "pnpm-lock.yaml",
      Marker::YarnLock => "yarn.lock",
      Marker::NpmLock => "package-lock.json",
    }
  }

  pub fn checked_filenames() -> Vec<String> {
    Self::ALL.iter().map(|m| m.filename().to_string()).collect()
  }
}

impl std::fmt::Display for Marker {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.filename())
  }
}

/// Snapshot of which markers exist in a project root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerSet {
  present: BTreeSet<Marker>,
}

impl MarkerSet {
  pub fn probe(root: &Path) -> Self {
    let present: BTreeSet<Marker> = Marker::ALL
      .into_iter()
      .filter(|m| root.join(m.filename()).is_file())
      .collect();
    debug!(
      "markers in {}: [{}]",
      root.display(),
      present
        .iter()
        .map(|m| m.filename())
        .collect::<Vec<_>>()
        .join(", ")
    );
    Self { present }
  }

  pub fn contains(&self, marker: Marker) -> bool {
    self.present.contains(&marker)
  }

  /// First marker of `candidates` that is present, honoring their order.
  pub fn first_of(&self, candidates: &[Marker]) -> Option<Marker> {
    candidates.iter().copied().find(|m| self.contains(*m))
  }
}
