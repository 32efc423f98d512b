use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, RunnerError};

/// The parts of `package.json` the selector looks at: script names only.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
  #[serde(default, deserialize_with = "lenient_scripts")]
  pub scripts: BTreeMap<String, String>,
}

fn lenient_scripts<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
  D: serde::Deserializer<'de>,
{
  let value = serde_json::Value::deserialize(deserializer)?;
  let scripts = match value {
    serde_json::Value::Object(map) => map
      .into_iter()
      .filter_map(|(k, v)| v.as_str().map(|s| (k, s.to_string())))
      .collect(),
    _ => BTreeMap::new(),
  };
  Ok(scripts)
}

impl Manifest {
  pub fn load(path: &Path) -> Result<Self> {
    let content = std::fs::read_to_string(path)?;
    Self::parse(&content).map_err(|source| RunnerError::Manifest {
      path: path.to_path_buf(),
      source,
    })
  }

  fn parse(content: &str) -> std::result::Result<Self, serde_json::Error> {
    serde_json::from_str(content)
  }

  /// First of `names` declared as a script, with its body.
  pub fn find_script<'a>(&'a self, names: &'a [String]) -> Option<(&'a str, &'a str)> {
    names.iter().find_map(|name| {
      self
        .scripts
        .get(name)
        .map(|body| (name.as_str(), body.as_str()))
    })
  }
}

const KNOWN_RUNNERS: [&str; 6] = ["vitest", "jest", "mocha", "ava", "playwright", "jasmine"];

/// Names the test binary a script body calls, for display only.
pub fn runner_hint(script_body: &str) -> Option<&'static str> {
  script_body
    .split(|c: char| c.is_whitespace() || c == '&' || c == ';' || c == '|')
    .filter(|tok| !tok.is_empty())
    .find_map(|tok| {
      let bin = tok.rsplit('/').next().unwrap_or(tok);
      KNOWN_RUNNERS.iter().copied().find(|r| *r == bin)
    })
}
