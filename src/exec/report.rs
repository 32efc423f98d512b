use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::command::CommandTemplate;
use crate::detect::Resolution;
use crate::error::Result;
use crate::exec::runner::RunOutput;

const TAIL_LINES: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
  pub project_root: PathBuf,
  pub framework: String,
  pub manager: String,
  pub command: Vec<String>,
  pub exit_code: i32,
  pub success: bool,
  pub started_at: DateTime<Utc>,
  pub finished_at: DateTime<Utc>,
  pub duration_secs: f64,
  #[serde(default)]
  pub stdout_tail: Vec<String>,
  #[serde(default)]
  pub stderr_tail: Vec<String>,
}

impl RunReport {
  pub fn new(
    project_root: &Path,
    resolution: &Resolution,
    command: &CommandTemplate,
    output: &RunOutput,
  ) -> Self {
    let duration = output.finished_at - output.started_at;
    Self {
      project_root: project_root.to_path_buf(),
      framework: resolution.framework.to_string(),
      manager: resolution.manager.to_string(),
      command: command.tokens(),
      exit_code: output.exit_code,
      success: output.success(),
      started_at: output.started_at,
      finished_at: output.finished_at,
      duration_secs: duration.num_milliseconds() as f64 / 1000.0,
      stdout_tail: tail(&output.stdout),
      stderr_tail: tail(&output.stderr),
    }
  }

  pub fn write(&self, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    let content = serde_yaml::to_string(self)?;
    std::fs::write(path, content)?;
    info!("wrote run report: {}", path.display());
    Ok(())
  }
}

impl std::fmt::Display for RunReport {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let verdict = if self.success { "passed" } else { "failed" };
    write!(
      f,
      "{} ({}) {verdict}: exit={}, {:.1}s",
      self.framework, self.manager, self.exit_code, self.duration_secs
    )
  }
}

fn tail(lines: &[String]) -> Vec<String> {
  lines[lines.len().saturating_sub(TAIL_LINES)..].to_vec()
}
