use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, RunnerError};

pub const CONFIG_FILE: &str = "pfl-testrun.yaml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_test_scripts")]
    pub test_scripts: Vec<String>,
    #[serde(default)]
    pub python_invocation: PythonInvocation,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub coverage: bool,
    #[serde(default)]
    pub extra_args: Vec<String>,
    #[serde(default)]
    pub report_file: Option<PathBuf>,
}

/// How pytest is launched when no Python package manager is detected.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PythonInvocation {
    /// `python -m pytest`
    #[default]
    Module,
    /// `pytest`, resolved from PATH
    Path,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            test_scripts: default_test_scripts(),
            python_invocation: PythonInvocation::default(),
            timeout_secs: None,
            coverage: false,
            extra_args: Vec::new(),
            report_file: None,
        }
    }
}

fn default_test_scripts() -> Vec<String> {
    vec!["test".to_string()]
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RunnerError::ConfigNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `pfl-testrun.yaml` from the project root, falling back to defaults.
    pub fn discover(project_root: &Path) -> Result<Self> {
        let path = project_root.join(CONFIG_FILE);
        if path.is_file() {
            debug!("using config {}", path.display());
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        let settings = &self.settings;
        if settings.test_scripts.is_empty() {
            return Err(RunnerError::Config("test_scripts must not be empty".into()));
        }
        if let Some(name) = settings.test_scripts.iter().find(|s| s.trim().is_empty()) {
            return Err(RunnerError::Config(format!(
                "blank script name in test_scripts: {name:?}"
            )));
        }
        if settings.timeout_secs == Some(0) {
            return Err(RunnerError::Config(
                "timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl Settings {
    pub fn timeout(&self) -> Option<std::time::Duration> {
        self.timeout_secs.map(std::time::Duration::from_secs)
    }
}
