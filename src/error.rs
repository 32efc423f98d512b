use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
  #[error(
    "unknown project type in {}: none of [{}] found",
    root.display(),
    checked.join(", ")
  )]
  UnknownProjectType { root: PathBuf, checked: Vec<String> },

  #[error("not a directory: {0}")]
  NotADirectory(PathBuf),

  #[error("invalid manifest {}: {source}", path.display())]
  Manifest {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("config error: {0}")]
  Config(String),

  #[error("config file not found: {0}")]
  ConfigNotFound(PathBuf),

  #[error("failed to spawn {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  #[error("timeout: {0}")]
  Timeout(String),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("yaml error: {0}")]
  Yaml(#[from] serde_yaml::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RunnerError>;
