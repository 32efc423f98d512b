pub mod report;
pub mod runner;

use std::path::Path;
use std::time::Duration;

use tracing::info;

use crate::command::CommandTemplate;
use crate::detect::Resolution;
use crate::error::Result;
use crate::exec::report::RunReport;
use crate::exec::runner::Executor;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
  pub coverage: bool,
  pub filter: Option<String>,
  pub extra_args: Vec<String>,
  pub timeout: Option<Duration>,
}

/// Appends coverage, filter and pass-through tokens to the resolved command.
pub fn build_command(resolution: &Resolution, opts: &RunOptions) -> CommandTemplate {
  let mut command = resolution.command.clone();
  if opts.coverage {
    command = command.with_coverage();
  }
  if let Some(filter) = &opts.filter {
    command = command.with_filter(filter);
  }
  command.with_args(opts.extra_args.iter().cloned())
}

pub async fn execute<E: Executor>(
  executor: &E,
  project_root: &Path,
  resolution: &Resolution,
  opts: &RunOptions,
) -> Result<RunReport> {
  let command = build_command(resolution, opts);
  let output = executor.run(&command, project_root, opts.timeout).await?;
  let report = RunReport::new(project_root, resolution, &command, &output);
  info!("{report}");
  Ok(report)
}
