mod command;
mod config;
mod detect;
mod error;
mod exec;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::{error, info};

use crate::config::Config;
use crate::detect::marker::Marker;
use crate::error::Result;
use crate::exec::runner::ProcessExecutor;
use crate::exec::RunOptions;

#[derive(Parser)]
#[command(
  name = "pfl-testrun",
  about = "Detect a project's test tooling and run its test suite"
)]
struct Cli {
  #[command(subcommand)]
  command: Commands,

  /// Path to config file (defaults to <project>/pfl-testrun.yaml if present)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
  /// Print the resolved test command without running it
  Detect {
    /// Project root
    #[arg(default_value = ".")]
    path: PathBuf,
    /// Print the resolution as JSON
    #[arg(long)]
    json: bool,
  },
  /// Resolve and execute the test command
  Run {
    /// Project root
    #[arg(default_value = ".")]
    path: PathBuf,
    /// Collect coverage
    #[arg(long)]
    coverage: bool,
    /// Only run tests matching this name
    #[arg(short, long)]
    filter: Option<String>,
    /// Kill the test process after this many seconds
    #[arg(long)]
    timeout: Option<u64>,
    /// Print the command and exit
    #[arg(long)]
    dry_run: bool,
    /// Write a YAML run report to this file
    #[arg(long)]
    report: Option<PathBuf>,
    /// Don't echo test output
    #[arg(short, long)]
    quiet: bool,
    /// Extra arguments passed to the test command
    #[arg(last = true)]
    extra: Vec<String>,
  },
  /// List marker files in precedence order
  Markers,
}

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    )
    .init();

  let cli = Cli::parse();

  match run(cli).await {
    Ok(code) => std::process::exit(code),
    Err(e) => {
      error!("{e}");
      std::process::exit(1);
    }
  }
}

async fn run(cli: Cli) -> Result<i32> {
  match cli.command {
    Commands::Detect { path, json } => {
      let config = load_config(cli.config.as_deref(), &path)?;
      cmd_detect(&config, &path, json)
    }
    Commands::Run {
      path,
      coverage,
      filter,
      timeout,
      dry_run,
      report,
      quiet,
      extra,
    } => {
      let config = load_config(cli.config.as_deref(), &path)?;
      let settings = &config.settings;
      let opts = RunOptions {
        coverage: coverage || settings.coverage,
        filter,
        extra_args: settings.extra_args.iter().cloned().chain(extra).collect(),
        timeout: timeout
          .map(std::time::Duration::from_secs)
          .or_else(|| settings.timeout()),
      };
      let report = report.or_else(|| settings.report_file.as_ref().map(|p| path.join(p)));
      cmd_run(&config, &path, &opts, dry_run, report.as_deref(), quiet).await
    }
    Commands::Markers => cmd_markers(),
  }
}

fn load_config(explicit: Option<&Path>, project_root: &Path) -> Result<Config> {
  match explicit {
    Some(path) => Config::load(path),
    None => Config::discover(project_root),
  }
}

fn cmd_detect(config: &Config, path: &Path, json: bool) -> Result<i32> {
  let resolution = detect::resolve(path, &config.settings)?;

  if json {
    println!("{}", serde_json::to_string_pretty(&resolution)?);
    return Ok(0);
  }

  println!("Framework: {}", resolution.framework);
  println!("Manager:   {}", resolution.manager);
  println!(
    "Marker:    {}",
    resolution.marker.map(|m| m.filename()).unwrap_or("-")
  );
  if let Some(script) = &resolution.script {
    println!("Script:    {script}");
  }
  if let Some(hint) = &resolution.runner_hint {
    println!("Runner:    {hint}");
  }
  println!("Command:   {}", resolution.command);

  Ok(0)
}

async fn cmd_run(
  config: &Config,
  path: &Path,
  opts: &RunOptions,
  dry_run: bool,
  report_path: Option<&Path>,
  quiet: bool,
) -> Result<i32> {
  let resolution = detect::resolve(path, &config.settings)?;

  if dry_run {
    println!("{}", exec::build_command(&resolution, opts));
    return Ok(0);
  }

  let executor = ProcessExecutor::new(quiet);
  let report = exec::execute(&executor, path, &resolution, opts).await?;

  if let Some(report_path) = report_path {
    report.write(report_path)?;
  }

  if !report.success {
    info!("tests failed with exit code {}", report.exit_code);
  }
  Ok(report.exit_code)
}

fn cmd_markers() -> Result<i32> {
  for (i, marker) in Marker::ALL.iter().enumerate() {
    println!("{:>2}. {marker}", i + 1);
  }
  Ok(0)
}
