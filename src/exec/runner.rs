use std::future::Future;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::command::CommandTemplate;
use crate::error::{Result, RunnerError};

#[derive(Debug, Clone)]
pub struct RunOutput {
  /// `-1` when the process was terminated by a signal.
  pub exit_code: i32,
  pub stdout: Vec<String>,
  pub stderr: Vec<String>,
  pub started_at: DateTime<Utc>,
  pub finished_at: DateTime<Utc>,
}

impl RunOutput {
  pub fn success(&self) -> bool {
    self.exit_code == 0
  }
}

pub trait Executor {
  fn run(
    &self,
    command: &CommandTemplate,
    cwd: &Path,
    timeout: Option<Duration>,
  ) -> impl Future<Output = Result<RunOutput>> + Send;
}

#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor {
  quiet: bool,
}

impl ProcessExecutor {
  pub fn new(quiet: bool) -> Self {
    Self { quiet }
  }
}

impl Executor for ProcessExecutor {
  async fn run(
    &self,
    command: &CommandTemplate,
    cwd: &Path,
    timeout: Option<Duration>,
  ) -> Result<RunOutput> {
    info!("running `{command}` in {}", cwd.display());

    let started_at = Utc::now();
    let mut child = Command::new(&command.program)
      .args(&command.args)
      .current_dir(cwd)
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true)
      .spawn()
      .map_err(|source| RunnerError::Spawn {
        program: command.program.clone(),
        source,
      })?;

    let mut stdout_task = child
      .stdout
      .take()
      .map(|pipe| collect_lines(pipe, Stream::Stdout, self.quiet));
    let mut stderr_task = child
      .stderr
      .take()
      .map(|pipe| collect_lines(pipe, Stream::Stderr, self.quiet));

    // The deadline covers draining the pipes too: a leftover background
    // process can hold them open after the child itself exits.
    let finished = async {
      let status = child.wait().await?;
      let stdout = join_lines(stdout_task.as_mut()).await;
      let stderr = join_lines(stderr_task.as_mut()).await;
      Ok::<_, std::io::Error>((status, stdout, stderr))
    };
    let outcome = match timeout {
      Some(dur) => tokio::time::timeout(dur, finished).await.map_err(|_| dur),
      None => Ok(finished.await),
    };

    let (status, stdout, stderr) = match outcome {
      Ok(result) => result?,
      Err(dur) => {
        warn!("`{command}` timed out after {}s, killing", dur.as_secs());
        if let Err(e) = child.kill().await {
          warn!("failed to kill `{}`: {e}", command.program);
        }
        for task in stdout_task.iter().chain(stderr_task.iter()) {
          task.abort();
        }
        return Err(RunnerError::Timeout(format!(
          "`{command}` timed out after {}s",
          dur.as_secs()
        )));
      }
    };

    let exit_code = status.code().unwrap_or(-1);
    debug!(
      "`{}` exited with {exit_code} ({} stdout lines, {} stderr lines)",
      command.program,
      stdout.len(),
      stderr.len()
    );

    Ok(RunOutput {
      exit_code,
      stdout,
      stderr,
      started_at,
      finished_at: Utc::now(),
    })
  }
}

#[derive(Clone, Copy)]
enum Stream {
  Stdout,
  Stderr,
}

fn collect_lines<R>(pipe: R, stream: Stream, quiet: bool) -> JoinHandle<Vec<String>>
where
  R: AsyncRead + Unpin + Send + 'static,
{
  tokio::spawn(async move {
    let mut captured = Vec::new();
    let mut reader = BufReader::new(pipe);
    let mut buf = Vec::new();
    // Keep draining on undecodable bytes; closing the pipe early would
    // SIGPIPE the child.
    loop {
      buf.clear();
      match reader.read_until(b'\n', &mut buf).await {
        Ok(0) | Err(_) => break,
        Ok(_) => {}
      }
      let line = decode_line(&buf);
      if !quiet {
        match stream {
          Stream::Stdout => println!("{line}"),
          Stream::Stderr => eprintln!("{line}"),
        }
      }
      captured.push(line);
    }
    captured
  })
}

fn decode_line(buf: &[u8]) -> String {
  let line = buf.strip_suffix(b"\n").unwrap_or(buf);
  let line = line.strip_suffix(b"\r").unwrap_or(line);
  String::from_utf8_lossy(line).into_owned()
}

async fn join_lines(task: Option<&mut JoinHandle<Vec<String>>>) -> Vec<String> {
  match task {
    Some(handle) => handle.await.unwrap_or_default(),
    None => Vec::new(),
  }
}
