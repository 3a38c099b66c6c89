//! Process-based command runner.
//!
//! Spawns real OS processes through `tokio::process`, capturing stdout and
//! stderr as independent byte streams. Every wait is raced against the run's
//! cancellation token and the command's timeout; a process that loses the
//! race is killed before its result is returned.
//!
//! On unix each command runs in its own process group. Killing a command
//! signals the whole group, so helpers it started (build servers, package
//! manager workers) go down with it.

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cancel::Cancellation;
use crate::config::CommandSpec;
use crate::error::{RunnerError, RunnerResult};
use crate::runner::{CommandRunner, ExecutionResult, Termination};

/// How long output may stay open after the process itself has exited.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// How long to wait for output to close once leftover processes are killed.
const KILL_GRACE: Duration = Duration::from_millis(500);

const READ_CHUNK: usize = 8 * 1024;

/// Runner that executes commands as child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

enum Wait {
    Exited(std::io::Result<ExitStatus>),
    Cancelled,
    TimedOut,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    fn build_command(&self, spec: &CommandSpec) -> Command {
        let mut std_cmd = std::process::Command::new(&spec.program);
        std_cmd
            .args(&spec.args)
            .envs(&spec.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(workdir) = &spec.workdir {
            std_cmd.current_dir(workdir);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            std_cmd.process_group(0);
        }

        let mut cmd = Command::from(std_cmd);
        cmd.kill_on_drop(true);
        cmd
    }
}

async fn deadline(seconds: u64) {
    if seconds == 0 {
        std::future::pending::<()>().await;
    } else {
        tokio::time::sleep(Duration::from_secs(seconds)).await;
    }
}

/// Output of one stream, read in the background.
///
/// Bytes land in `buffer` as they are read, so whatever arrived before the
/// stream is abandoned is still returned.
struct Drain {
    buffer: Arc<Mutex<Vec<u8>>>,
    handle: JoinHandle<()>,
}

impl Drain {
    fn spawn<R>(stream: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buffer);
        let handle = tokio::spawn(async move {
            let Some(mut stream) = stream else {
                return;
            };
            let mut chunk = vec![0u8; READ_CHUNK];
            loop {
                match stream.read(&mut chunk).await {
                    Ok(0) => break,
                    Ok(n) => sink.lock().extend_from_slice(&chunk[..n]),
                    Err(e) => {
                        debug!("Output stream closed with error: {}", e);
                        break;
                    }
                }
            }
        });
        Self { buffer, handle }
    }

    /// Wait up to `grace` for end of stream. Returns whether it closed.
    async fn closed_within(&mut self, grace: Duration) -> bool {
        tokio::time::timeout(grace, &mut self.handle).await.is_ok()
    }

    fn into_bytes(self) -> Vec<u8> {
        self.handle.abort();
        std::mem::take(&mut *self.buffer.lock())
    }
}

/// Kill every process in the command's group.
#[cfg(unix)]
fn kill_group(pgid: Option<u32>, program: &str) {
    let Some(pgid) = pgid.and_then(|id| libc::pid_t::try_from(id).ok()) else {
        return;
    };
    // SAFETY: killpg only sends a signal; the group was created for this command.
    let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if rc != 0 {
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            warn!("Failed to kill process group of {}: {}", program, err);
        }
    }
}

#[cfg(not(unix))]
fn kill_group(_pgid: Option<u32>, _program: &str) {}

async fn kill(child: &mut Child, pgid: Option<u32>, program: &str) {
    kill_group(pgid, program);
    if let Err(e) = child.kill().await {
        warn!("Failed to kill {}: {}", program, e);
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        spec: &CommandSpec,
        cancel: &Cancellation,
    ) -> RunnerResult<ExecutionResult> {
        let timeout_seconds = spec.timeout_seconds;
        debug!("Executing: {}", spec.display());

        let started_at = Utc::now();
        let mut child = self
            .build_command(spec)
            .spawn()
            .map_err(|e| RunnerError::SpawnFailed {
                program: spec.program.clone(),
                message: e.to_string(),
            })?;
        // The child leads its own group; the id is gone once it is reaped.
        let pgid = child.id();

        let mut stdout = Drain::spawn(child.stdout.take());
        let mut stderr = Drain::spawn(child.stderr.take());

        let waited = tokio::select! {
            status = child.wait() => Wait::Exited(status),
            _ = cancel.cancelled() => Wait::Cancelled,
            _ = deadline(timeout_seconds) => Wait::TimedOut,
        };

        let termination = match waited {
            Wait::Exited(status) => match status?.code() {
                Some(code) => Termination::Exited(code),
                None => Termination::Signaled,
            },
            Wait::Cancelled => {
                warn!("Cancelling {}", spec.display());
                kill(&mut child, pgid, &spec.program).await;
                Termination::Cancelled
            }
            Wait::TimedOut => {
                warn!("{} timed out after {}s", spec.display(), timeout_seconds);
                kill(&mut child, pgid, &spec.program).await;
                Termination::TimedOut
            }
        };

        let (stdout_closed, stderr_closed) = tokio::join!(
            stdout.closed_within(DRAIN_GRACE),
            stderr.closed_within(DRAIN_GRACE)
        );
        if !(stdout_closed && stderr_closed) {
            warn!(
                "Output of {} still open {:?} after exit, killing leftover processes",
                spec.program, DRAIN_GRACE
            );
            kill_group(pgid, &spec.program);
            tokio::join!(
                stdout.closed_within(KILL_GRACE),
                stderr.closed_within(KILL_GRACE)
            );
        }

        let stdout = stdout.into_bytes();
        let stderr = stderr.into_bytes();
        let finished_at = Utc::now();
        let duration_ms = (finished_at - started_at).num_milliseconds().max(0) as u64;

        let result = ExecutionResult {
            program: spec.program.clone(),
            termination,
            stdout,
            stderr,
            started_at,
            finished_at,
            duration_ms,
            timeout_seconds,
        };

        if result.success() {
            info!("{} completed in {}ms", spec.program, duration_ms);
        } else {
            warn!(
                "{} failed ({:?}) after {}ms",
                spec.program, result.termination, duration_ms
            );
        }

        Ok(result)
    }
}
