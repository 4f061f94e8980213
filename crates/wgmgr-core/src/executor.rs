//! External command execution.
//!
//! [`CommandExecutor`] is the only effectful seam in the crate: key generation,
//! interface control and peer management all go through it. Two
//! implementations are provided:
//!
//! - [`ProcessExecutor`] spawns real processes with `tokio::process`.
//! - [`RecordingExecutor`] records invocations and replays canned results,
//!   for tests that must not touch the real `wg` tools.
//!
//! Arguments are passed directly to the program, never through a shell.

use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{Result, WgError};

/// Read size for draining child stdout/stderr.
const CHUNK_SIZE: usize = 4096;

/// A single external command: program, ordered arguments and optional stdin.
#[derive(Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    stdin: Option<Vec<u8>>,
}

impl Invocation {
    /// Creates an invocation of `program` with no arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
        }
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments in order.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Feeds `payload` to the process on stdin, then closes it.
    #[must_use]
    pub fn with_stdin(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(payload.into());
        self
    }

    /// The program to run.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The arguments, in order.
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// The stdin payload, if any.
    #[must_use]
    pub fn stdin_payload(&self) -> Option<&[u8]> {
        self.stdin.as_deref()
    }
}

// stdin may carry a private key.
impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("stdin", &self.stdin.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Runs external commands on behalf of the managers.
#[allow(async_fn_in_trait)]
pub trait CommandExecutor {
    /// Runs `invocation` to completion and returns its combined stdout and
    /// stderr.
    ///
    /// Returns [`WgError::CommandExecution`] on spawn failure or non-zero
    /// exit, and [`WgError::Cancelled`] if `cancel` fires first.
    async fn execute(&self, cancel: &CancellationToken, invocation: &Invocation) -> Result<Vec<u8>>;
}

/// Executes commands as real child processes.
///
/// Each child runs in its own process group. On cancellation the whole group
/// is killed and the child reaped before the call returns.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    /// Creates a new process executor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl CommandExecutor for ProcessExecutor {
    async fn execute(&self, cancel: &CancellationToken, invocation: &Invocation) -> Result<Vec<u8>> {
        let command = invocation.to_string();
        if cancel.is_cancelled() {
            return Err(WgError::cancelled(command));
        }

        debug!(command = %command, "spawning command");

        let stdin = if invocation.stdin_payload().is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        };
        let mut command_builder = Command::new(invocation.program());
        command_builder
            .args(invocation.arguments())
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so cancellation also reaches the tool's children.
        #[cfg(unix)]
        command_builder.process_group(0);
        let mut child = command_builder
            .spawn()
            .map_err(|e| WgError::spawn_failed(&command, e))?;

        let mut combined = Vec::new();
        let outcome = tokio::select! {
            () = cancel.cancelled() => None,
            status = drive(&mut child, invocation.stdin_payload(), &mut combined) => Some(status),
        };

        match outcome {
            None => {
                terminate(&mut child, &command).await;
                Err(WgError::cancelled(command))
            }
            Some(Ok(status)) if status.success() => {
                debug!(command = %command, bytes = combined.len(), "command succeeded");
                Ok(combined)
            }
            Some(Ok(status)) => {
                debug!(command = %command, code = ?status.code(), "command failed");
                Err(WgError::non_zero_exit(command, status.code(), &combined))
            }
            Some(Err(e)) => {
                terminate(&mut child, &command).await;
                Err(WgError::io_failed(command, &combined, e))
            }
        }
    }
}

/// Feeds stdin while draining stdout and stderr into `combined`, then waits
/// for exit.
async fn drive(child: &mut Child, stdin: Option<&[u8]>, combined: &mut Vec<u8>) -> io::Result<ExitStatus> {
    let feed = feed_stdin(child.stdin.take(), stdin);
    let drain = drain_output(child.stdout.take(), child.stderr.take(), combined);
    tokio::try_join!(feed, drain)?;
    child.wait().await
}

/// Writes `payload` and closes the pipe.
async fn feed_stdin(pipe: Option<ChildStdin>, payload: Option<&[u8]>) -> io::Result<()> {
    let (Some(mut pipe), Some(payload)) = (pipe, payload) else {
        return Ok(());
    };
    match pipe.write_all(payload).await {
        // The child exited without reading; its exit status tells the story.
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

/// Collects stdout and stderr in arrival order until both reach EOF.
async fn drain_output(
    mut stdout: Option<ChildStdout>,
    mut stderr: Option<ChildStderr>,
    combined: &mut Vec<u8>,
) -> io::Result<()> {
    let mut out_chunk = [0u8; CHUNK_SIZE];
    let mut err_chunk = [0u8; CHUNK_SIZE];

    while stdout.is_some() || stderr.is_some() {
        tokio::select! {
            read = read_chunk(&mut stdout, &mut out_chunk), if stdout.is_some() => {
                match read? {
                    0 => stdout = None,
                    n => combined.extend_from_slice(&out_chunk[..n]),
                }
            }
            read = read_chunk(&mut stderr, &mut err_chunk), if stderr.is_some() => {
                match read? {
                    0 => stderr = None,
                    n => combined.extend_from_slice(&err_chunk[..n]),
                }
            }
        }
    }

    Ok(())
}

async fn read_chunk<R: AsyncRead + Unpin>(pipe: &mut Option<R>, buf: &mut [u8]) -> io::Result<usize> {
    match pipe {
        Some(reader) => reader.read(buf).await,
        None => std::future::pending().await,
    }
}

/// Kills the child's whole process group, then reaps the child.
async fn terminate(child: &mut Child, command: &str) {
    warn!(command = %command, "terminating child process group");

    #[cfg(unix)]
    {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        // The group id equals the child's pid; see `process_group(0)`.
        if let Some(pid) = child.id().and_then(|id| i32::try_from(id).ok()) {
            if let Err(e) = killpg(Pid::from_raw(pid), Signal::SIGKILL) {
                warn!(command = %command, error = %e, "failed to signal process group");
            }
        }
    }

    if let Err(e) = child.kill().await {
        warn!(command = %command, error = %e, "failed to kill child process");
    }
}

/// A canned result for [`RecordingExecutor`].
#[derive(Clone, Debug)]
pub enum CannedResponse {
    /// Succeed with this combined output.
    Output(Vec<u8>),
    /// Fail as if the process exited with `exit_code`.
    Failure {
        /// Exit code to report.
        exit_code: i32,
        /// Combined output to report.
        output: Vec<u8>,
    },
    /// Block until the cancellation token fires.
    Hang,
}

#[derive(Debug, Default)]
struct RecordingState {
    calls: Vec<Invocation>,
    responses: VecDeque<CannedResponse>,
}

/// A substitute executor that records every invocation.
///
/// Responses are consumed in FIFO order; once the queue is empty every call
/// succeeds with empty output. Clones share the same log and queue.
#[derive(Clone, Debug, Default)]
pub struct RecordingExecutor {
    state: Arc<Mutex<RecordingState>>,
}

impl RecordingExecutor {
    /// Creates an executor with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response for the next unanswered call.
    pub fn respond(&self, response: CannedResponse) {
        self.state.lock().responses.push_back(response);
    }

    /// Queues a successful response with `output`.
    pub fn push_output(&self, output: impl Into<Vec<u8>>) {
        self.respond(CannedResponse::Output(output.into()));
    }

    /// Queues a failing response.
    pub fn push_failure(&self, exit_code: i32, output: impl Into<Vec<u8>>) {
        self.respond(CannedResponse::Failure {
            exit_code,
            output: output.into(),
        });
    }

    /// Queues a response that only returns once cancelled.
    pub fn push_hang(&self) {
        self.respond(CannedResponse::Hang);
    }

    /// All recorded invocations, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<Invocation> {
        self.state.lock().calls.clone()
    }

    /// The most recent invocation.
    #[must_use]
    pub fn last_call(&self) -> Option<Invocation> {
        self.state.lock().calls.last().cloned()
    }

    /// Number of recorded invocations.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }
}

impl CommandExecutor for RecordingExecutor {
    async fn execute(&self, cancel: &CancellationToken, invocation: &Invocation) -> Result<Vec<u8>> {
        let command = invocation.to_string();
        if cancel.is_cancelled() {
            return Err(WgError::cancelled(command));
        }

        let response = {
            let mut state = self.state.lock();
            state.calls.push(invocation.clone());
            state.responses.pop_front()
        };

        match response.unwrap_or_else(|| CannedResponse::Output(Vec::new())) {
            CannedResponse::Output(output) => Ok(output),
            CannedResponse::Failure { exit_code, output } => {
                Err(WgError::non_zero_exit(command, Some(exit_code), &output))
            }
            CannedResponse::Hang => {
                cancel.cancelled().await;
                Err(WgError::cancelled(command))
            }
        }
    }
}
