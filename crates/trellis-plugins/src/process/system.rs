//! [`CommandRunner`] backed by real child processes.

use std::io::{self, Read};
use std::mem;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::{CommandLine, CommandOutput, CommandRunner, PROCESS_TARGET};
use crate::error::RunFailure;

const POLL_INTERVAL: Duration = Duration::from_millis(20);
const READ_CHUNK: usize = 8 * 1024;
/// How long to wait for pipe readers once the child is gone. Grandchildren
/// that inherited a pipe (ssh under git, for instance) can hold it open.
const READER_GRACE: Duration = Duration::from_secs(2);

/// Spawns commands as child processes with a timeout and an output ceiling.
///
/// Both pipes are drained on dedicated threads so a chatty child never
/// blocks on a full pipe. The child is killed when it exceeds the timeout or
/// writes more than `max_output_bytes` to either stream; both conditions are
/// reported as failures rather than errors.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    timeout: Duration,
    max_output_bytes: usize,
}

impl SystemRunner {
    /// Creates a runner with the given per-invocation limits.
    #[must_use]
    pub const fn new(timeout: Duration, max_output_bytes: usize) -> Self {
        Self {
            timeout,
            max_output_bytes,
        }
    }

    /// Per-invocation timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Per-stream capture ceiling in bytes.
    #[must_use]
    pub const fn max_output_bytes(&self) -> usize {
        self.max_output_bytes
    }

    fn supervise(&self, command: &CommandLine, mut child: Child) -> CommandOutput {
        let program = command.program();
        let overflow = Arc::new(AtomicBool::new(false));
        let stdout = child
            .stdout
            .take()
            .map(|pipe| capture(pipe, self.max_output_bytes, Arc::clone(&overflow)));
        let stderr = child
            .stderr
            .take()
            .map(|pipe| capture(pipe, self.max_output_bytes, Arc::clone(&overflow)));

        let waited = self.wait_for_exit(program, &mut child, &overflow);
        let stdout = collect(program, stdout);
        let stderr = collect(program, stderr);

        let failure = match waited {
            Err(failure) => Some(failure),
            Ok(_) if stdout.overflowed || stderr.overflowed => {
                Some(self.output_limit_failure(program))
            }
            Ok(status) if status.success() => None,
            Ok(status) => Some(RunFailure::NonZeroExit {
                program: program.to_owned(),
                status: describe_status(status),
            }),
        };

        let stdout_text = String::from_utf8_lossy(&stdout.bytes).into_owned();
        let stderr_text = String::from_utf8_lossy(&stderr.bytes).into_owned();
        match failure {
            None => {
                debug!(target: PROCESS_TARGET, %program, "command succeeded");
                CommandOutput::success(stdout_text, stderr_text)
            }
            Some(failure) => {
                warn!(
                    target: PROCESS_TARGET,
                    %program,
                    error = %failure,
                    stderr = %stderr_text.trim(),
                    "command failed"
                );
                CommandOutput::failed(failure, stdout_text, stderr_text)
            }
        }
    }

    /// Polls the child until it exits, the deadline passes, or a reader
    /// reports that the output ceiling was crossed.
    fn wait_for_exit(
        &self,
        program: &str,
        child: &mut Child,
        overflow: &AtomicBool,
    ) -> Result<ExitStatus, RunFailure> {
        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {
                    if overflow.load(Ordering::Relaxed) {
                        terminate(child);
                        return Err(self.output_limit_failure(program));
                    }
                    if Instant::now() >= deadline {
                        warn!(
                            target: PROCESS_TARGET,
                            %program,
                            timeout_secs = self.timeout.as_secs(),
                            "command timed out, killing process"
                        );
                        terminate(child);
                        return Err(RunFailure::TimedOut {
                            program: program.to_owned(),
                            timeout_secs: self.timeout.as_secs(),
                        });
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(error) => {
                    terminate(child);
                    return Err(RunFailure::Io {
                        program: program.to_owned(),
                        source: Arc::new(error),
                    });
                }
            }
        }
    }

    fn output_limit_failure(&self, program: &str) -> RunFailure {
        RunFailure::OutputLimitExceeded {
            program: program.to_owned(),
            limit: self.max_output_bytes,
        }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, command: &CommandLine, working_dir: &Path) -> CommandOutput {
        debug!(
            target: PROCESS_TARGET,
            command = %command,
            working_dir = %working_dir.display(),
            "running command"
        );

        let spawned = Command::new(command.program())
            .args(command.arguments())
            .envs(command.envs().iter().map(|(key, value)| (key, value)))
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();

        match spawned {
            Ok(child) => self.supervise(command, child),
            Err(error) => {
                let failure = RunFailure::Spawn {
                    program: command.program().to_owned(),
                    source: Arc::new(error),
                };
                warn!(target: PROCESS_TARGET, error = %failure, "command could not start");
                CommandOutput::failed(failure, String::new(), String::new())
            }
        }
    }
}

#[derive(Debug, Default)]
struct Captured {
    bytes: Vec<u8>,
    overflowed: bool,
}

/// Capture shared with one pipe reader thread.
struct StreamReader {
    captured: Arc<Mutex<Captured>>,
    finished: Receiver<()>,
}

/// Drains `pipe` on a background thread, keeping at most `limit` bytes.
///
/// Once the limit is crossed the reader raises `overflow` and keeps draining
/// without storing, so the child never blocks on a full pipe before the
/// supervisor kills it.
fn capture<R>(mut pipe: R, limit: usize, overflow: Arc<AtomicBool>) -> StreamReader
where
    R: Read + Send + 'static,
{
    let captured = Arc::new(Mutex::new(Captured::default()));
    let shared = Arc::clone(&captured);
    let (sender, finished) = mpsc::channel();
    thread::spawn(move || {
        let mut chunk = [0_u8; READ_CHUNK];
        loop {
            match pipe.read(&mut chunk) {
                Ok(0) => break,
                Ok(read) => {
                    let data = chunk.get(..read).unwrap_or_default();
                    let mut captured = shared.lock().unwrap_or_else(PoisonError::into_inner);
                    let room = limit.saturating_sub(captured.bytes.len());
                    if read > room {
                        captured
                            .bytes
                            .extend_from_slice(data.get(..room).unwrap_or_default());
                        captured.overflowed = true;
                        overflow.store(true, Ordering::Relaxed);
                    } else if !captured.overflowed {
                        captured.bytes.extend_from_slice(data);
                    }
                }
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(_) => break,
            }
        }
        drop(sender.send(()));
    });
    StreamReader { captured, finished }
}

/// Takes what a reader has captured, waiting up to [`READER_GRACE`] for it to
/// reach end of file. A pipe still held open by a grandchild keeps the bytes
/// read so far.
fn collect(program: &str, reader: Option<StreamReader>) -> Captured {
    let Some(reader) = reader else {
        return Captured::default();
    };
    if reader.finished.recv_timeout(READER_GRACE).is_err() {
        debug!(
            target: PROCESS_TARGET,
            %program,
            "output pipe still open after exit; keeping partial capture"
        );
    }
    let mut captured = reader
        .captured
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    mem::take(&mut *captured)
}

fn terminate(child: &mut Child) {
    drop(child.kill());
    drop(child.wait());
}

fn describe_status(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {code}"),
        None => String::from("terminated by signal"),
    }
}
