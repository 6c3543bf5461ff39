//! Subprocess execution behind a non-failing contract.
//!
//! Every external tool the engine relies on (`git`, `npm`, `node`) is invoked
//! through the [`CommandRunner`] trait. A runner never panics and never
//! returns `Err`: spawn failures, non-zero exits, timeouts and oversized
//! output all come back as a [`CommandOutput`] whose
//! [`succeeded`](CommandOutput::succeeded) flag is `false`, with whatever
//! diagnostic text was captured.
//!
//! Each invocation names its working directory explicitly. The engine never
//! reads or changes the process-wide current directory, so concurrent
//! invocations for different plugins cannot interfere.

mod system;

use std::fmt;
use std::path::Path;

use crate::error::RunFailure;

pub use self::system::SystemRunner;

/// Tracing target for subprocess supervision.
pub(crate) const PROCESS_TARGET: &str = "trellis_plugins::process";

/// A program plus its arguments and environment overrides.
///
/// Arguments are passed to the program verbatim; no shell is involved, so
/// locators and directory names are never re-interpreted.
///
/// # Example
///
/// ```
/// use trellis_plugins::process::CommandLine;
///
/// let command = CommandLine::new("git")
///     .args(["remote", "get-url", "origin"])
///     .env("GIT_TERMINAL_PROMPT", "0");
/// assert_eq!(command.program(), "git");
/// assert_eq!(command.to_string(), "git remote get-url origin");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
    envs: Vec<(String, String)>,
}

impl CommandLine {
    /// Starts a command line for `program`.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets an environment variable for the child only.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Program to execute.
    #[must_use]
    pub fn program(&self) -> &str {
        self.program.as_str()
    }

    /// Arguments in order.
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Environment overrides in insertion order.
    #[must_use]
    pub fn envs(&self) -> &[(String, String)] {
        &self.envs
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Result of one subprocess invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    stdout: String,
    stderr: String,
    failure: Option<RunFailure>,
}

impl CommandOutput {
    /// Output of a command that exited successfully.
    #[must_use]
    pub fn success(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            failure: None,
        }
    }

    /// Output of a command that failed, with whatever was captured.
    #[must_use]
    pub fn failed(
        failure: RunFailure,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            failure: Some(failure),
        }
    }

    /// Returns `true` when the command ran and exited successfully.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    /// Captured standard output.
    #[must_use]
    pub fn stdout(&self) -> &str {
        self.stdout.as_str()
    }

    /// Captured standard error.
    #[must_use]
    pub fn stderr(&self) -> &str {
        self.stderr.as_str()
    }

    /// Why the command failed, if it did.
    #[must_use]
    pub const fn failure(&self) -> Option<&RunFailure> {
        self.failure.as_ref()
    }

    /// Trimmed standard output when the command succeeded and printed
    /// something.
    #[must_use]
    pub fn non_empty_stdout(&self) -> Option<&str> {
        let trimmed = self.stdout.trim();
        (self.succeeded() && !trimmed.is_empty()).then_some(trimmed)
    }

    /// Best diagnostic text for an operator.
    ///
    /// Prefers standard error, then standard output, then the failure
    /// description. Returns an empty string for a silent success.
    #[must_use]
    pub fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_owned();
        }
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return stdout.to_owned();
        }
        self.failure
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    /// Standard output and standard error joined, for pattern matching.
    #[must_use]
    pub fn combined(&self) -> String {
        let mut text = String::with_capacity(self.stdout.len() + self.stderr.len() + 1);
        text.push_str(&self.stdout);
        text.push('\n');
        text.push_str(&self.stderr);
        text
    }
}

/// Executes external commands for the engine.
///
/// The production implementation is [`SystemRunner`]. Tests substitute
/// doubles that return scripted outputs without spawning anything.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use trellis_plugins::process::{CommandLine, CommandOutput, CommandRunner};
///
/// struct Echo;
///
/// impl CommandRunner for Echo {
///     fn run(&self, command: &CommandLine, _working_dir: &Path) -> CommandOutput {
///         CommandOutput::success(command.arguments().join(" "), "")
///     }
/// }
///
/// let output = Echo.run(&CommandLine::new("echo").arg("hi"), Path::new("."));
/// assert!(output.succeeded());
/// assert_eq!(output.stdout(), "hi");
/// ```
pub trait CommandRunner: Send + Sync {
    /// Runs `command` with `working_dir` as its current directory.
    ///
    /// Implementations must capture every failure in the returned
    /// [`CommandOutput`] rather than panicking.
    fn run(&self, command: &CommandLine, working_dir: &Path) -> CommandOutput;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(&self, command: &CommandLine, working_dir: &Path) -> CommandOutput {
        (**self).run(command, working_dir)
    }
}
