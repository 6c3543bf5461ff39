//! Engine tunables and the command lines built from them.

use crate::process::CommandLine;

/// Knobs the engine consults while probing and mutating plugins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Version-control client.
    pub git_program: String,
    /// Dependency installer.
    pub npm_program: String,
    /// Refresh remote-tracking data before computing `is_behind_remote`.
    pub fetch_remote: bool,
    /// Ask the installer for development dependencies too.
    pub include_dev_dependencies: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            git_program: String::from("git"),
            npm_program: String::from("npm"),
            fetch_remote: true,
            include_dev_dependencies: false,
        }
    }
}

impl EngineSettings {
    /// A git invocation that never prompts and reports in the C locale.
    ///
    /// Failure classification matches git's English diagnostics, so the
    /// locale is pinned for every git call.
    #[must_use]
    pub fn git<I, S>(&self, args: I) -> CommandLine
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandLine::new(self.git_program.as_str())
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("LC_ALL", "C")
    }

    /// The dependency installation command.
    #[must_use]
    pub fn npm_install(&self) -> CommandLine {
        let command = CommandLine::new(self.npm_program.as_str()).arg("install");
        if self.include_dev_dependencies {
            command.arg("--include=dev")
        } else {
            command
        }
    }
}
