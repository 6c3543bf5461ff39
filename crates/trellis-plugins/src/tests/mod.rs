//! Test doubles shared by the engine's unit and behaviour tests.


use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use mockall::mock;

use crate::error::RunFailure;
use crate::process::{CommandLine, CommandOutput, CommandRunner};

mock! {
    pub Runner {}
    impl CommandRunner for Runner {
        fn run(&self, command: &CommandLine, working_dir: &Path) -> CommandOutput;
    }
}

type Effect = Box<dyn Fn(&CommandLine, &Path) + Send + Sync>;

struct Rule {
    prefix: Vec<String>,
    output: CommandOutput,
    effect: Option<Effect>,
}

/// Runner that answers from a script keyed by argument prefix.
///
/// The first rule whose prefix matches the command's arguments wins.
/// Unscripted commands fail with a non-zero exit. Every call is recorded.
#[derive(Default)]
pub(crate) struct ScriptedRunner {
    rules: Vec<Rule>,
    calls: Mutex<Vec<(CommandLine, PathBuf)>>,
}

impl ScriptedRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Answers commands starting with `prefix` successfully.
    pub(crate) fn on(self, prefix: &[&str], stdout: &str) -> Self {
        self.rule(prefix, CommandOutput::success(stdout, ""), None)
    }

    /// Answers commands starting with `prefix` with a failure.
    pub(crate) fn fail(self, prefix: &[&str], stderr: &str) -> Self {
        let failure = RunFailure::NonZeroExit {
            program: String::from("scripted"),
            status: String::from("exit code 1"),
        };
        self.rule(prefix, CommandOutput::failed(failure, "", stderr), None)
    }

    /// Answers successfully after running `effect`, e.g. to create the
    /// directory a clone would have produced.
    pub(crate) fn on_with(
        self,
        prefix: &[&str],
        stdout: &str,
        effect: impl Fn(&CommandLine, &Path) + Send + Sync + 'static,
    ) -> Self {
        self.rule(
            prefix,
            CommandOutput::success(stdout, ""),
            Some(Box::new(effect)),
        )
    }

    fn rule(mut self, prefix: &[&str], output: CommandOutput, effect: Option<Effect>) -> Self {
        self.rules.push(Rule {
            prefix: prefix.iter().map(|arg| (*arg).to_owned()).collect(),
            output,
            effect,
        });
        self
    }

    /// Every command run so far, with its working directory.
    pub(crate) fn calls(&self) -> Vec<(CommandLine, PathBuf)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns `true` if any recorded command starts with `prefix`.
    pub(crate) fn was_called(&self, prefix: &[&str]) -> bool {
        self.calls()
            .iter()
            .any(|(command, _)| starts_with(command, prefix))
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, command: &CommandLine, working_dir: &Path) -> CommandOutput {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((command.clone(), working_dir.to_path_buf()));
        let rule = self
            .rules
            .iter()
            .find(|rule| starts_with(command, &rule.prefix));
        match rule {
            Some(rule) => {
                if let Some(effect) = &rule.effect {
                    effect(command, working_dir);
                }
                rule.output.clone()
            }
            None => CommandOutput::failed(
                RunFailure::NonZeroExit {
                    program: command.program().to_owned(),
                    status: String::from("exit code 127"),
                },
                "",
                format!("unscripted command: {command}"),
            ),
        }
    }
}

fn starts_with<S: AsRef<str>>(command: &CommandLine, prefix: &[S]) -> bool {
    command.arguments().len() >= prefix.len()
        && command
            .arguments()
            .iter()
            .zip(prefix)
            .all(|(arg, expected)| arg == expected.as_ref())
}
