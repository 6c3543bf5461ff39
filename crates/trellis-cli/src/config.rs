//! Configuration loading helpers for the Trellis CLI.
//!
//! Configuration flags are split off the front of the argument list so the
//! `ortho_config` loader only sees flags it understands, while clap parses
//! the remaining command tokens.

use std::ffi::{OsStr, OsString};

use trellis_config::{Config, OrthoConfig};

use crate::errors::AppError;

/// CLI flags recognised by the configuration loader.
///
/// Boolean and list settings (`fetch_remote`, `reserved_dirs`, ...) are set
/// through the configuration file or `TRELLIS_*` variables instead.
pub(crate) const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--plugins-dir",
    "--manager-id",
    "--git-program",
    "--npm-program",
    "--node-program",
    "--command-timeout-secs",
    "--max-output-bytes",
    "--log-filter",
    "--log-format",
];

pub(crate) trait ConfigLoader {
    /// Loads configuration for the CLI.
    ///
    /// # Flag Ordering
    ///
    /// Configuration flags must appear before the command. Flags after the
    /// command are parsed as command arguments instead.
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::load_from_iter(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Include { needs_value: bool },
    Stop,
}

fn process_config_flag(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    if !text.starts_with("--") {
        return FlagAction::Stop;
    }
    let (flag, inline_value) = match text.split_once('=') {
        Some((flag, _)) => (flag, true),
        None => (&*text, false),
    };
    if CONFIG_CLI_FLAGS.contains(&flag) {
        FlagAction::Include {
            needs_value: !inline_value,
        }
    } else {
        FlagAction::Stop
    }
}

/// Configuration arguments (with the program name first) and the index at
/// which command arguments begin.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ConfigArgumentSplit {
    pub(crate) config_arguments: Vec<OsString>,
    pub(crate) command_start: usize,
}

pub(crate) fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let Some(program) = args.first() else {
        return ConfigArgumentSplit {
            config_arguments: Vec::new(),
            command_start: 0,
        };
    };

    let mut config_arguments = vec![program.clone()];
    let mut remaining = args.iter().skip(1);
    let mut command_start = 1;
    while let Some(argument) = remaining.next() {
        let FlagAction::Include { needs_value } = process_config_flag(argument) else {
            break;
        };
        config_arguments.push(argument.clone());
        command_start += 1;
        if let Some(value) = needs_value.then(|| remaining.next()).flatten() {
            config_arguments.push(value.clone());
            command_start += 1;
        }
    }

    ConfigArgumentSplit {
        config_arguments,
        command_start,
    }
}

/// Program name followed by everything from the command onwards.
pub(crate) fn command_arguments(args: &[OsString], split: &ConfigArgumentSplit) -> Vec<OsString> {
    args.first()
        .into_iter()
        .chain(args.iter().skip(split.command_start))
        .cloned()
        .collect()
}
