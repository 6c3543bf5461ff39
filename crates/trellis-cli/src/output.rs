//! Rendering of listings and operation outcomes.

use std::io::{self, Write};

use clap::ValueEnum;
use serde::Serialize;
use trellis_plugins::{OperationOutcome, PluginRecord};

use crate::errors::AppError;

/// Output format selection.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Selects `human` for terminal output and `json` for redirected output.
    #[default]
    Auto,
    /// Always render human-readable output.
    Human,
    /// Always emit JSON.
    Json,
}

/// Output format after resolving `auto` based on TTY detection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResolvedOutputFormat {
    /// Human-readable text.
    Human,
    /// One JSON document.
    Json,
}

impl OutputFormat {
    /// Resolves the output format based on whether stdout is a terminal.
    #[must_use]
    pub const fn resolve(self, stdout_is_terminal: bool) -> ResolvedOutputFormat {
        match self {
            Self::Auto if stdout_is_terminal => ResolvedOutputFormat::Human,
            Self::Auto | Self::Json => ResolvedOutputFormat::Json,
            Self::Human => ResolvedOutputFormat::Human,
        }
    }
}

#[derive(Serialize)]
struct ListingPayload<'a> {
    success: bool,
    plugins: &'a [PluginRecord],
}

#[derive(Serialize)]
struct FailurePayload<'a> {
    success: bool,
    message: &'a str,
}

pub(crate) fn write_listing<W: Write>(
    out: &mut W,
    format: ResolvedOutputFormat,
    plugins: &[PluginRecord],
) -> Result<(), AppError> {
    match format {
        ResolvedOutputFormat::Json => write_json(
            out,
            &ListingPayload {
                success: true,
                plugins,
            },
        ),
        ResolvedOutputFormat::Human if plugins.is_empty() => {
            writeln!(out, "no plugins installed")?;
            Ok(())
        }
        ResolvedOutputFormat::Human => {
            for plugin in plugins {
                write_plugin(out, plugin)?;
            }
            Ok(())
        }
    }
}

pub(crate) fn write_outcome<W: Write>(
    out: &mut W,
    format: ResolvedOutputFormat,
    outcome: &OperationOutcome,
) -> Result<(), AppError> {
    match format {
        ResolvedOutputFormat::Json => write_json(out, outcome),
        ResolvedOutputFormat::Human => {
            match outcome.error_kind {
                None => writeln!(out, "{}", outcome.message)?,
                Some(kind) => writeln!(out, "error ({kind}): {}", outcome.message)?,
            }
            if let Some(details) = &outcome.details {
                for line in details.lines() {
                    writeln!(out, "  {line}")?;
                }
            }
            if outcome.needs_dependency_install == Some(true) {
                let directory = outcome.directory_name.as_deref().unwrap_or("<directory>");
                writeln!(out, "dependencies changed; run `trellis deps {directory}`")?;
            }
            Ok(())
        }
    }
}

/// Reports a failure that has no outcome, such as an unreadable plugins
/// directory.
pub(crate) fn write_failure<W: Write>(
    out: &mut W,
    format: ResolvedOutputFormat,
    message: &str,
) -> Result<(), AppError> {
    match format {
        ResolvedOutputFormat::Json => write_json(
            out,
            &FailurePayload {
                success: false,
                message,
            },
        ),
        ResolvedOutputFormat::Human => {
            writeln!(out, "error: {message}")?;
            Ok(())
        }
    }
}

fn write_plugin<W: Write>(out: &mut W, plugin: &PluginRecord) -> io::Result<()> {
    let version = if plugin.version.is_empty() {
        String::new()
    } else {
        format!(" {}", plugin.version)
    };
    writeln!(
        out,
        "{}{version} [{}]",
        plugin.display_name, plugin.directory_name
    )?;
    if !plugin.description.is_empty() {
        writeln!(out, "  {}", plugin.description)?;
    }
    let git = if plugin.is_version_controlled {
        let worktree = if plugin.has_local_modifications {
            "modified"
        } else {
            "clean"
        };
        let remote = if plugin.is_behind_remote {
            "update available"
        } else {
            "up to date"
        };
        format!("git: {worktree}, {remote}")
    } else {
        String::from("git: not a repository")
    };
    let manifest = if plugin.has_manifest {
        format!("{} dependencies", plugin.declared_dependencies.len())
    } else {
        String::from("no package.json")
    };
    writeln!(out, "  {git}; {manifest}")
}

fn write_json<W: Write, T: Serialize>(out: &mut W, payload: &T) -> Result<(), AppError> {
    serde_json::to_writer(&mut *out, payload)?;
    writeln!(out)?;
    Ok(())
}
