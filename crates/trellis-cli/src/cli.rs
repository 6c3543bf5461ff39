//! Command-line argument definitions.

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

/// Command-line interface for the Trellis plugin manager.
#[derive(Parser, Debug)]
#[command(
    name = "trellis",
    version,
    about = "Installs, updates and removes git-hosted plugins",
    disable_help_subcommand = true
)]
pub(crate) struct Cli {
    /// Controls how results are rendered.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Auto)]
    pub(crate) output: OutputFormat,
    /// The operation to perform.
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Plugin operations.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum CliCommand {
    /// Lists every managed plugin with its git and package state.
    List,
    /// Clones a plugin repository into the plugins directory.
    Install {
        /// Repository URL or path understood by `git clone`.
        locator: String,
    },
    /// Pulls upstream changes into a plugin.
    Update {
        /// Plugin directory name.
        directory: String,
    },
    /// Deletes a plugin directory.
    Remove {
        /// Plugin directory name.
        directory: String,
    },
    /// Runs the dependency installer for a plugin.
    Deps {
        /// Plugin directory name.
        directory: String,
    },
}
