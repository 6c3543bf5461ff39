//! Command-line runtime for the Trellis plugin manager.
//!
//! The runtime splits configuration flags from command tokens, loads the
//! layered configuration, installs logging, then runs one plugin operation
//! and renders its result. Configuration loading and the IO streams are
//! injectable so tests can drive the full runtime in-process.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use trellis_config::Config;

mod cli;
mod config;
mod engine;
mod errors;
pub mod output;
mod telemetry;

use cli::{Cli, CliCommand};
use config::{ConfigLoader, OrthoConfigLoader, command_arguments, split_config_arguments};
use engine::{Engine, build_engine, log_git_version};
use errors::AppError;
pub use output::{OutputFormat, ResolvedOutputFormat};

/// Bundles the IO streams provided to the CLI runtime.
pub(crate) struct IoStreams<'a, W: Write, E: Write> {
    pub(crate) stdout: &'a mut W,
    pub(crate) stderr: &'a mut E,
    stdout_is_terminal: bool,
}

impl<'a, W: Write, E: Write> IoStreams<'a, W, E> {
    pub(crate) const fn new(stdout: &'a mut W, stderr: &'a mut E, stdout_is_terminal: bool) -> Self {
        Self {
            stdout,
            stderr,
            stdout_is_terminal,
        }
    }
}

/// Runs the CLI using the provided arguments and IO handles.
///
/// Returns success only when the requested operation succeeded.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E, stdout_is_terminal: bool) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let mut io = IoStreams::new(stdout, stderr, stdout_is_terminal);
    run_with_loader(args, &mut io, &OrthoConfigLoader)
}

/// Runs the CLI with a custom configuration loader.
pub(crate) fn run_with_loader<I, W, E, L>(args: I, io: &mut IoStreams<'_, W, E>, loader: &L) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&args);

    let cli = match Cli::try_parse_from(command_arguments(&args, &split)) {
        Ok(cli) => cli,
        Err(error) if !error.use_stderr() => {
            // --help and --version are not failures.
            drop(write!(io.stdout, "{error}"));
            return ExitCode::SUCCESS;
        }
        Err(error) => return report(io, &AppError::CliUsage(error)),
    };

    let result = loader
        .load(&split.config_arguments)
        .and_then(|config| prepare(&config))
        .and_then(|engine| {
            let format = cli.output.resolve(io.stdout_is_terminal);
            execute(&engine, cli.command, format, &mut *io.stdout)
        });

    match result {
        Ok(exit_code) => exit_code,
        Err(error) => report(io, &error),
    }
}

fn prepare(config: &Config) -> Result<Engine, AppError> {
    telemetry::initialise(config)?;
    let engine = build_engine(config);
    log_git_version(&engine);
    Ok(engine)
}

fn execute<W: Write>(
    engine: &Engine,
    command: CliCommand,
    format: ResolvedOutputFormat,
    stdout: &mut W,
) -> Result<ExitCode, AppError> {
    let outcome = match command {
        CliCommand::List => {
            return match engine.list_plugins() {
                Ok(plugins) => {
                    output::write_listing(stdout, format, &plugins)?;
                    Ok(ExitCode::SUCCESS)
                }
                Err(error) => {
                    let error = AppError::from(error);
                    output::write_failure(stdout, format, &error.to_string())?;
                    Ok(ExitCode::FAILURE)
                }
            };
        }
        CliCommand::Install { locator } => engine.install(&locator),
        CliCommand::Update { directory } => engine.update(&directory),
        CliCommand::Remove { directory } => engine.delete(&directory),
        CliCommand::Deps { directory } => engine.materialise_dependencies(&directory),
    };
    output::write_outcome(stdout, format, &outcome)?;
    Ok(if outcome.succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn report<W: Write, E: Write>(io: &mut IoStreams<'_, W, E>, error: &AppError) -> ExitCode {
    drop(writeln!(io.stderr, "{error}"));
    ExitCode::FAILURE
}
