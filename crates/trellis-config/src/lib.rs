//! Shared configuration for the Trellis plugin manager.
//!
//! [`Config`] is assembled by `ortho_config` from four layers, lowest
//! precedence first: the built-in defaults in [`defaults`], a TOML file named
//! by `--config-path` or `TRELLIS_CONFIG_PATH`, `TRELLIS_*` environment
//! variables, and command-line flags. The engine itself never reads this
//! type; the CLI converts it into engine settings once at start-up.

mod defaults;
mod logging;

use camino::{Utf8Path, Utf8PathBuf};
pub use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_COMMAND_TIMEOUT_SECS, DEFAULT_LOG_FILTER, DEFAULT_MANAGER_ID,
    DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_PLUGINS_DIR, DEFAULT_RESERVED_DIRS, default_git_program,
    default_log_filter, default_log_filter_string, default_log_format, default_manager_id,
    default_node_program, default_npm_program, default_plugins_dir, default_reserved_dirs,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Layered runtime configuration for the plugin manager.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "TRELLIS")]
pub struct Config {
    /// Directory whose immediate subdirectories are the managed plugins.
    #[ortho_config(default = defaults::default_plugins_dir())]
    pub plugins_dir: Utf8PathBuf,
    /// Directory name of the manager itself; never listed or deleted.
    #[ortho_config(default = defaults::default_manager_id())]
    pub manager_id: String,
    /// Directory names excluded from the catalog besides the manager.
    #[ortho_config(default = defaults::default_reserved_dirs())]
    pub reserved_dirs: Vec<String>,
    /// Version-control client.
    #[ortho_config(default = defaults::default_git_program())]
    pub git_program: String,
    /// Dependency installer.
    #[ortho_config(default = defaults::default_npm_program())]
    pub npm_program: String,
    /// Runtime used for descriptor probes.
    #[ortho_config(default = defaults::default_node_program())]
    pub node_program: String,
    /// Timeout applied to every subprocess, in seconds.
    #[ortho_config(default = DEFAULT_COMMAND_TIMEOUT_SECS)]
    pub command_timeout_secs: u64,
    /// Ceiling on captured output per stream, in bytes.
    #[ortho_config(default = DEFAULT_MAX_OUTPUT_BYTES)]
    pub max_output_bytes: usize,
    /// Refresh remote-tracking branches while building the catalog.
    #[ortho_config(default = true)]
    pub fetch_remote: bool,
    /// Evaluate plugin entry points to read their self-declared descriptor.
    #[ortho_config(default = true)]
    pub probe_descriptors: bool,
    /// Install development dependencies as well.
    #[ortho_config(default = false)]
    pub include_dev_dependencies: bool,
    /// `tracing` filter expression.
    #[ortho_config(default = defaults::default_log_filter_string())]
    pub log_filter: String,
    /// Log output format.
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            plugins_dir: default_plugins_dir(),
            manager_id: default_manager_id(),
            reserved_dirs: default_reserved_dirs(),
            git_program: default_git_program(),
            npm_program: default_npm_program(),
            node_program: default_node_program(),
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            fetch_remote: true,
            probe_descriptors: true,
            include_dev_dependencies: false,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Directory holding the managed plugins.
    #[must_use]
    pub fn plugins_dir(&self) -> &Utf8Path {
        self.plugins_dir.as_path()
    }

    /// Directory name of the manager itself.
    #[must_use]
    pub fn manager_id(&self) -> &str {
        self.manager_id.as_str()
    }

    /// Reserved directory names, always including the built-in ones.
    #[must_use]
    pub fn reserved_dirs(&self) -> Vec<String> {
        let mut names = default_reserved_dirs();
        for name in &self.reserved_dirs {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }

    /// Configured log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Configured log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configuration_matches_documented_values() {
        let config = Config::default();
        assert_eq!(config.plugins_dir(), Utf8Path::new("plugins"));
        assert_eq!(config.manager_id(), "plugin-manager");
        assert_eq!(config.command_timeout_secs, 300);
        assert_eq!(config.max_output_bytes, 10 * 1024 * 1024);
        assert!(config.fetch_remote);
        assert!(config.probe_descriptors);
        assert!(!config.include_dev_dependencies);
        assert_eq!(config.log_format(), LogFormat::Json);
    }

    #[test]
    fn reserved_dirs_always_include_node_modules() {
        let config = Config {
            reserved_dirs: vec![String::from("vendor"), String::from("node_modules")],
            ..Config::default()
        };
        assert_eq!(
            config.reserved_dirs(),
            vec![String::from("node_modules"), String::from("vendor")]
        );
    }
}
