use camino::Utf8PathBuf;

/// Directory, relative to the working directory, that holds plugin checkouts.
pub const DEFAULT_PLUGINS_DIR: &str = "plugins";

/// Directory name of the plugin manager itself.
pub const DEFAULT_MANAGER_ID: &str = "plugin-manager";

/// Directory names that are never treated as plugins.
pub const DEFAULT_RESERVED_DIRS: &[&str] = &["node_modules"];

/// Upper bound on a single subprocess invocation.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 300;

/// Per-stream ceiling on captured subprocess output (10 MiB).
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Default log filter expression used by the binary.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default plugins directory.
pub fn default_plugins_dir() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_PLUGINS_DIR)
}

/// Owned manager identifier used where allocation is required (e.g. serde).
pub fn default_manager_id() -> String {
    DEFAULT_MANAGER_ID.to_owned()
}

/// Reserved directory names as owned strings.
pub fn default_reserved_dirs() -> Vec<String> {
    DEFAULT_RESERVED_DIRS
        .iter()
        .map(|name| (*name).to_owned())
        .collect()
}

/// Version-control client invoked by the engine.
pub fn default_git_program() -> String {
    String::from("git")
}

/// Dependency installer invoked by the engine.
pub fn default_npm_program() -> String {
    String::from("npm")
}

/// Runtime used to evaluate plugin entry points for their descriptor.
pub fn default_node_program() -> String {
    String::from("node")
}

/// Default log filter expression used by the binary.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binary.
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}
