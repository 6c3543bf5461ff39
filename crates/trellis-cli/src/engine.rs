//! Builds the plugin engine from loaded configuration.

use std::time::Duration;

use tracing::{info, warn};
use trellis_config::Config;
use trellis_plugins::{
    CommandLine, CommandRunner, DescriptorLoader, EngineSettings, NoDescriptorLoader,
    NodeDescriptorLoader, PluginLayout, PluginManager, SystemRunner,
};

pub(crate) type Engine = PluginManager<SystemRunner, Box<dyn DescriptorLoader>>;

pub(crate) fn build_engine(config: &Config) -> Engine {
    let runner = SystemRunner::new(
        Duration::from_secs(config.command_timeout_secs),
        config.max_output_bytes,
    );
    let layout = PluginLayout::new(config.plugins_dir().as_std_path(), config.manager_id())
        .with_reserved(config.reserved_dirs());
    let settings = EngineSettings {
        git_program: config.git_program.clone(),
        npm_program: config.npm_program.clone(),
        fetch_remote: config.fetch_remote,
        include_dev_dependencies: config.include_dev_dependencies,
    };
    let loader: Box<dyn DescriptorLoader> = if config.probe_descriptors {
        Box::new(NodeDescriptorLoader::new(
            runner.clone(),
            config.node_program.as_str(),
        ))
    } else {
        Box::new(NoDescriptorLoader)
    };
    PluginManager::with_loader(layout, settings, runner, loader)
}

/// Logs the git client version, or warns when git cannot be run.
pub(crate) fn log_git_version(engine: &Engine) {
    let command = CommandLine::new(engine.settings().git_program.as_str()).arg("--version");
    let output = SystemRunner::new(Duration::from_secs(10), 4096)
        .run(&command, &std::env::temp_dir());
    match output.non_empty_stdout() {
        Some(version) => info!(%version, "git detected"),
        None => warn!(
            error = %output.diagnostic(),
            "git is not available; plugin operations will fail"
        ),
    }
}
