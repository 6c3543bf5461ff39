//! The engine facade.

use crate::layout::PluginLayout;
use crate::locks::DirectoryLocks;
use crate::metadata::{DescriptorLoader, NoDescriptorLoader};
use crate::process::CommandRunner;
use crate::settings::EngineSettings;

/// Manages the plugins under one plugins directory.
///
/// The manager owns the layout, the engine settings, the command runner used
/// for git and npm, the descriptor loader used during listings and the
/// per-directory lock table. It holds no other state: every listing and
/// every operation observes the disk afresh.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use trellis_plugins::{EngineSettings, PluginLayout, PluginManager, SystemRunner};
///
/// let runner = SystemRunner::new(Duration::from_secs(300), 10 * 1024 * 1024);
/// let manager = PluginManager::new(
///     PluginLayout::new("plugins", "plugin-manager"),
///     EngineSettings::default(),
///     runner,
/// );
/// let outcome = manager.install("https://example.com/group/sample-plugin.git");
/// println!("{}", outcome.message);
/// ```
#[derive(Debug)]
pub struct PluginManager<R, D = NoDescriptorLoader> {
    layout: PluginLayout,
    settings: EngineSettings,
    runner: R,
    loader: D,
    locks: DirectoryLocks,
}

impl<R: CommandRunner> PluginManager<R> {
    /// Creates a manager that does not evaluate plugin modules.
    #[must_use]
    pub fn new(layout: PluginLayout, settings: EngineSettings, runner: R) -> Self {
        Self::with_loader(layout, settings, runner, NoDescriptorLoader)
    }
}

impl<R: CommandRunner, D: DescriptorLoader> PluginManager<R, D> {
    /// Creates a manager that reads descriptors through `loader`.
    #[must_use]
    pub fn with_loader(layout: PluginLayout, settings: EngineSettings, runner: R, loader: D) -> Self {
        Self {
            layout,
            settings,
            runner,
            loader,
            locks: DirectoryLocks::new(),
        }
    }

    /// Where the plugins live.
    #[must_use]
    pub const fn layout(&self) -> &PluginLayout {
        &self.layout
    }

    /// Engine settings in effect.
    #[must_use]
    pub const fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub(crate) const fn runner(&self) -> &R {
        &self.runner
    }

    pub(crate) const fn loader(&self) -> &D {
        &self.loader
    }

    pub(crate) const fn locks(&self) -> &DirectoryLocks {
        &self.locks
    }
}
