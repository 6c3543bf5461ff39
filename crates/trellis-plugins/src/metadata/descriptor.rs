//! Self-declared plugin descriptors and the loaders that read them.

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::METADATA_TARGET;
use crate::process::{CommandLine, CommandRunner};

/// Imports the module named by the first argument and prints its `info`
/// export (or `default.info`) as JSON on the final output line.
const NODE_PROBE: &str = r"
import { pathToFileURL } from 'node:url';
const loaded = await import(pathToFileURL(process.argv[1]).href);
const info = loaded.info ?? loaded.default?.info ?? null;
process.stdout.write('\n' + JSON.stringify(info) + '\n');
process.exit(0);
";

/// The `info` object a plugin module exports about itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PluginDescriptor {
    /// Self-declared identifier.
    pub id: Option<String>,
    /// Human-readable name.
    pub name: Option<String>,
    /// Short description.
    pub description: Option<String>,
    /// Self-declared version.
    pub version: Option<String>,
}

impl PluginDescriptor {
    /// Builds a descriptor from a JSON value.
    ///
    /// Returns `None` unless `value` is an object. Fields that are not
    /// strings are ignored.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let text = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_owned);
        Some(Self {
            id: text("id"),
            name: text("name"),
            description: text("description"),
            version: text("version"),
        })
    }
}

/// Capability that evaluates a plugin module and extracts its descriptor.
///
/// Implementations return `None` for anything short of a usable
/// descriptor: missing file, load error, invalid output or absent export.
pub trait DescriptorLoader: Send + Sync {
    /// Loads the descriptor exported by `module_path`, evaluating it with
    /// `plugin_dir` as the working directory.
    fn load(&self, module_path: &Path, plugin_dir: &Path) -> Option<PluginDescriptor>;
}

impl<T: DescriptorLoader + ?Sized> DescriptorLoader for &T {
    fn load(&self, module_path: &Path, plugin_dir: &Path) -> Option<PluginDescriptor> {
        (**self).load(module_path, plugin_dir)
    }
}

impl<T: DescriptorLoader + ?Sized> DescriptorLoader for Box<T> {
    fn load(&self, module_path: &Path, plugin_dir: &Path) -> Option<PluginDescriptor> {
        (**self).load(module_path, plugin_dir)
    }
}

/// Loader that never evaluates anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDescriptorLoader;

impl DescriptorLoader for NoDescriptorLoader {
    fn load(&self, _module_path: &Path, _plugin_dir: &Path) -> Option<PluginDescriptor> {
        None
    }
}

/// Loader that imports modules with the Node.js runtime.
///
/// CommonJS and ES modules both load through dynamic `import()`. The
/// module's top-level code runs, so this loader should only be pointed at
/// plugins the operator already trusts.
#[derive(Debug, Clone)]
pub struct NodeDescriptorLoader<R> {
    runner: R,
    node_program: String,
}

impl<R: CommandRunner> NodeDescriptorLoader<R> {
    /// Creates a loader invoking `node_program` through `runner`.
    #[must_use]
    pub fn new(runner: R, node_program: impl Into<String>) -> Self {
        Self {
            runner,
            node_program: node_program.into(),
        }
    }

    fn probe_command(&self, module: &Path) -> CommandLine {
        CommandLine::new(self.node_program.as_str())
            .args(["--input-type=module", "-e", NODE_PROBE])
            .arg(module.to_string_lossy())
    }
}

impl<R: CommandRunner> DescriptorLoader for NodeDescriptorLoader<R> {
    fn load(&self, module_path: &Path, plugin_dir: &Path) -> Option<PluginDescriptor> {
        if !module_path.is_file() {
            return None;
        }
        let module = fs::canonicalize(module_path).ok()?;
        let output = self.runner.run(&self.probe_command(&module), plugin_dir);
        if !output.succeeded() {
            debug!(
                target: METADATA_TARGET,
                module = %module.display(),
                error = %output.diagnostic(),
                "descriptor probe failed"
            );
            return None;
        }
        parse_probe_output(output.stdout())
    }
}

/// Extracts the descriptor from the last non-empty line of probe output.
///
/// Earlier lines belong to whatever the module printed while loading.
pub(crate) fn parse_probe_output(stdout: &str) -> Option<PluginDescriptor> {
    let line = stdout.lines().rev().find(|line| !line.trim().is_empty())?;
    let value: Value = serde_json::from_str(line.trim()).ok()?;
    PluginDescriptor::from_value(&value)
}
