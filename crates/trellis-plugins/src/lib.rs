//! Plugin lifecycle engine for Trellis.
//!
//! A plugin is an immediate subdirectory of one plugins directory, usually a
//! git checkout with a `package.json`. The engine reconciles what is on disk
//! with what the operator wants:
//!
//! - [`PluginManager::list_plugins`] builds a fresh [`PluginRecord`] per
//!   plugin from its git state ([`inspect`]) and its metadata
//!   ([`metadata`]);
//! - [`PluginManager::install`], [`update`](PluginManager::update),
//!   [`delete`](PluginManager::delete) and
//!   [`materialise_dependencies`](PluginManager::materialise_dependencies)
//!   mutate one plugin and report an [`OperationOutcome`].
//!
//! All external tools run through the [`CommandRunner`] seam in
//! [`process`], which never fails by panicking or returning `Err`.

mod catalog;
mod error;
pub mod inspect;
mod layout;
mod lifecycle;
mod locks;
mod manager;
pub mod metadata;
mod outcome;
pub mod process;
mod record;
mod settings;

#[cfg(test)]
mod tests;

pub use self::error::{CatalogError, ErrorKind, ManifestError, NameError, RunFailure};
pub use self::inspect::{RepositoryInspector, RepositoryState};
pub use self::layout::{BUILT_IN_RESERVED, PluginLayout, validate_directory_name};
pub use self::locks::{DirectoryLease, DirectoryLocks};
pub use self::manager::PluginManager;
pub use self::metadata::{
    DescriptorLoader, MetadataResolver, NoDescriptorLoader, NodeDescriptorLoader,
    PackageManifest, PluginDescriptor, ResolvedMetadata,
};
pub use self::outcome::OperationOutcome;
pub use self::process::{CommandLine, CommandOutput, CommandRunner, SystemRunner};
pub use self::record::PluginRecord;
pub use self::settings::EngineSettings;
