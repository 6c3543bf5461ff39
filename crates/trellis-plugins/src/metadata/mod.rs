//! Plugin metadata from the dependency manifest and the module descriptor.
//!
//! Two sources describe a plugin: `package.json` (the manifest) and the
//! `info` object exported by its entry module (the descriptor). The
//! [`MetadataResolver`] reads both; [`ResolvedMetadata`] applies the merge
//! rules that turn them into display fields.

mod descriptor;

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ManifestError;

pub use self::descriptor::{
    DescriptorLoader, NoDescriptorLoader, NodeDescriptorLoader, PluginDescriptor,
};

const METADATA_TARGET: &str = "trellis_plugins::metadata";

/// File name of the dependency manifest.
pub const MANIFEST_FILE: &str = "package.json";

/// Entry modules tried when the manifest names none, in order.
const FALLBACK_ENTRY_POINTS: [&str; 2] = ["index.js", "index.mjs"];

/// The fields of `package.json` the engine reads.
///
/// Parsing is lenient: a field with an unexpected JSON type is treated as
/// absent instead of rejecting the whole manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageManifest {
    /// Package name.
    pub name: Option<String>,
    /// Package version.
    pub version: Option<String>,
    /// Package description.
    pub description: Option<String>,
    /// Entry module, relative to the plugin directory.
    pub main: Option<String>,
    /// Names under `dependencies`.
    pub dependencies: BTreeSet<String>,
    /// Names under `devDependencies`.
    pub dev_dependencies: BTreeSet<String>,
}

impl PackageManifest {
    /// Parses manifest text.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] when the text is not JSON or not an object.
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        let value: Value = serde_json::from_str(text).map_err(ManifestError::Json)?;
        let object = value.as_object().ok_or(ManifestError::NotAnObject)?;
        Ok(Self {
            name: string_field(object, "name"),
            version: string_field(object, "version"),
            description: string_field(object, "description"),
            main: string_field(object, "main"),
            dependencies: key_set(object, "dependencies"),
            dev_dependencies: key_set(object, "devDependencies"),
        })
    }

    /// The `main` entry when it stays inside the plugin directory.
    fn contained_main(&self) -> Option<&str> {
        let main = self.main.as_deref()?;
        let contained = Path::new(main)
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        contained.then_some(main)
    }
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
        .map(str::to_owned)
}

fn key_set(object: &Map<String, Value>, key: &str) -> BTreeSet<String> {
    object
        .get(key)
        .and_then(Value::as_object)
        .map(|deps| deps.keys().cloned().collect())
        .unwrap_or_default()
}

/// Manifest and descriptor of one plugin directory, as found on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedMetadata {
    /// Parsed manifest, when present and well-formed.
    pub manifest: Option<PackageManifest>,
    /// `package.json` exists, whether or not it parsed.
    pub manifest_present: bool,
    /// Descriptor exported by the entry module.
    pub descriptor: Option<PluginDescriptor>,
}

impl ResolvedMetadata {
    /// Identifier: descriptor id, else the directory name.
    #[must_use]
    pub fn declared_id(&self, directory_name: &str) -> String {
        self.descriptor_field(|d| d.id.as_deref())
            .unwrap_or(directory_name)
            .to_owned()
    }

    /// Display name: descriptor name, else manifest name, else the
    /// directory name.
    #[must_use]
    pub fn display_name(&self, directory_name: &str) -> String {
        self.descriptor_field(|d| d.name.as_deref())
            .or_else(|| self.manifest_field(|m| m.name.as_deref()))
            .unwrap_or(directory_name)
            .to_owned()
    }

    /// Description: descriptor, else manifest, else empty.
    #[must_use]
    pub fn description(&self) -> String {
        self.descriptor_field(|d| d.description.as_deref())
            .or_else(|| self.manifest_field(|m| m.description.as_deref()))
            .unwrap_or_default()
            .to_owned()
    }

    /// Version: manifest, else descriptor, else empty.
    #[must_use]
    pub fn version(&self) -> String {
        self.manifest_field(|m| m.version.as_deref())
            .or_else(|| self.descriptor_field(|d| d.version.as_deref()))
            .unwrap_or_default()
            .to_owned()
    }

    fn descriptor_field<'s>(
        &'s self,
        field: impl FnOnce(&'s PluginDescriptor) -> Option<&'s str>,
    ) -> Option<&'s str> {
        self.descriptor.as_ref().and_then(field).filter(|text| !text.is_empty())
    }

    fn manifest_field<'s>(
        &'s self,
        field: impl FnOnce(&'s PackageManifest) -> Option<&'s str>,
    ) -> Option<&'s str> {
        self.manifest.as_ref().and_then(field).filter(|text| !text.is_empty())
    }
}

/// Reads the manifest and descriptor of plugin directories.
#[derive(Debug)]
pub struct MetadataResolver<'a, D> {
    loader: &'a D,
}

impl<'a, D: DescriptorLoader> MetadataResolver<'a, D> {
    /// Creates a resolver that loads descriptors through `loader`.
    #[must_use]
    pub const fn new(loader: &'a D) -> Self {
        Self { loader }
    }

    /// Resolves the metadata of the plugin in `dir`.
    ///
    /// Missing or malformed sources leave the corresponding field empty;
    /// resolution itself never fails.
    pub fn resolve(&self, dir: &Path) -> ResolvedMetadata {
        let (manifest, manifest_present) = read_manifest(dir);
        let descriptor = entry_points(dir, manifest.as_ref())
            .into_iter()
            .find_map(|module| self.loader.load(&module, dir));
        ResolvedMetadata {
            manifest,
            manifest_present,
            descriptor,
        }
    }
}

/// Returns `true` when `dir` contains a manifest file.
#[must_use]
pub fn has_manifest(dir: &Path) -> bool {
    dir.join(MANIFEST_FILE).is_file()
}

fn read_manifest(dir: &Path) -> (Option<PackageManifest>, bool) {
    let path = dir.join(MANIFEST_FILE);
    match fs::read_to_string(&path) {
        Ok(text) => match PackageManifest::parse(&text) {
            Ok(manifest) => (Some(manifest), true),
            Err(error) => {
                debug!(
                    target: METADATA_TARGET,
                    path = %path.display(),
                    %error,
                    "ignoring malformed manifest"
                );
                (None, true)
            }
        },
        Err(error) if error.kind() == io::ErrorKind::NotFound => (None, false),
        Err(error) => {
            debug!(
                target: METADATA_TARGET,
                path = %path.display(),
                %error,
                "manifest unreadable"
            );
            (None, path.is_file())
        }
    }
}

fn entry_points(dir: &Path, manifest: Option<&PackageManifest>) -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::with_capacity(3);
    let declared = manifest.and_then(PackageManifest::contained_main);
    for relative in declared.into_iter().chain(FALLBACK_ENTRY_POINTS) {
        let path = dir.join(relative);
        if !candidates.contains(&path) {
            candidates.push(path);
        }
    }
    candidates
}
