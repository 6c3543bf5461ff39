//! The merged per-plugin snapshot returned by listings.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::inspect::RepositoryState;
use crate::metadata::ResolvedMetadata;

/// One managed plugin directory as observed at listing time.
///
/// Records are recomputed in full on every listing; nothing is cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginRecord {
    /// On-disk folder name, the identity key for every operation.
    pub directory_name: String,
    /// Self-declared identifier, defaulting to the directory name.
    pub declared_id: String,
    /// Human-readable name.
    pub display_name: String,
    /// Short description, empty when unknown.
    pub description: String,
    /// Version string, empty when unknown.
    pub version: String,
    /// The directory is a git checkout.
    pub is_version_controlled: bool,
    /// URL of the `origin` remote.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_origin: Option<String>,
    /// Uncommitted or untracked changes are present.
    pub has_local_modifications: bool,
    /// The remote has commits not present locally.
    pub is_behind_remote: bool,
    /// `package.json` exists.
    pub has_manifest: bool,
    /// Package names from `dependencies`.
    pub declared_dependencies: BTreeSet<String>,
    /// Package names from `devDependencies`.
    pub declared_dev_dependencies: BTreeSet<String>,
}

impl PluginRecord {
    /// Merges repository state and metadata into a record.
    #[must_use]
    pub fn assemble(
        directory_name: &str,
        repository: RepositoryState,
        metadata: &ResolvedMetadata,
    ) -> Self {
        let (declared_dependencies, declared_dev_dependencies) = metadata
            .manifest
            .as_ref()
            .map(|manifest| {
                (
                    manifest.dependencies.clone(),
                    manifest.dev_dependencies.clone(),
                )
            })
            .unwrap_or_default();
        let versioned = repository.is_version_controlled;

        Self {
            directory_name: directory_name.to_owned(),
            declared_id: metadata.declared_id(directory_name),
            display_name: metadata.display_name(directory_name),
            description: metadata.description(),
            version: metadata.version(),
            is_version_controlled: versioned,
            remote_origin: repository.remote_origin.filter(|_| versioned),
            has_local_modifications: versioned && repository.has_local_modifications,
            is_behind_remote: versioned && repository.is_behind_remote,
            has_manifest: metadata.manifest_present,
            declared_dependencies,
            declared_dev_dependencies,
        }
    }
}
