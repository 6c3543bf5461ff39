//! Enumerates the plugins directory into sorted [`PluginRecord`]s.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use tracing::{debug, warn};

use crate::error::CatalogError;
use crate::inspect::RepositoryInspector;
use crate::manager::PluginManager;
use crate::metadata::{DescriptorLoader, MetadataResolver};
use crate::process::CommandRunner;
use crate::record::PluginRecord;

const CATALOG_TARGET: &str = "trellis_plugins::catalog";

/// Plugins probed concurrently per batch.
const PROBE_BATCH: usize = 8;

impl<R: CommandRunner, D: DescriptorLoader> PluginManager<R, D> {
    /// Lists every managed plugin.
    ///
    /// Only subdirectories count; the manager's own directory and reserved
    /// names are skipped. Plugins are probed independently, so one broken
    /// checkout never hides the others. Records are sorted by display name
    /// (case-insensitive), then by directory name.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ReadDirectory`] when the plugins directory
    /// itself cannot be read.
    pub fn list_plugins(&self) -> Result<Vec<PluginRecord>, CatalogError> {
        let root = self.layout().root();
        let candidates = self.candidate_directories(root)?;
        debug!(target: CATALOG_TARGET, count = candidates.len(), "probing plugins");

        let mut records = Vec::with_capacity(candidates.len());
        for batch in candidates.chunks(PROBE_BATCH) {
            thread::scope(|scope| {
                let probes: Vec<_> = batch
                    .iter()
                    .map(|(name, dir)| scope.spawn(move || self.probe(name, dir)))
                    .collect();
                for probe in probes {
                    match probe.join() {
                        Ok(record) => records.push(record),
                        Err(_) => warn!(target: CATALOG_TARGET, "plugin probe panicked"),
                    }
                }
            });
        }

        records.sort_by(compare_records);
        Ok(records)
    }

    fn candidate_directories(&self, root: &Path) -> Result<Vec<(String, PathBuf)>, CatalogError> {
        let entries = fs::read_dir(root).map_err(|source| CatalogError::ReadDirectory {
            path: root.to_path_buf(),
            source: Arc::new(source),
        })?;

        let mut candidates = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    warn!(target: CATALOG_TARGET, %error, "skipping unreadable entry");
                    continue;
                }
            };
            match entry.file_type() {
                Ok(kind) if kind.is_dir() => {}
                Ok(_) => continue,
                Err(error) => {
                    warn!(
                        target: CATALOG_TARGET,
                        path = %entry.path().display(),
                        %error,
                        "skipping entry with unknown type"
                    );
                    continue;
                }
            }
            let Ok(name) = entry.file_name().into_string() else {
                warn!(
                    target: CATALOG_TARGET,
                    path = %entry.path().display(),
                    "skipping directory with a non-UTF-8 name"
                );
                continue;
            };
            if self.layout().is_excluded(&name) {
                continue;
            }
            candidates.push((name, entry.path()));
        }
        Ok(candidates)
    }

    fn probe(&self, name: &str, dir: &Path) -> PluginRecord {
        let repository = RepositoryInspector::new(self.runner(), self.settings()).inspect(dir);
        let metadata = MetadataResolver::new(self.loader()).resolve(dir);
        PluginRecord::assemble(name, repository, &metadata)
    }
}

fn compare_records(left: &PluginRecord, right: &PluginRecord) -> Ordering {
    left.display_name
        .to_lowercase()
        .cmp(&right.display_name.to_lowercase())
        .then_with(|| left.directory_name.cmp(&right.directory_name))
}
