//! Install, update, delete and dependency materialisation.
//!
//! Every operation returns an [`OperationOutcome`]; none panics or returns
//! `Err`. Operations on the same directory name are serialised through the
//! manager's [`DirectoryLocks`](crate::locks::DirectoryLocks), and every
//! caller-supplied name is validated before anything touches the disk.

mod classify;
mod naming;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::ErrorKind;
use crate::inspect::is_git_checkout;
use crate::manager::PluginManager;
use crate::metadata::{DescriptorLoader, MANIFEST_FILE, has_manifest};
use crate::outcome::OperationOutcome;
use crate::process::CommandRunner;

use self::classify::classify_pull_failure;
use self::naming::derive_directory_name;

const LIFECYCLE_TARGET: &str = "trellis_plugins::lifecycle";

impl<R: CommandRunner, D: DescriptorLoader> PluginManager<R, D> {
    /// Clones the repository at `locator` into a new plugin directory.
    ///
    /// The directory name is the locator's final path segment without its
    /// `.git` suffix. An existing entry of that name is never overwritten,
    /// and the manager's own name and reserved names are refused.
    /// On success the outcome names the directory and reports whether the
    /// clone carries a dependency manifest.
    pub fn install(&self, locator: &str) -> OperationOutcome {
        let name = match derive_directory_name(locator) {
            Ok(name) => name,
            Err(error) => {
                return OperationOutcome::failure(
                    ErrorKind::InvalidTarget,
                    "a repository locator naming a plugin directory is required",
                )
                .with_details(error.to_string());
            }
        };
        if let Err(outcome) = self.check_installable(&name) {
            return outcome;
        }
        let _lease = self.locks().acquire(&name);
        let target = self.layout().root().join(&name);
        if target.symlink_metadata().is_ok() {
            return OperationOutcome::failure(
                ErrorKind::AlreadyExists,
                format!("plugin directory '{name}' already exists"),
            )
            .with_directory(name);
        }
        if let Err(error) = fs::create_dir_all(self.layout().root()) {
            return OperationOutcome::failure(
                ErrorKind::PermissionOrIoFailure,
                "failed to prepare the plugins directory",
            )
            .with_details(error.to_string());
        }

        info!(target: LIFECYCLE_TARGET, plugin = %name, %locator, "cloning plugin");
        let command = self
            .settings()
            .git(["clone", "--", locator.trim(), name.as_str()]);
        let output = self.runner().run(&command, self.layout().root());
        if !output.succeeded() {
            discard_partial_clone(&target);
            return OperationOutcome::failure(ErrorKind::CloneFailed, "failed to clone repository")
                .with_details(output.diagnostic());
        }

        let needs_install = has_manifest(&target);
        info!(target: LIFECYCLE_TARGET, plugin = %name, needs_install, "plugin installed");
        OperationOutcome::success(format!("plugin '{name}' installed"))
            .with_directory(name)
            .with_dependency_install(needs_install)
    }

    /// Pulls upstream changes into the plugin checkout `name`.
    ///
    /// Conflicts and blocking local edits are classified, never resolved.
    /// On success the outcome reports whether the pull changed the
    /// dependency manifest.
    pub fn update(&self, name: &str) -> OperationOutcome {
        let dir = match self.plugin_target(name) {
            Ok(dir) => dir,
            Err(outcome) => return outcome,
        };
        let _lease = self.locks().acquire(name);
        if !dir.is_dir() {
            return not_found(name);
        }
        if !is_git_checkout(&dir) {
            return OperationOutcome::failure(
                ErrorKind::NotARepository,
                format!("plugin '{name}' is not a git repository"),
            );
        }

        let previous_head = self
            .runner()
            .run(&self.settings().git(["rev-parse", "HEAD"]), &dir)
            .non_empty_stdout()
            .map(str::to_owned);

        info!(target: LIFECYCLE_TARGET, plugin = %name, "pulling plugin");
        let output = self.runner().run(&self.settings().git(["pull"]), &dir);
        if !output.succeeded() {
            let kind = classify_pull_failure(&output.combined());
            warn!(target: LIFECYCLE_TARGET, plugin = %name, error_kind = %kind, "update failed");
            return OperationOutcome::failure(kind, update_failure_message(kind))
                .with_details(output.diagnostic());
        }

        let manifest_changed = previous_head
            .is_some_and(|head| self.manifest_changed_since(&dir, &head));
        OperationOutcome::success(format!("plugin '{name}' updated"))
            .with_dependency_install(manifest_changed)
    }

    /// Removes the plugin directory `name` and everything in it.
    ///
    /// The manager's own directory is refused before anything else is
    /// checked, whether or not it exists.
    pub fn delete(&self, name: &str) -> OperationOutcome {
        if name == self.layout().manager_id() {
            warn!(target: LIFECYCLE_TARGET, plugin = %name, "refusing to delete the manager");
            return OperationOutcome::failure(
                ErrorKind::SelfTargetForbidden,
                "the plugin manager cannot delete itself",
            );
        }
        let dir = match self.plugin_target(name) {
            Ok(dir) => dir,
            Err(outcome) => return outcome,
        };
        let _lease = self.locks().acquire(name);
        if !dir.is_dir() {
            return not_found(name);
        }

        match fs::remove_dir_all(&dir) {
            Ok(()) => {
                info!(target: LIFECYCLE_TARGET, plugin = %name, "plugin deleted");
                OperationOutcome::success(format!("plugin '{name}' deleted"))
            }
            Err(error) => {
                warn!(target: LIFECYCLE_TARGET, plugin = %name, %error, "delete failed");
                OperationOutcome::failure(
                    ErrorKind::PermissionOrIoFailure,
                    format!("failed to delete plugin '{name}'"),
                )
                .with_details(error.to_string())
            }
        }
    }

    /// Runs the dependency installer inside the plugin directory `name`.
    pub fn materialise_dependencies(&self, name: &str) -> OperationOutcome {
        let dir = match self.plugin_target(name) {
            Ok(dir) => dir,
            Err(outcome) => return outcome,
        };
        let _lease = self.locks().acquire(name);
        if !dir.is_dir() {
            return not_found(name);
        }
        if !has_manifest(&dir) {
            return OperationOutcome::failure(
                ErrorKind::NoManifest,
                format!("plugin '{name}' has no {MANIFEST_FILE}; nothing to install"),
            );
        }

        info!(target: LIFECYCLE_TARGET, plugin = %name, "installing dependencies");
        let output = self.runner().run(&self.settings().npm_install(), &dir);
        if output.succeeded() {
            OperationOutcome::success(format!("dependencies for '{name}' installed"))
        } else {
            OperationOutcome::failure(
                ErrorKind::DependencyInstallFailed,
                format!("failed to install dependencies for '{name}'"),
            )
            .with_details(output.diagnostic())
        }
    }

    /// Refuses names the catalog hides.
    fn check_installable(&self, name: &str) -> Result<(), OperationOutcome> {
        if name == self.layout().manager_id() {
            warn!(target: LIFECYCLE_TARGET, plugin = %name, "refusing to install over the manager");
            return Err(OperationOutcome::failure(
                ErrorKind::SelfTargetForbidden,
                "a plugin cannot be installed under the plugin manager's own name",
            )
            .with_directory(name));
        }
        if self.layout().is_excluded(name) {
            return Err(OperationOutcome::failure(
                ErrorKind::InvalidTarget,
                format!("'{name}' is a reserved directory name"),
            )
            .with_directory(name));
        }
        Ok(())
    }

    fn plugin_target(&self, name: &str) -> Result<PathBuf, OperationOutcome> {
        self.layout().plugin_dir(name).map_err(|error| {
            OperationOutcome::failure(ErrorKind::InvalidTarget, "invalid plugin directory name")
                .with_details(error.to_string())
        })
    }

    fn manifest_changed_since(&self, dir: &Path, previous_head: &str) -> bool {
        let command = self.settings().git([
            "diff",
            "--name-only",
            previous_head,
            "HEAD",
            "--",
            MANIFEST_FILE,
        ]);
        self.runner()
            .run(&command, dir)
            .non_empty_stdout()
            .is_some()
    }
}

fn not_found(name: &str) -> OperationOutcome {
    OperationOutcome::failure(ErrorKind::NotFound, format!("plugin '{name}' not found"))
}

const fn update_failure_message(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::MergeConflict => "update stopped on a merge conflict; resolve it manually",
        ErrorKind::LocalChangesBlocking => {
            "update blocked by uncommitted local changes; commit or stash them first"
        }
        _ => "update failed",
    }
}

/// Removes whatever a failed or killed clone left behind.
fn discard_partial_clone(target: &Path) {
    if !target.is_dir() {
        return;
    }
    if let Err(error) = fs::remove_dir_all(target) {
        warn!(
            target: LIFECYCLE_TARGET,
            path = %target.display(),
            %error,
            "failed to remove partial clone"
        );
    }
}

#[cfg(test)]
mod tests;
