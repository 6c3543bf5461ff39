//! Domain errors and the failure taxonomy reported by lifecycle operations.
//!
//! [`ErrorKind`] is the operator-facing classification carried by every
//! failed [`OperationOutcome`](crate::OperationOutcome). The remaining types
//! are internal `thiserror` enums describing why a lower layer failed. I/O
//! errors are wrapped in `Arc` so failures stay cloneable and `Send + Sync`.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a failed lifecycle operation.
///
/// Every kind is recoverable by the operator, never by the engine: there is
/// no automatic retry and no automatic conflict resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Install target directory is already present.
    AlreadyExists,
    /// The named plugin directory does not exist.
    NotFound,
    /// The plugin directory is not a git checkout.
    NotARepository,
    /// Synchronisation stopped on conflicting changes.
    MergeConflict,
    /// Synchronisation would overwrite uncommitted local edits.
    LocalChangesBlocking,
    /// Synchronisation failed for any other reason (network, timeout, ...).
    SyncFailed,
    /// The plugin has no dependency manifest.
    NoManifest,
    /// A filesystem operation was refused or failed.
    PermissionOrIoFailure,
    /// The operation targeted the manager's own directory.
    SelfTargetForbidden,
    /// The supplied locator or directory name cannot name a plugin directory.
    InvalidTarget,
    /// Cloning the remote repository failed.
    CloneFailed,
    /// The dependency installer failed.
    DependencyInstallFailed,
}

impl ErrorKind {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AlreadyExists => "already_exists",
            Self::NotFound => "not_found",
            Self::NotARepository => "not_a_repository",
            Self::MergeConflict => "merge_conflict",
            Self::LocalChangesBlocking => "local_changes_blocking",
            Self::SyncFailed => "sync_failed",
            Self::NoManifest => "no_manifest",
            Self::PermissionOrIoFailure => "permission_or_io_failure",
            Self::SelfTargetForbidden => "self_target_forbidden",
            Self::InvalidTarget => "invalid_target",
            Self::CloneFailed => "clone_failed",
            Self::DependencyInstallFailed => "dependency_install_failed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasons a subprocess invocation did not succeed.
#[derive(Debug, Clone, Error)]
pub enum RunFailure {
    /// The program could not be started at all.
    #[error("failed to start '{program}': {source}")]
    Spawn {
        /// Program that was invoked.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// The program ran and reported failure.
    #[error("'{program}' exited unsuccessfully ({status})")]
    NonZeroExit {
        /// Program that was invoked.
        program: String,
        /// Human-readable exit status, e.g. `exit code 1`.
        status: String,
    },

    /// The program did not finish within its time budget and was killed.
    #[error("'{program}' timed out after {timeout_secs}s")]
    TimedOut {
        /// Program that was invoked.
        program: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },

    /// The program wrote more output than the capture ceiling and was killed.
    #[error("'{program}' produced more than {limit} bytes on one stream")]
    OutputLimitExceeded {
        /// Program that was invoked.
        program: String,
        /// Configured ceiling in bytes.
        limit: usize,
    },

    /// Supervising the running program failed.
    #[error("I/O error while supervising '{program}': {source}")]
    Io {
        /// Program that was invoked.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },
}

/// A caller-supplied name that cannot address a plugin directory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    /// Nothing usable was supplied.
    #[error("plugin directory name must not be empty")]
    Empty,
    /// The name is not a single plain path component.
    #[error("'{name}' is not a plain directory name")]
    NotAComponent {
        /// Offending name.
        name: String,
    },
}

/// Errors raised while enumerating the plugins directory.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// The plugins directory itself could not be read.
    #[error("failed to read plugins directory {path}: {source}")]
    ReadDirectory {
        /// Directory that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },
}

/// Errors raised while parsing a dependency manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest is not valid JSON.
    #[error("manifest is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),
    /// The manifest parsed but is not a JSON object.
    #[error("manifest must be a JSON object")]
    NotAnObject,
}
