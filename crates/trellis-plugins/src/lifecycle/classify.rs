//! Maps `git pull` diagnostics onto failure kinds.

use crate::error::ErrorKind;

/// Case-insensitive needles, checked in order. Git runs under `LC_ALL=C`,
/// so these match its English diagnostics.
const PULL_FAILURES: &[(&str, ErrorKind)] = &[
    ("merge conflict", ErrorKind::MergeConflict),
    ("automatic merge failed", ErrorKind::MergeConflict),
    ("fix conflicts", ErrorKind::MergeConflict),
    ("would be overwritten by merge", ErrorKind::LocalChangesBlocking),
    ("commit your changes or stash them", ErrorKind::LocalChangesBlocking),
];

/// Classifies the combined output of a failed pull.
///
/// Anything unrecognised, timeouts included, is [`ErrorKind::SyncFailed`].
pub(crate) fn classify_pull_failure(output: &str) -> ErrorKind {
    let lowered = output.to_lowercase();
    PULL_FAILURES
        .iter()
        .find(|(needle, _)| lowered.contains(needle))
        .map_or(ErrorKind::SyncFailed, |(_, kind)| *kind)
}
