//! Version-control state of a single plugin directory.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::process::{CommandOutput, CommandRunner};
use crate::settings::EngineSettings;

const INSPECT_TARGET: &str = "trellis_plugins::inspect";

/// Drift-relevant facts about one plugin checkout.
///
/// Both drift flags are `false` and `remote_origin` is `None` whenever
/// `is_version_controlled` is `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryState {
    /// The directory carries a `.git` directory.
    pub is_version_controlled: bool,
    /// URL of the `origin` remote, when configured.
    pub remote_origin: Option<String>,
    /// Tracked or untracked changes are present.
    pub has_local_modifications: bool,
    /// The remote-tracked branch has commits missing locally.
    pub is_behind_remote: bool,
}

/// Returns `true` when `dir/.git` exists and is a directory.
///
/// A `.git` file (worktree or submodule pointer) does not count.
#[must_use]
pub fn is_git_checkout(dir: &Path) -> bool {
    dir.join(".git").is_dir()
}

/// Derives [`RepositoryState`] by running read-mostly git commands.
///
/// The only command with a side effect is the optional `git fetch origin`,
/// which refreshes remote-tracking refs. Every failure degrades to the
/// conservative value for that field; inspection itself never fails.
#[derive(Debug)]
pub struct RepositoryInspector<'a, R> {
    runner: &'a R,
    settings: &'a EngineSettings,
}

impl<'a, R: CommandRunner> RepositoryInspector<'a, R> {
    /// Creates an inspector that runs git through `runner`.
    #[must_use]
    pub const fn new(runner: &'a R, settings: &'a EngineSettings) -> Self {
        Self { runner, settings }
    }

    /// Inspects `dir`.
    ///
    /// Directories without `.git/` return the default state without
    /// spawning anything.
    pub fn inspect(&self, dir: &Path) -> RepositoryState {
        if !is_git_checkout(dir) {
            return RepositoryState::default();
        }

        let remote_origin = self
            .git(dir, &["remote", "get-url", "origin"])
            .non_empty_stdout()
            .map(str::to_owned);
        let has_local_modifications = self
            .git(dir, &["status", "--porcelain"])
            .non_empty_stdout()
            .is_some();

        if self.settings.fetch_remote && remote_origin.is_some() {
            let fetched = self.git(dir, &["fetch", "origin"]);
            if !fetched.succeeded() {
                warn!(
                    target: INSPECT_TARGET,
                    dir = %dir.display(),
                    error = %fetched.diagnostic(),
                    "fetch failed; drift uses stale tracking data"
                );
            }
        }

        let is_behind_remote = self.commits_behind(dir).is_some_and(|count| count > 0);
        debug!(
            target: INSPECT_TARGET,
            dir = %dir.display(),
            has_local_modifications,
            is_behind_remote,
            "inspected checkout"
        );

        RepositoryState {
            is_version_controlled: true,
            remote_origin,
            has_local_modifications,
            is_behind_remote,
        }
    }

    /// Counts commits on the remote-tracked branch missing from `HEAD`.
    fn commits_behind(&self, dir: &Path) -> Option<u64> {
        ["HEAD..origin/HEAD", "HEAD..@{upstream}"]
            .into_iter()
            .find_map(|range| {
                self.git(dir, &["rev-list", "--count", range])
                    .non_empty_stdout()
                    .and_then(|count| count.parse().ok())
            })
    }

    fn git(&self, dir: &Path, args: &[&str]) -> CommandOutput {
        self.runner
            .run(&self.settings.git(args.iter().copied()), dir)
    }
}
