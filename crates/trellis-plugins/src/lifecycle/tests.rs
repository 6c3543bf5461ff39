//! Unit tests for lifecycle operations against scripted runners.

use std::fs;
use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use rstest::{fixture, rstest};
use tempfile::TempDir;

use crate::error::ErrorKind;
use crate::layout::PluginLayout;
use crate::manager::PluginManager;
use crate::process::{CommandLine, CommandRunner};
use crate::settings::EngineSettings;
use crate::tests::{MockRunner, ScriptedRunner};

#[fixture]
fn plugins() -> TempDir {
    tempfile::tempdir().expect("temp dir")
}

fn manager<R: CommandRunner>(root: &Path, runner: R) -> PluginManager<R> {
    PluginManager::new(
        PluginLayout::new(root, "plugin-manager"),
        EngineSettings::default(),
        runner,
    )
}

fn silent_runner() -> MockRunner {
    let mut runner = MockRunner::new();
    runner.expect_run().never();
    runner
}

fn checkout(root: &Path, name: &str) {
    fs::create_dir_all(root.join(name).join(".git")).expect("create checkout");
}

/// Mimics `git clone -- <locator> <name>` by creating `<name>/`.
fn fake_clone(with_manifest: bool) -> impl Fn(&CommandLine, &Path) + Send + Sync + 'static {
    move |command, working_dir| {
        let name = command.arguments().last().expect("clone target");
        let dir = working_dir.join(name);
        fs::create_dir_all(dir.join(".git")).expect("create clone");
        if with_manifest {
            fs::write(dir.join("package.json"), "{}").expect("write manifest");
        }
    }
}

#[rstest]
fn install_clones_into_derived_directory(plugins: TempDir) {
    let runner = ScriptedRunner::new().on_with(&["clone"], "", fake_clone(true));
    let manager = manager(plugins.path(), &runner);

    let outcome = manager.install("https://example.com/group/sample-plugin.git");

    assert!(outcome.succeeded, "{outcome:?}");
    assert_eq!(outcome.directory_name.as_deref(), Some("sample-plugin"));
    assert_eq!(outcome.needs_dependency_install, Some(true));
    let calls = runner.calls();
    let (command, working_dir) = calls.first().expect("clone call");
    assert_eq!(
        command.arguments(),
        ["clone", "--", "https://example.com/group/sample-plugin.git", "sample-plugin"]
    );
    assert_eq!(working_dir, plugins.path());
}

#[rstest]
fn install_without_manifest_needs_no_dependencies(plugins: TempDir) {
    let runner = ScriptedRunner::new().on_with(&["clone"], "", fake_clone(false));

    let outcome = manager(plugins.path(), &runner).install("git@example.com:tool.git");

    assert!(outcome.succeeded);
    assert_eq!(outcome.needs_dependency_install, Some(false));
}

#[rstest]
fn install_refuses_existing_directory(plugins: TempDir) {
    fs::create_dir(plugins.path().join("sample")).expect("create existing");
    fs::write(plugins.path().join("sample/keep.txt"), "mine").expect("write file");

    let outcome = manager(plugins.path(), silent_runner()).install("https://example.com/sample");

    assert_eq!(outcome.error_kind, Some(ErrorKind::AlreadyExists));
    assert_eq!(
        fs::read_to_string(plugins.path().join("sample/keep.txt")).expect("read file"),
        "mine"
    );
}

#[rstest]
#[case::blank("   ")]
#[case::dots("https://example.com/..")]
fn install_rejects_unusable_locators(plugins: TempDir, #[case] locator: &str) {
    let outcome = manager(plugins.path(), silent_runner()).install(locator);
    assert_eq!(outcome.error_kind, Some(ErrorKind::InvalidTarget));
}

#[rstest]
#[case::manager("https://example.com/plugin-manager.git", ErrorKind::SelfTargetForbidden)]
#[case::built_in_reserved("https://example.com/node_modules.git", ErrorKind::InvalidTarget)]
#[case::configured_reserved("git@example.com:team/vendor.git", ErrorKind::InvalidTarget)]
fn install_refuses_names_hidden_from_the_catalog(
    plugins: TempDir,
    #[case] locator: &str,
    #[case] expected: ErrorKind,
) {
    let runner = ScriptedRunner::new().on_with(&["clone"], "", fake_clone(false));
    let manager = PluginManager::new(
        PluginLayout::new(plugins.path(), "plugin-manager").with_reserved(["vendor"]),
        EngineSettings::default(),
        &runner,
    );

    let outcome = manager.install(locator);

    assert_eq!(outcome.error_kind, Some(expected));
    assert!(runner.calls().is_empty(), "no clone should run");
    let leftovers = fs::read_dir(plugins.path()).expect("read plugins").count();
    assert_eq!(leftovers, 0);
    assert!(manager.list_plugins().expect("list plugins").is_empty());
}

#[rstest]
fn failed_clone_reports_diagnostic_and_cleans_up(plugins: TempDir) {
    let runner = ScriptedRunner::new().fail(&["clone"], "fatal: repository not found");

    let outcome = manager(plugins.path(), &runner).install("https://example.com/missing.git");

    assert_eq!(outcome.error_kind, Some(ErrorKind::CloneFailed));
    assert_eq!(outcome.details.as_deref(), Some("fatal: repository not found"));
    assert!(!plugins.path().join("missing").exists());
}

#[rstest]
fn update_of_missing_directory_is_not_found(plugins: TempDir) {
    let outcome = manager(plugins.path(), silent_runner()).update("ghost");
    assert_eq!(outcome.error_kind, Some(ErrorKind::NotFound));
}

#[rstest]
fn update_of_plain_directory_spawns_nothing(plugins: TempDir) {
    fs::create_dir(plugins.path().join("loose")).expect("create dir");

    let outcome = manager(plugins.path(), silent_runner()).update("loose");

    assert_eq!(outcome.error_kind, Some(ErrorKind::NotARepository));
}

#[rstest]
#[case::conflict(
    "CONFLICT (content): Merge conflict in index.js",
    ErrorKind::MergeConflict
)]
#[case::local_changes(
    "error: Your local changes to the following files would be overwritten by merge:",
    ErrorKind::LocalChangesBlocking
)]
#[case::network("fatal: Could not read from remote repository.", ErrorKind::SyncFailed)]
fn failed_pull_is_classified(
    plugins: TempDir,
    #[case] stderr: &str,
    #[case] expected: ErrorKind,
) {
    checkout(plugins.path(), "sample");
    let runner = ScriptedRunner::new()
        .on(&["rev-parse", "HEAD"], "abc123\n")
        .fail(&["pull"], stderr);

    let outcome = manager(plugins.path(), &runner).update("sample");

    assert_eq!(outcome.error_kind, Some(expected));
    assert_eq!(outcome.details.as_deref(), Some(stderr));
    assert!(!runner.was_called(&["diff"]));
}

#[rstest]
#[case::manifest_changed("package.json\n", true)]
#[case::manifest_untouched("", false)]
fn successful_pull_reports_manifest_changes(
    plugins: TempDir,
    #[case] diff: &str,
    #[case] expected: bool,
) {
    checkout(plugins.path(), "sample");
    let runner = ScriptedRunner::new()
        .on(&["rev-parse", "HEAD"], "abc123\n")
        .on(&["pull"], "Updating abc123..def456\n")
        .on(&["diff", "--name-only", "abc123", "HEAD", "--", "package.json"], diff);

    let outcome = manager(plugins.path(), &runner).update("sample");

    assert!(outcome.succeeded);
    assert_eq!(outcome.needs_dependency_install, Some(expected));
}

#[rstest]
fn unknown_previous_head_still_updates(plugins: TempDir) {
    checkout(plugins.path(), "sample");
    let runner = ScriptedRunner::new()
        .fail(&["rev-parse"], "fatal: ambiguous argument 'HEAD'")
        .on(&["pull"], "");

    let outcome = manager(plugins.path(), &runner).update("sample");

    assert!(outcome.succeeded);
    assert_eq!(outcome.needs_dependency_install, Some(false));
}

#[rstest]
#[case::present(true)]
#[case::absent(false)]
fn deleting_the_manager_is_always_forbidden(plugins: TempDir, #[case] present: bool) {
    if present {
        fs::create_dir(plugins.path().join("plugin-manager")).expect("create manager dir");
    }

    let outcome = manager(plugins.path(), silent_runner()).delete("plugin-manager");

    assert_eq!(outcome.error_kind, Some(ErrorKind::SelfTargetForbidden));
    assert_eq!(plugins.path().join("plugin-manager").exists(), present);
}

#[rstest]
fn delete_removes_the_directory_tree(plugins: TempDir) {
    checkout(plugins.path(), "sample");
    fs::write(plugins.path().join("sample/index.js"), "").expect("write file");

    let outcome = manager(plugins.path(), silent_runner()).delete("sample");

    assert!(outcome.succeeded);
    assert!(!plugins.path().join("sample").exists());
}

#[rstest]
fn delete_waits_for_an_in_flight_operation_on_the_same_name(plugins: TempDir) {
    checkout(plugins.path(), "sample");
    let runner = ScriptedRunner::new();
    let manager = manager(plugins.path(), &runner);
    let lease = manager.locks().acquire("sample");

    thread::scope(|scope| {
        let (sender, receiver) = mpsc::channel();
        let manager = &manager;
        scope.spawn(move || {
            drop(sender.send(manager.delete("sample")));
        });

        assert!(
            receiver.recv_timeout(Duration::from_millis(200)).is_err(),
            "delete must block while the lease is held"
        );
        assert!(plugins.path().join("sample").is_dir());

        drop(lease);
        let outcome = receiver
            .recv_timeout(Duration::from_secs(5))
            .expect("delete should finish once the lease is released");
        assert!(outcome.succeeded, "{outcome:?}");
    });

    assert!(!plugins.path().join("sample").exists());
    assert!(!manager.locks().is_held("sample"));
}

#[rstest]
#[case::missing("ghost", ErrorKind::NotFound)]
#[case::traversal("..", ErrorKind::InvalidTarget)]
#[case::nested("a/b", ErrorKind::InvalidTarget)]
fn delete_validates_its_target(plugins: TempDir, #[case] name: &str, #[case] expected: ErrorKind) {
    let outcome = manager(plugins.path(), silent_runner()).delete(name);
    assert_eq!(outcome.error_kind, Some(expected));
}

#[rstest]
fn dependencies_need_a_manifest(plugins: TempDir) {
    checkout(plugins.path(), "sample");

    let outcome = manager(plugins.path(), silent_runner()).materialise_dependencies("sample");

    assert_eq!(outcome.error_kind, Some(ErrorKind::NoManifest));
}

#[rstest]
fn dependencies_install_in_the_plugin_directory(plugins: TempDir) {
    checkout(plugins.path(), "sample");
    fs::write(plugins.path().join("sample/package.json"), "{}").expect("write manifest");
    let runner = ScriptedRunner::new().on(&["install"], "added 3 packages\n");

    let outcome = manager(plugins.path(), &runner).materialise_dependencies("sample");

    assert!(outcome.succeeded);
    let calls = runner.calls();
    let (command, working_dir) = calls.first().expect("npm call");
    assert_eq!(command.to_string(), "npm install");
    assert_eq!(working_dir, &plugins.path().join("sample"));
}

#[rstest]
fn failed_dependency_install_carries_diagnostic(plugins: TempDir) {
    checkout(plugins.path(), "sample");
    fs::write(plugins.path().join("sample/package.json"), "{}").expect("write manifest");
    let runner = ScriptedRunner::new().fail(&["install"], "npm ERR! code E404");

    let outcome = manager(plugins.path(), &runner).materialise_dependencies("sample");

    assert_eq!(outcome.error_kind, Some(ErrorKind::DependencyInstallFailed));
    assert_eq!(outcome.details.as_deref(), Some("npm ERR! code E404"));
}
