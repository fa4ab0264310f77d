//! Integration tests for the Rays bootstrap.
//!
//! These tests verify, against the fixture tree in `tests/fixtures`:
//! - Application attach and search path extension
//! - `system.`, `application.` and wildcard imports with `SourceLoader`
//! - Class resolution precedence (explicit map > framework > application)
//! - Module loading and its failure message
//! - Configuration loading with framework defaults
//! - Process termination on a second or empty attach

use rays::application::{AppConfig, Application};
use rays::bootstrap::{
    Framework, FrameworkConfig, ImportOutcome, LoadError, ModuleOutcome, Resolution,
    SourceLoader,
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Get the path to the test fixtures directory
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn app_dir() -> PathBuf {
    fixtures_dir().join("app")
}

fn framework() -> Framework {
    Framework::new(
        FrameworkConfig::new(fixtures_dir().join("rays")),
        SourceLoader::new(),
    )
}

fn fixture_app() -> Application {
    let config = AppConfig::load(&app_dir().join("app.toml"))
        .expect("fixture config should load")
        .rebase(&app_dir());
    Application::new(config)
}

fn attached() -> Framework {
    let mut framework = framework();
    framework
        .try_attach(fixture_app())
        .expect("first attach should succeed");
    framework
}

fn load_count(framework: &Framework, path: &Path) -> usize {
    framework
        .symbols()
        .loaded_files()
        .iter()
        .filter(|file| file.as_path() == path)
        .count()
}

// ============================================================
// Attach
// ============================================================

#[test]
fn test_attach_appends_application_dirs_last() {
    let framework = attached();
    let dirs: Vec<PathBuf> = framework.search_paths().iter().map(Path::to_path_buf).collect();

    assert_eq!(dirs.len(), 6);
    assert_eq!(dirs[0], fixtures_dir().join("rays"));
    assert_eq!(dirs[1], fixtures_dir().join("rays/base"));
    assert_eq!(dirs[2], fixtures_dir().join("rays/helpers"));
    assert_eq!(dirs[3], app_dir().join("controllers"));
    assert_eq!(dirs[4], app_dir().join("models"));
    assert_eq!(dirs[5], app_dir().join("modules"));
}

#[test]
fn test_attach_twice_fails_regardless_of_context() {
    let mut framework = attached();

    let mut other = AppConfig::default();
    other.base_dir = PathBuf::from("/somewhere/else");
    assert!(framework.try_attach(Application::new(other)).is_err());
    assert!(framework.try_attach(fixture_app()).is_err());
    assert!(framework
        .try_attach(Application::new(AppConfig::default()))
        .is_err());

    assert_eq!(framework.search_paths().len(), 6);
    assert_eq!(framework.application().unwrap().name(), "Fixture Blog");
}

#[test]
fn test_fixture_application_settings() {
    let framework = attached();
    let app = framework.application().unwrap();

    assert_eq!(app.db_prefix(), "blog_");
    assert_eq!(app.base_url(), "http://localhost/blog");
    assert_eq!(app.exception_action(), "site/exception");
    assert_eq!(
        framework.exception_handler().exception_route(),
        Some(("site".to_string(), "exception".to_string()))
    );
}

/// Set in the child process spawned by the termination tests.
const ATTACH_CHILD: &str = "RAYS_ATTACH_CHILD";

/// Re-run one test of this binary in a child process with `ATTACH_CHILD` set.
fn run_attach_child(test_name: &str) -> std::process::Output {
    Command::new(env::current_exe().expect("test binary path"))
        .args([test_name, "--exact", "--nocapture", "--test-threads=1"])
        .env(ATTACH_CHILD, "1")
        .output()
        .expect("child test process should start")
}

#[test]
fn test_attach_twice_exits_with_status_one() {
    if env::var_os(ATTACH_CHILD).is_some() {
        let mut framework = framework();
        framework.attach(fixture_app());
        framework.attach(fixture_app());
        panic!("second attach returned");
    }

    let output = run_attach_child("test_attach_twice_exits_with_status_one");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr);
    assert!(stderr.contains("Fatal configuration error"));
    assert!(stderr.contains("already attached"));
}

#[test]
fn test_attach_empty_application_exits_with_status_one() {
    if env::var_os(ATTACH_CHILD).is_some() {
        framework().attach(Application::new(AppConfig::default()));
        panic!("empty attach returned");
    }

    let output = run_attach_child("test_attach_empty_application_exits_with_status_one");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr);
    assert!(stderr.contains("Fatal configuration error"));
    assert!(stderr.contains("no base directory"));
}

// ============================================================
// Imports
// ============================================================

#[test]
fn test_system_import_strips_scope() {
    let mut framework = framework();
    let outcome = framework.import("system.base.RException").unwrap();

    assert_eq!(
        outcome,
        ImportOutcome::Loaded(vec![fixtures_dir().join("rays/base/RException.php")])
    );
    assert!(framework.imports().contains("base/RException"));
    assert!(framework.is_defined("RException"));
}

#[test]
fn test_application_import_is_idempotent() {
    let mut framework = attached();
    let user = app_dir().join("models/User.php");

    framework.import("application.models.User").unwrap();
    framework.import("application.models.User").unwrap();
    framework.import("application.models.Post").unwrap();
    framework.import("application.models.User").unwrap();

    assert_eq!(load_count(&framework, &user), 1);
    assert_eq!(framework.symbols().origin("User"), Some(user.as_path()));
}

#[test]
fn test_wildcard_import_loads_direct_unit_files() {
    let mut framework = attached();
    let outcome = framework.import("application.helpers.*").unwrap();

    assert_eq!(
        outcome,
        ImportOutcome::Loaded(vec![
            app_dir().join("helpers/form.php"),
            app_dir().join("helpers/html.php"),
        ])
    );
    assert!(framework.imports().contains("helpers/form"));
    assert!(framework.imports().contains("helpers/html"));
    assert!(!framework.is_defined("Menu"));
    assert!(!framework.is_defined("README"));
}

#[test]
fn test_configured_imports() {
    let mut framework = attached();
    framework.import_configured().unwrap();

    assert!(framework.imports().contains("helpers/html"));
    assert_eq!(
        framework.import("application.helpers.html").unwrap(),
        ImportOutcome::Cached
    );
}

#[test]
fn test_missing_imports_are_silent() {
    let mut framework = attached();

    assert_eq!(
        framework.import("application.models.Comment").unwrap(),
        ImportOutcome::Missed
    );
    assert_eq!(
        framework.import("system.extensions.*").unwrap(),
        ImportOutcome::Missed
    );
    assert!(framework.symbols().loaded_files().is_empty());
}

// ============================================================
// Class resolution
// ============================================================

#[test]
fn test_resolve_controller_from_application_dir() {
    let mut framework = attached();
    let site = app_dir().join("controllers/SiteController.php");

    assert_eq!(
        framework.resolve_class("SiteController").unwrap(),
        Resolution::Loaded(site)
    );
    assert_eq!(
        framework.resolve_class("SiteController").unwrap(),
        Resolution::AlreadyDefined
    );
}

#[test]
fn test_framework_class_shadows_application_class() {
    let mut framework = attached();

    framework.require_class("RController").unwrap();
    assert_eq!(
        framework.symbols().origin("RController"),
        Some(fixtures_dir().join("rays/base/RController.php").as_path())
    );
    assert_eq!(
        load_count(&framework, &app_dir().join("controllers/RController.php")),
        0
    );
}

#[test]
fn test_configured_class_map() {
    let mut framework = attached();
    let mailer = app_dir().join("vendor/Mailer.php");

    assert_eq!(
        framework.resolve_class("Mailer").unwrap(),
        Resolution::Loaded(mailer)
    );
    assert!(framework.is_defined("Mailer"));
}

#[test]
fn test_explicit_map_beats_search_path() {
    let mut framework = attached();
    let mapped = app_dir().join("controllers/RController.php");
    framework.map_class("RController", &mapped);

    framework.require_class("RController").unwrap();
    assert_eq!(framework.symbols().origin("RController"), Some(mapped.as_path()));
}

#[test]
fn test_helper_file_does_not_define_class_named_after_it() {
    let dir = tempfile::tempdir().unwrap();
    let app = dir.path().join("app");
    fs::create_dir_all(app.join("helpers")).unwrap();
    fs::create_dir_all(app.join("models")).unwrap();
    fs::write(
        app.join("helpers/User.php"),
        "<?php\nfunction user_link($id) { return \"/user/$id\"; }\n",
    )
    .unwrap();
    let model = app.join("models/User.php");
    fs::write(&model, "<?php\nclass User extends RModel {}\n").unwrap();

    let mut framework = framework();
    framework
        .try_attach(Application::new(AppConfig {
            base_dir: app.clone(),
            ..AppConfig::default()
        }))
        .unwrap();

    framework.import("application.helpers.User").unwrap();
    assert!(!framework.is_defined("User"));

    assert_eq!(
        framework.resolve_class("User").unwrap(),
        Resolution::Loaded(model.clone())
    );
    framework.require_class("User").unwrap();
    assert_eq!(framework.symbols().origin("User"), Some(model.as_path()));
}

#[test]
fn test_helper_only_class_still_undefined_on_require() {
    let dir = tempfile::tempdir().unwrap();
    let app = dir.path().join("app");
    fs::create_dir_all(app.join("helpers")).unwrap();
    fs::write(app.join("helpers/Menu.php"), "<?php\nfunction menu() {}\n").unwrap();

    let mut framework = framework();
    framework
        .try_attach(Application::new(AppConfig {
            base_dir: app,
            ..AppConfig::default()
        }))
        .unwrap();

    framework.import("application.helpers.Menu").unwrap();
    assert_eq!(
        framework.require_class("Menu").unwrap_err(),
        LoadError::UndefinedSymbol("Menu".to_string())
    );
}

#[test]
fn test_undefined_class_surfaces_on_require() {
    let mut framework = attached();

    assert_eq!(
        framework.resolve_class("CommentController").unwrap(),
        Resolution::Missed
    );
    let err = framework.require_class("CommentController").unwrap_err();
    assert_eq!(err, LoadError::UndefinedSymbol("CommentController".to_string()));
}

// ============================================================
// Modules
// ============================================================

#[test]
fn test_load_module() {
    let mut framework = attached();

    assert_eq!(
        framework.load_module("blog").unwrap(),
        ModuleOutcome::Loaded(app_dir().join("modules/blog/blog.php"))
    );
    assert!(framework.is_defined("BlogModule"));
    assert_eq!(
        framework.load_module("blog").unwrap(),
        ModuleOutcome::AlreadyLoaded
    );
}

#[test]
fn test_load_missing_module_names_id_and_path() {
    let mut framework = attached();
    let err = framework.load_module("forum").unwrap_err();
    let expected = app_dir().join("modules/forum/forum.php");

    match &err {
        LoadError::ModuleNotFound { module_id, path } => {
            assert_eq!(module_id, "forum");
            assert_eq!(path, &expected);
        }
        other => panic!("expected ModuleNotFound, got {:?}", other),
    }
    let message = err.to_string();
    assert!(message.contains("forum"));
    assert!(message.contains(&expected.display().to_string()));
}

// ============================================================
// Configuration layering and throwaway trees
// ============================================================

#[test]
fn test_layered_config_boots_application() {
    let dir = tempfile::tempdir().unwrap();
    let defaults = dir.path().join("defaults.toml");
    let config = dir.path().join("app.toml");
    fs::write(&defaults, "time_zone = \"UTC\"\nmodel_dir = \"domain\"\n").unwrap();
    fs::write(&config, "name = \"Shop\"\nbase_dir = \"shop\"\n").unwrap();
    fs::create_dir_all(dir.path().join("shop/domain")).unwrap();
    fs::write(
        dir.path().join("shop/domain/Order.php"),
        "<?php\nclass Order {}\nclass OrderLine {}\n",
    )
    .unwrap();

    let app_config = AppConfig::load_layered(Some(defaults.as_path()), &config)
        .unwrap()
        .rebase(dir.path());
    assert_eq!(app_config.time_zone, "UTC");

    let mut framework = framework();
    framework.try_attach(Application::new(app_config)).unwrap();

    framework.require_class("Order").unwrap();
    assert!(framework.is_defined("OrderLine"));
    assert_eq!(
        framework.resolve_class("OrderLine").unwrap(),
        Resolution::AlreadyDefined
    );
}
