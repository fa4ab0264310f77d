//! Framework Bootstrap
//!
//! [`Framework`] is the context object every resolution call goes through. It
//! owns the class search path, the import cache, the explicit class map, the
//! table of defined symbols and the attached [`Application`].
//!
//! # Lifecycle
//!
//! 1. `Framework::new` registers the framework directories (root, `base`,
//!    `helpers`) and the framework's fault handler.
//! 2. `attach` stores the application exactly once and appends its controller,
//!    model and module directories to the search path.
//! 3. `import`, `resolve_class` and `load_module` load units on demand, each
//!    at most once.
//!
//! # Silent misses
//!
//! A plain import or class scan whose target does not exist loads nothing and
//! reports no error. Callers that actually need the class find out when they
//! use it; [`Framework::require_class`] is that point of use and fails with
//! [`LoadError::UndefinedSymbol`]. This keeps optional imports cheap, at the
//! cost of reporting a typo in an import far away from where it was written.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, error, info, trace, warn};

use super::cache::{ClassMap, ImportCache, SymbolTable};
use super::loader::{unit_stem, LoadError, LoadResult, Loader};
use super::naming::{module_class_name, ModuleNaming};
use super::path::{bare_class_name, translate, Scope};
use super::search_path::SearchPaths;
use crate::application::Application;
use crate::faults::{ExceptionHandler, FaultHooks};

/// Default extension of unit source files.
pub const DEFAULT_SOURCE_EXTENSION: &str = "php";

/// Default suffix of module entry files.
pub const DEFAULT_MODULE_FILE_EXTENSION: &str = ".php";

/// Framework directory holding the core classes.
pub const CORE_DIR: &str = "base";

/// Framework directory holding shared helpers.
pub const HELPERS_DIR: &str = "helpers";

/// Framework-level settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkConfig {
    /// Framework root directory (the `system` scope).
    pub root: PathBuf,
    /// Extension of unit files, without the dot.
    pub source_extension: String,
    /// Suffix of module entry files, including the dot.
    pub module_file_extension: String,
}

impl FrameworkConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            source_extension: DEFAULT_SOURCE_EXTENSION.to_string(),
            module_file_extension: DEFAULT_MODULE_FILE_EXTENSION.to_string(),
        }
    }

    pub fn with_source_extension(mut self, extension: impl Into<String>) -> Self {
        self.source_extension = extension.into();
        self
    }

    pub fn with_module_file_extension(mut self, extension: impl Into<String>) -> Self {
        self.module_file_extension = extension.into();
        self
    }

    pub fn core_dir(&self) -> PathBuf {
        self.root.join(CORE_DIR)
    }

    pub fn helpers_dir(&self) -> PathBuf {
        self.root.join(HELPERS_DIR)
    }
}

/// Violations of the single-attach rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigurationError {
    /// An application is already attached.
    AlreadyAttached,
    /// The application has no base directory.
    EmptyContext,
}

impl std::fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigurationError::AlreadyAttached => {
                write!(f, "Application not found: an application is already attached")
            }
            ConfigurationError::EmptyContext => {
                write!(f, "Application not found: the application has no base directory")
            }
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// Outcome of [`Framework::import`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// The logical name was empty.
    Skipped,
    /// The unit was imported earlier.
    Cached,
    /// Files loaded by this call. For a directory import this lists only the
    /// entries that were not imported before, and may be empty.
    Loaded(Vec<PathBuf>),
    /// The file or directory does not exist.
    Missed,
}

/// Outcome of [`Framework::resolve_class`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The class was defined by an earlier load.
    AlreadyDefined,
    /// The file was loaded by this call.
    Loaded(PathBuf),
    /// No mapping and no search directory holds the class file.
    Missed,
}

/// Outcome of [`Framework::load_module`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleOutcome {
    /// The module class was already available.
    AlreadyLoaded,
    /// The module entry file was loaded by this call.
    Loaded(PathBuf),
}

/// Levels accepted by [`Framework::log`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warning,
    Error,
}

/// Bootstrap and lazy unit resolution context.
pub struct Framework {
    config: FrameworkConfig,
    app: Option<Application>,
    search_paths: SearchPaths,
    imports: ImportCache,
    class_map: ClassMap,
    symbols: SymbolTable,
    loader: Box<dyn Loader>,
    module_naming: ModuleNaming,
    faults: Arc<FaultHooks>,
    exception_handler: Arc<ExceptionHandler>,
    started: Instant,
}

impl Framework {
    /// Create a framework rooted at `config.root`, loading units with `loader`.
    pub fn new(config: FrameworkConfig, loader: impl Loader + 'static) -> Self {
        let search_paths =
            SearchPaths::new([config.root.clone(), config.core_dir(), config.helpers_dir()]);

        let faults = Arc::new(FaultHooks::new());
        let exception_handler = Arc::new(ExceptionHandler::new());
        faults.register(exception_handler.clone());

        debug!(target: "rays::bootstrap", root = %config.root.display(), "Framework created");

        Self {
            config,
            app: None,
            search_paths,
            imports: ImportCache::new(),
            class_map: ClassMap::new(),
            symbols: SymbolTable::new(),
            loader: Box::new(loader),
            module_naming: module_class_name,
            faults,
            exception_handler,
            started: Instant::now(),
        }
    }

    /// Replace the module id -> module class naming convention.
    pub fn with_module_naming(mut self, naming: ModuleNaming) -> Self {
        self.module_naming = naming;
        self
    }

    // ============================================================
    // Application attachment
    // ============================================================

    /// Attach the application, or report why it cannot be attached.
    pub fn try_attach(&mut self, app: Application) -> Result<(), ConfigurationError> {
        if self.app.is_some() {
            return Err(ConfigurationError::AlreadyAttached);
        }
        if app.is_empty() {
            return Err(ConfigurationError::EmptyContext);
        }

        let app_dirs = [app.controller_path(), app.model_path(), app.module_path()];
        info!(
            target: "rays::bootstrap::attach",
            name = app.name(),
            base_dir = %app.base_dir().display(),
            "Application attached"
        );
        for dir in &app_dirs {
            debug!(target: "rays::bootstrap::attach", dir = %dir.display(), "Search path extended");
        }

        self.class_map.extend(app.config().class_map.clone());
        self.exception_handler
            .set_exception_action(app.exception_action());
        self.exception_handler.set_debug(app.is_debug());

        self.app = Some(app);
        self.search_paths.extend(app_dirs);
        Ok(())
    }

    /// Attach the application, terminating the process on a second attach or
    /// an empty application. A correctly configured process attaches once.
    pub fn attach(&mut self, app: Application) {
        if let Err(err) = self.try_attach(app) {
            configuration_fatal(err);
        }
    }

    pub fn is_attached(&self) -> bool {
        self.app.is_some()
    }

    pub fn application(&self) -> Option<&Application> {
        self.app.as_ref()
    }

    // ============================================================
    // Imports
    // ============================================================

    /// Import a unit or a directory of units by logical name.
    ///
    /// - `system.base.RException` loads `<root>/base/RException.<ext>`
    /// - `application.models.User` loads `<base_dir>/models/User.<ext>`
    /// - `application.helpers.*` loads every `<ext>` file directly inside
    ///   `<base_dir>/helpers`, in file name order
    ///
    /// Missing files and directories are not errors (see the module docs).
    pub fn import(&mut self, name: &str) -> LoadResult<ImportOutcome> {
        let Some(logical) = translate(name) else {
            return Ok(ImportOutcome::Skipped);
        };
        let base_dir = self.scope_dir(logical.scope(), name)?;

        if !logical.is_wildcard() {
            if self.imports.contains(logical.path()) {
                trace!(target: "rays::bootstrap::import", name, "Already imported");
                return Ok(ImportOutcome::Cached);
            }

            let path = base_dir.join(format!(
                "{}.{}",
                logical.path(),
                self.config.source_extension
            ));
            if !path.is_file() {
                trace!(target: "rays::bootstrap::import", name, path = %path.display(), "Import target missing");
                return Ok(ImportOutcome::Missed);
            }

            let loaded = self.load_file(&path)?;
            self.imports.record(logical.path(), path.clone());
            if !loaded {
                trace!(target: "rays::bootstrap::import", name, path = %path.display(), "Unit loaded by another route");
                return Ok(ImportOutcome::Cached);
            }
            return Ok(ImportOutcome::Loaded(vec![path]));
        }

        let dir = base_dir.join(logical.path());
        if !dir.is_dir() {
            trace!(target: "rays::bootstrap::import", name, dir = %dir.display(), "Import directory missing");
            return Ok(ImportOutcome::Missed);
        }

        let mut loaded = Vec::new();
        for path in self.unit_files(&dir)? {
            let Some(stem) = unit_stem(&path) else {
                continue;
            };
            let key = logical.entry_key(stem);
            if self.imports.contains(&key) {
                continue;
            }
            let fresh = self.load_file(&path)?;
            self.imports.record(key, path.clone());
            if fresh {
                loaded.push(path);
            }
        }
        Ok(ImportOutcome::Loaded(loaded))
    }

    /// Import every name in order, stopping at the first error.
    pub fn auto_imports<I, S>(&mut self, names: I) -> LoadResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.import(name.as_ref())?;
        }
        Ok(())
    }

    /// Import the names listed in the attached application's `imports`.
    pub fn import_configured(&mut self) -> LoadResult<()> {
        let names = match &self.app {
            Some(app) => app.config().imports.clone(),
            None => return Ok(()),
        };
        self.auto_imports(names)
    }

    // ============================================================
    // Class resolution
    // ============================================================

    /// Load the file defining `class`, the way an autoloader would.
    ///
    /// An explicit mapping is always used first and skips the directory scan.
    /// Otherwise the search path is scanned in order for `<Class>.<ext>` and the
    /// first hit is loaded, so framework classes shadow application classes of
    /// the same name. A scan that finds nothing loads nothing and is not an error.
    pub fn resolve_class(&mut self, class: &str) -> LoadResult<Resolution> {
        let bare = bare_class_name(class);
        if self.symbols.is_defined(bare) {
            return Ok(Resolution::AlreadyDefined);
        }

        if let Some(path) = self.class_map.get(class).map(Path::to_path_buf) {
            self.load_file(&path)?;
            return Ok(Resolution::Loaded(path));
        }

        let file_name = format!("{}.{}", bare, self.config.source_extension);
        match self.search_paths.find(&file_name) {
            Some(path) => {
                self.load_file(&path)?;
                self.class_map.insert(bare, path.clone());
                Ok(Resolution::Loaded(path))
            }
            None => {
                trace!(target: "rays::bootstrap::autoload", class, "Class file not found on search path");
                Ok(Resolution::Missed)
            }
        }
    }

    /// Resolve `class` and fail if it is still undefined afterwards.
    ///
    /// This is the point where a silently missed import or scan surfaces.
    pub fn require_class(&mut self, class: &str) -> LoadResult<()> {
        self.resolve_class(class)?;
        if self.symbols.is_defined(bare_class_name(class)) {
            Ok(())
        } else {
            Err(LoadError::UndefinedSymbol(class.to_string()))
        }
    }

    /// Map `class` explicitly to `path`, bypassing the directory scan.
    pub fn map_class(&mut self, class: impl Into<String>, path: impl Into<PathBuf>) {
        self.class_map.insert(class, path);
    }

    pub fn is_defined(&self, class: &str) -> bool {
        self.symbols.is_defined(bare_class_name(class))
    }

    // ============================================================
    // Modules
    // ============================================================

    /// Load module `module_id` from `<module_dir>/<id>/<id><module_ext>`.
    ///
    /// Nothing is loaded when the module class is already defined or can be
    /// autoloaded. Unlike plain imports, a missing entry file is an error.
    pub fn load_module(&mut self, module_id: &str) -> LoadResult<ModuleOutcome> {
        let module_dir = match &self.app {
            Some(app) => app.module_path(),
            None => return Err(LoadError::NotAttached(module_id.to_string())),
        };

        let class = (self.module_naming)(module_id);
        if self.symbols.is_defined(&class) {
            return Ok(ModuleOutcome::AlreadyLoaded);
        }
        self.resolve_class(&class)?;
        if self.symbols.is_defined(&class) {
            return Ok(ModuleOutcome::AlreadyLoaded);
        }

        let path = module_dir.join(module_id).join(format!(
            "{}{}",
            module_id, self.config.module_file_extension
        ));
        if !path.is_file() {
            warn!(target: "rays::bootstrap::module", module_id, path = %path.display(), "Module entry file not found");
            return Err(LoadError::ModuleNotFound {
                module_id: module_id.to_string(),
                path,
            });
        }

        if !self.load_file(&path)? {
            return Ok(ModuleOutcome::AlreadyLoaded);
        }
        Ok(ModuleOutcome::Loaded(path))
    }

    // ============================================================
    // Accessors
    // ============================================================

    pub fn config(&self) -> &FrameworkConfig {
        &self.config
    }

    pub fn search_paths(&self) -> &SearchPaths {
        &self.search_paths
    }

    pub fn imports(&self) -> &ImportCache {
        &self.imports
    }

    pub fn class_map(&self) -> &ClassMap {
        &self.class_map
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Fault hooks; the framework's exception handler is registered first.
    pub fn faults(&self) -> Arc<FaultHooks> {
        self.faults.clone()
    }

    pub fn exception_handler(&self) -> &ExceptionHandler {
        &self.exception_handler
    }

    /// Time since the framework was created.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Emit an application log message under `category`.
    pub fn log(&self, level: LogLevel, category: &str, message: &str) {
        match level {
            LogLevel::Trace => trace!(target: "rays::app", category, "{}", message),
            LogLevel::Debug => debug!(target: "rays::app", category, "{}", message),
            LogLevel::Info => info!(target: "rays::app", category, "{}", message),
            LogLevel::Warning => warn!(target: "rays::app", category, "{}", message),
            LogLevel::Error => error!(target: "rays::app", category, "{}", message),
        }
    }

    // ============================================================
    // Internals
    // ============================================================

    fn scope_dir(&self, scope: Scope, name: &str) -> LoadResult<PathBuf> {
        if !scope.needs_application() {
            return Ok(self.config.root.clone());
        }
        self.app
            .as_ref()
            .map(|app| app.base_dir().to_path_buf())
            .ok_or_else(|| LoadError::NotAttached(name.to_string()))
    }

    /// Unit files directly inside `dir`, sorted by file name.
    fn unit_files(&self, dir: &Path) -> LoadResult<Vec<PathBuf>> {
        let entries =
            fs::read_dir(dir).map_err(|e| LoadError::Io(dir.to_path_buf(), e.to_string()))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| LoadError::Io(dir.to_path_buf(), e.to_string()))?
                .path();
            let is_unit = path
                .extension()
                .is_some_and(|ext| ext == self.config.source_extension.as_str());
            if is_unit && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Hand `path` to the loader unless it was loaded before.
    ///
    /// Returns `false` when the file had already been loaded.
    fn load_file(&mut self, path: &Path) -> LoadResult<bool> {
        if self.symbols.is_loaded(path) {
            return Ok(false);
        }
        let unit = self.loader.load(path)?;
        debug!(
            target: "rays::bootstrap::load",
            path = %path.display(),
            symbols = ?unit.symbols,
            "Unit loaded"
        );
        self.symbols.define_all(path, unit.symbols);
        Ok(true)
    }
}

impl std::fmt::Debug for Framework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Framework")
            .field("root", &self.config.root)
            .field("attached", &self.app.is_some())
            .field("search_paths", &self.search_paths.len())
            .field("imports", &self.imports.len())
            .field("symbols", &self.symbols.symbol_count())
            .finish()
    }
}

/// Report a configuration error and terminate the process.
fn configuration_fatal(err: ConfigurationError) -> ! {
    error!(target: "rays::bootstrap::attach", error = %err, "Fatal configuration error");
    eprintln!("Fatal configuration error: {}", err);
    std::process::exit(1);
}

/// Thread-safe wrapper for Framework.
///
/// Import and class resolution are check-then-act sequences, so hosts that
/// resolve from several threads hold the lock across the whole call.
pub type SharedFramework = Arc<Mutex<Framework>>;

/// Wrap a framework for shared use.
pub fn new_shared_framework(framework: Framework) -> SharedFramework {
    Arc::new(Mutex::new(framework))
}
