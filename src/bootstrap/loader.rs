//! Unit Loading
//!
//! The bootstrap never executes files itself. Once a logical name or class name
//! has been resolved to a concrete file, the file is handed to a [`Loader`],
//! which reports the symbols (classes, interfaces) the unit declared.
//!
//! Two loaders ship with the crate:
//! - [`SourceLoader`] reads the unit source and scans it for declarations
//! - [`RegistryLoader`] maps unit file stems to registered constructors, for
//!   hosts where units are compiled in rather than read from disk

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Errors that can occur while loading units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// An explicitly requested module has no entry file.
    ModuleNotFound { module_id: String, path: PathBuf },
    /// A unit file exists but could not be read.
    Io(PathBuf, String),
    /// No constructor is registered for the unit.
    NoConstructor(PathBuf),
    /// A class is still undefined after resolution.
    UndefinedSymbol(String),
    /// An application-relative lookup was made before an application attached.
    NotAttached(String),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::ModuleNotFound { module_id, path } => write!(
                f,
                "Module '{}' not found: entry file '{}' does not exist",
                module_id,
                path.display()
            ),
            LoadError::Io(path, err) => {
                write!(f, "Failed to read '{}': {}", path.display(), err)
            }
            LoadError::NoConstructor(path) => {
                write!(f, "No constructor registered for '{}'", path.display())
            }
            LoadError::UndefinedSymbol(name) => write!(f, "Class '{}' not found", name),
            LoadError::NotAttached(what) => {
                write!(f, "No application attached while resolving '{}'", what)
            }
        }
    }
}

impl std::error::Error for LoadError {}

/// A unit that has been loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedUnit {
    pub path: PathBuf,
    /// Symbols declared by the unit.
    pub symbols: Vec<String>,
}

impl LoadedUnit {
    pub fn new(path: impl Into<PathBuf>, symbols: Vec<String>) -> Self {
        Self {
            path: path.into(),
            symbols,
        }
    }
}

/// Capability that turns a resolved file path into loaded symbols.
pub trait Loader: Send {
    fn load(&mut self, path: &Path) -> LoadResult<LoadedUnit>;
}

/// File stem of a unit path (`/app/models/User.php` -> `User`).
pub fn unit_stem(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|stem| stem.to_str())
}

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^\s*(?:(?:abstract|final|readonly)\s+)*(?:class|interface|trait|enum)\s+([A-Za-z_][A-Za-z0-9_]*)",
    )
    .expect("declaration pattern is valid")
});

/// Loader that reads unit sources from disk.
///
/// Declared symbols are found by scanning for `class`/`interface`/`trait`/`enum`
/// declarations. A unit without declarations (a helper file) defines no symbols;
/// it is only tracked as a loaded file.
#[derive(Debug, Default)]
pub struct SourceLoader {
    sources: HashMap<PathBuf, String>,
}

impl SourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source text of a loaded unit.
    pub fn source(&self, path: &Path) -> Option<&str> {
        self.sources.get(path).map(String::as_str)
    }

    pub fn loaded_count(&self) -> usize {
        self.sources.len()
    }
}

/// Scan unit source for declared symbol names, in declaration order.
pub fn scan_declarations(source: &str) -> Vec<String> {
    DECLARATION
        .captures_iter(source)
        .filter_map(|caps| caps.get(1))
        .map(|name| name.as_str().to_string())
        .collect()
}

impl Loader for SourceLoader {
    fn load(&mut self, path: &Path) -> LoadResult<LoadedUnit> {
        let source = fs::read_to_string(path)
            .map_err(|e| LoadError::Io(path.to_path_buf(), e.to_string()))?;

        let symbols = scan_declarations(&source);
        self.sources.insert(path.to_path_buf(), source);
        Ok(LoadedUnit::new(path, symbols))
    }
}

type Constructor = Box<dyn Fn(&Path) -> Vec<String> + Send>;

/// Loader backed by constructors registered per unit file stem.
#[derive(Default)]
pub struct RegistryLoader {
    constructors: HashMap<String, Constructor>,
}

impl RegistryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor for the unit whose file stem is `stem`.
    pub fn register<F>(&mut self, stem: impl Into<String>, constructor: F)
    where
        F: Fn(&Path) -> Vec<String> + Send + 'static,
    {
        self.constructors.insert(stem.into(), Box::new(constructor));
    }

    /// Register a unit that declares exactly one class named after its stem.
    pub fn register_class(&mut self, class: impl Into<String>) {
        let class = class.into();
        let symbol = class.clone();
        self.register(class, move |_| vec![symbol.clone()]);
    }

    pub fn contains(&self, stem: &str) -> bool {
        self.constructors.contains_key(stem)
    }
}

impl std::fmt::Debug for RegistryLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryLoader")
            .field("constructor_count", &self.constructors.len())
            .finish()
    }
}

impl Loader for RegistryLoader {
    fn load(&mut self, path: &Path) -> LoadResult<LoadedUnit> {
        let constructor = unit_stem(path)
            .and_then(|stem| self.constructors.get(stem))
            .ok_or_else(|| LoadError::NoConstructor(path.to_path_buf()))?;
        Ok(LoadedUnit::new(path, constructor(path)))
    }
}
