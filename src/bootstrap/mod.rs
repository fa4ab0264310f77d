//! Bootstrap and Lazy Unit Resolution
//!
//! This module provides the core types of the framework bootstrap:
//! - `translate` - Dotted logical name -> scope + relative path
//! - `SearchPaths` - Ordered class search directories
//! - `ImportCache` / `ClassMap` / `SymbolTable` - Load bookkeeping
//! - `Loader` - Capability that loads a resolved unit file
//! - `Framework` - Context object: attach, import, resolve_class, load_module

mod cache;
mod framework;
mod loader;
mod naming;
mod path;
mod search_path;

pub use cache::{ClassMap, ImportCache, SymbolTable};
pub use framework::{
    new_shared_framework, ConfigurationError, Framework, FrameworkConfig, ImportOutcome,
    LogLevel, ModuleOutcome, Resolution, SharedFramework, CORE_DIR,
    DEFAULT_MODULE_FILE_EXTENSION, DEFAULT_SOURCE_EXTENSION, HELPERS_DIR,
};
pub use loader::{
    scan_declarations, unit_stem, LoadError, LoadResult, LoadedUnit, Loader, RegistryLoader,
    SourceLoader,
};
pub use naming::{module_class_name, ModuleNaming, MODULE_CLASS_SUFFIX};
pub use path::{bare_class_name, translate, LogicalPath, Scope};
pub use search_path::SearchPaths;
