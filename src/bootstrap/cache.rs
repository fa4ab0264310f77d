//! Load Caching Infrastructure
//!
//! Three process-lifetime tables back the bootstrap:
//! - `ImportCache`: normalized import key -> file that was loaded for it
//! - `ClassMap`: explicit class name -> file overrides, consulted before scanning
//! - `SymbolTable`: class name -> file that defined it
//!
//! Entries are never removed. Presence of an import key is the only signal that
//! a unit was already imported.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Import key -> absolute file path.
#[derive(Debug, Clone, Default)]
pub struct ImportCache {
    entries: HashMap<String, PathBuf>,
}

impl ImportCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Path> {
        self.entries.get(key).map(PathBuf::as_path)
    }

    /// Record a loaded import. Returns `false` if the key was already present,
    /// in which case the existing entry is kept.
    pub fn record(&mut self, key: impl Into<String>, path: impl Into<PathBuf>) -> bool {
        use std::collections::hash_map::Entry;

        match self.entries.entry(key.into()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(path.into());
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries
            .iter()
            .map(|(key, path)| (key.as_str(), path.as_path()))
    }
}

/// Explicit class name -> file overrides.
#[derive(Debug, Clone, Default)]
pub struct ClassMap {
    entries: HashMap<String, PathBuf>,
}

impl ClassMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a class to a file, replacing any earlier mapping.
    pub fn insert(&mut self, class: impl Into<String>, path: impl Into<PathBuf>) {
        self.entries.insert(class.into(), path.into());
    }

    pub fn get(&self, class: &str) -> Option<&Path> {
        self.entries.get(class).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, P: Into<PathBuf>> Extend<(K, P)> for ClassMap {
    fn extend<T: IntoIterator<Item = (K, P)>>(&mut self, iter: T) {
        for (class, path) in iter {
            self.insert(class, path);
        }
    }
}

/// Class name -> defining file, filled as units are loaded.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    defined: HashMap<String, PathBuf>,
    loaded_files: Vec<PathBuf>,
    loaded_set: HashSet<PathBuf>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a loaded file and the symbols it declared.
    ///
    /// A symbol declared twice keeps its first definition.
    pub fn define_all<I, S>(&mut self, file: &Path, symbols: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.loaded_set.insert(file.to_path_buf()) {
            self.loaded_files.push(file.to_path_buf());
        }
        for symbol in symbols {
            self.defined
                .entry(symbol.into())
                .or_insert_with(|| file.to_path_buf());
        }
    }

    pub fn is_defined(&self, symbol: &str) -> bool {
        self.defined.contains_key(symbol)
    }

    /// File that defined `symbol`.
    pub fn origin(&self, symbol: &str) -> Option<&Path> {
        self.defined.get(symbol).map(PathBuf::as_path)
    }

    pub fn is_loaded(&self, file: &Path) -> bool {
        self.loaded_set.contains(file)
    }

    /// Every loaded file, in load order.
    pub fn loaded_files(&self) -> &[PathBuf] {
        &self.loaded_files
    }

    pub fn symbol_count(&self) -> usize {
        self.defined.len()
    }
}
