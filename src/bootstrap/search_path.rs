//! Class Search Path
//!
//! Ordered list of directories scanned for `<ClassName>.<ext>` when a class has
//! no explicit mapping. Framework directories are registered first and the
//! application directories are appended once an application attaches, so a
//! framework class always wins a name collision.

use std::path::{Path, PathBuf};

/// Append-only, ordered directory list. Earlier entries take precedence.
#[derive(Debug, Clone, Default)]
pub struct SearchPaths {
    dirs: Vec<PathBuf>,
    extended: bool,
}

impl SearchPaths {
    /// Create the initial registry from the framework directories.
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            dirs: dirs.into_iter().map(Into::into).collect(),
            extended: false,
        }
    }

    /// Append application directories, in the given order.
    ///
    /// Duplicates are kept; a duplicate never changes which file wins because
    /// the earlier entry is always scanned first.
    pub fn extend<I, P>(&mut self, dirs: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.dirs.extend(dirs.into_iter().map(Into::into));
        self.extended = true;
    }

    /// Whether application directories have been appended.
    pub fn is_extended(&self) -> bool {
        self.extended
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.dirs.iter().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    /// Find the first directory holding `file_name` as a regular file.
    pub fn find(&self, file_name: &str) -> Option<PathBuf> {
        self.dirs
            .iter()
            .map(|dir| dir.join(file_name))
            .find(|candidate| candidate.is_file())
    }
}
