//! Logical Name Translation
//!
//! Supports three scopes for dotted logical names:
//! - `system.base.RException` - Relative to the framework root
//! - `application.models.User` - Relative to the application base directory
//! - `helpers.html` - Unscoped, also relative to the application base directory
//!
//! A trailing `*` segment (`application.helpers.*`) selects every unit file
//! directly inside the named directory.

/// Separator used in logical names.
pub const NAME_SEPARATOR: char = '.';

/// Separator used in translated relative paths.
pub const PATH_SEPARATOR: char = '/';

/// Final segment that turns an import into a directory import.
pub const WILDCARD: &str = "*";

const SYSTEM_MARKER: &str = "system";
const APPLICATION_MARKER: &str = "application";

/// Which base directory a logical name is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Framework root directory.
    System,
    /// Application base directory, named explicitly.
    Application,
    /// No scope marker; defaults to the application base directory.
    Unscoped,
}

impl Scope {
    /// Whether resolving this scope needs an attached application.
    pub fn needs_application(self) -> bool {
        !matches!(self, Scope::System)
    }
}

/// A translated logical name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalPath {
    scope: Scope,
    path: String,
    wildcard: bool,
}

impl LogicalPath {
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Relative path with `/` separators, scope marker and wildcard removed.
    ///
    /// This is also the ImportCache key for single-file imports.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// Cache key for a unit found inside a wildcard directory.
    pub fn entry_key(&self, stem: &str) -> String {
        if self.path.is_empty() {
            stem.to_string()
        } else {
            format!("{}{}{}", self.path, PATH_SEPARATOR, stem)
        }
    }
}

/// Translate a dotted logical name.
///
/// Returns `None` for an empty name, which callers treat as "nothing to import".
///
/// # Examples
/// - `"system.base.RException"` -> `System`, `"base/RException"`
/// - `"application.helpers.*"` -> `Application`, `"helpers"`, wildcard
/// - `"extensions.mailer"` -> `Unscoped`, `"extensions/mailer"`
pub fn translate(name: &str) -> Option<LogicalPath> {
    if name.is_empty() {
        return None;
    }

    let normalized = name.replace(NAME_SEPARATOR, &PATH_SEPARATOR.to_string());
    let first = normalized.split(PATH_SEPARATOR).next().unwrap_or_default();

    let (scope, rest) = match first {
        SYSTEM_MARKER => (Scope::System, strip_segment(&normalized, SYSTEM_MARKER)),
        APPLICATION_MARKER => (
            Scope::Application,
            strip_segment(&normalized, APPLICATION_MARKER),
        ),
        _ => (Scope::Unscoped, normalized.as_str()),
    };
    // A leading separator would make the path absolute when joined.
    let rest = rest.trim_start_matches(PATH_SEPARATOR);

    let (path, wildcard) = if rest == WILDCARD {
        ("", true)
    } else if let Some(dir) = rest.strip_suffix(&format!("{}{}", PATH_SEPARATOR, WILDCARD)) {
        (dir, true)
    } else {
        (rest, false)
    };

    Some(LogicalPath {
        scope,
        path: path.to_string(),
        wildcard,
    })
}

/// Strip a leading scope segment together with the separator that follows it.
fn strip_segment<'a>(path: &'a str, segment: &str) -> &'a str {
    let rest = &path[segment.len()..];
    rest.strip_prefix(PATH_SEPARATOR).unwrap_or(rest)
}

/// Reduce a possibly namespace-qualified class name to its final bare name.
///
/// # Examples
/// - `"app\\models\\User"` -> `"User"`
/// - `"User"` -> `"User"`
pub fn bare_class_name(name: &str) -> &str {
    name.rsplit('\\').next().unwrap_or(name)
}
