//! Application Configuration
//!
//! Applications are configured with a TOML file:
//!
//! ```toml
//! name = "Blog"
//! base_dir = "/var/www/blog/app"
//! base_path = "/blog"
//! time_zone = "UTC"
//! exception_action = "site/exception"
//! imports = ["application.helpers.*"]
//!
//! [db]
//! host = "127.0.0.1"
//! user = "blog"
//! db_name = "blog"
//! table_prefix = "blog_"
//!
//! [cache]
//! cache_dir = "/cache"
//! cache_time = 1800
//!
//! [class_map]
//! RMailer = "/opt/vendor/mailer/RMailer.php"
//! ```
//!
//! A framework-wide default file may be layered underneath: tables are merged
//! key by key, and the application file wins on conflicts.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Errors raised while reading configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// File could not be read.
    Read(PathBuf, String),
    /// File is not a valid configuration.
    Parse(PathBuf, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read(path, err) => {
                write!(f, "Failed to read config '{}': {}", path.display(), err)
            }
            ConfigError::Parse(path, err) => {
                write!(f, "Invalid config '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Database connection settings (the `[db]` table).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub db_name: String,
    pub table_prefix: String,
    pub charset: String,
}

/// Page cache settings (the `[cache]` table).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub cache_dir: String,
    pub cache_prefix: String,
    /// Lifetime of cache entries, in seconds.
    pub cache_time: u64,
}

/// Whole application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    pub charset: String,
    pub time_zone: String,

    /// Absolute directory holding the application's unit files.
    pub base_dir: PathBuf,

    /// URL path the application is served under (e.g. `/blog`).
    pub base_path: String,

    /// Full base URL. Derived from `server_name` and `base_path` when unset.
    pub base_url: Option<String>,

    pub server_name: String,
    pub debug: bool,

    /// `controller/action` that renders uncaught faults.
    pub exception_action: String,

    pub db: Option<DbConfig>,
    pub cache: Option<CacheConfig>,

    /// Controller directory, relative to `base_dir` unless absolute.
    pub controller_dir: PathBuf,
    /// Model directory, relative to `base_dir` unless absolute.
    pub model_dir: PathBuf,
    /// Module directory, relative to `base_dir` unless absolute.
    pub module_dir: PathBuf,

    /// Logical names imported right after the application attaches.
    pub imports: Vec<String>,

    /// Explicit class name -> file overrides.
    pub class_map: HashMap<String, PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "My Application".to_string(),
            charset: "UTF-8".to_string(),
            time_zone: "PRC".to_string(),
            base_dir: PathBuf::new(),
            base_path: String::new(),
            base_url: None,
            server_name: "localhost".to_string(),
            debug: true,
            exception_action: String::new(),
            db: None,
            cache: None,
            controller_dir: PathBuf::from("controllers"),
            model_dir: PathBuf::from("models"),
            module_dir: PathBuf::from("modules"),
            imports: Vec::new(),
            class_map: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Parse a configuration from TOML content.
    pub fn parse_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let table = read_table(path)?;
        from_table(path, table)
    }

    /// Load an application configuration on top of a framework default file.
    ///
    /// A missing default file is ignored.
    pub fn load_layered(default: Option<&Path>, path: &Path) -> Result<Self, ConfigError> {
        let mut merged = match default {
            Some(default) if default.is_file() => read_table(default)?,
            _ => toml::Table::new(),
        };
        merge_tables(&mut merged, read_table(path)?);
        from_table(path, merged)
    }

    /// Resolve relative paths in the configuration against `dir`.
    ///
    /// Used for configs whose `base_dir` is written relative to the config file.
    pub fn rebase(mut self, dir: &Path) -> Self {
        if !self.base_dir.as_os_str().is_empty() && self.base_dir.is_relative() {
            self.base_dir = dir.join(&self.base_dir);
        }
        for path in self.class_map.values_mut() {
            if path.is_relative() {
                *path = dir.join(&*path);
            }
        }
        self
    }
}

fn read_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::Read(path.to_path_buf(), e.to_string()))?;
    toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e.to_string()))
}

fn from_table(path: &Path, table: toml::Table) -> Result<AppConfig, ConfigError> {
    toml::Value::Table(table)
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::Parse(path.to_path_buf(), e.to_string()))
}

/// Merge `overlay` into `base`. Nested tables merge recursively; any other
/// value in `overlay` replaces the one in `base`.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(incoming) => match base.get_mut(&key) {
                Some(toml::Value::Table(existing)) => merge_tables(existing, incoming),
                _ => {
                    base.insert(key, toml::Value::Table(incoming));
                }
            },
            value => {
                base.insert(key, value);
            }
        }
    }
}
