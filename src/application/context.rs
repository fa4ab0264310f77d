//! The application instance attached to the framework.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::config::{AppConfig, CacheConfig, DbConfig};

/// A configured application.
///
/// Attaching an application to the framework makes its controller, model and
/// module directories part of the class search path.
#[derive(Debug, Clone)]
pub struct Application {
    config: AppConfig,
    base_url: OnceLock<String>,
    app_path: OnceLock<String>,
}

impl Application {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            base_url: OnceLock::new(),
            app_path: OnceLock::new(),
        }
    }

    /// An application without a base directory cannot be attached.
    pub fn is_empty(&self) -> bool {
        self.config.base_dir.as_os_str().is_empty()
    }

    /// The whole configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.config.name = name.into();
    }

    pub fn charset(&self) -> &str {
        &self.config.charset
    }

    pub fn time_zone(&self) -> &str {
        &self.config.time_zone
    }

    pub fn set_time_zone(&mut self, time_zone: impl Into<String>) {
        self.config.time_zone = time_zone.into();
    }

    pub fn base_dir(&self) -> &Path {
        &self.config.base_dir
    }

    pub fn base_path(&self) -> &str {
        &self.config.base_path
    }

    pub fn set_base_path(&mut self, path: impl Into<String>) {
        self.config.base_path = path.into();
        self.base_url.take();
        self.app_path.take();
    }

    /// Base URL of the site, `http://<server_name><base_path>` unless configured.
    ///
    /// Computed on first use and kept until `base_path` or the URL is set.
    pub fn base_url(&self) -> &str {
        self.base_url.get_or_init(|| match &self.config.base_url {
            Some(url) => url.clone(),
            None => format!("http://{}{}", self.config.server_name, self.config.base_path),
        })
    }

    pub fn set_base_url(&mut self, url: impl Into<String>) {
        self.config.base_url = Some(url.into());
        self.base_url.take();
    }

    /// Web-visible path of the application directory.
    ///
    /// For `base_dir = /var/www/example/app` and `base_path = /example` this is
    /// `/example/app`. When `base_path` does not occur in `base_dir` the whole
    /// `base_dir` is returned.
    pub fn app_path(&self) -> &str {
        self.app_path.get_or_init(|| {
            let base_dir = self.config.base_dir.to_string_lossy();
            let start = base_dir.find(&self.config.base_path).unwrap_or(0);
            base_dir[start..].to_string()
        })
    }

    pub fn db_config(&self) -> Option<&DbConfig> {
        self.config.db.as_ref()
    }

    pub fn set_db_config(&mut self, db: DbConfig) {
        self.config.db = Some(db);
    }

    /// Database table prefix, empty when unset.
    pub fn db_prefix(&self) -> &str {
        self.config
            .db
            .as_ref()
            .map(|db| db.table_prefix.as_str())
            .unwrap_or("")
    }

    pub fn cache_config(&self) -> Option<&CacheConfig> {
        self.config.cache.as_ref()
    }

    pub fn set_cache_config(&mut self, cache: CacheConfig) {
        self.config.cache = Some(cache);
    }

    /// `controller/action` handling uncaught faults, empty when unset.
    pub fn exception_action(&self) -> &str {
        &self.config.exception_action
    }

    pub fn set_exception_action(&mut self, action: impl Into<String>) {
        self.config.exception_action = action.into();
    }

    pub fn is_debug(&self) -> bool {
        self.config.debug
    }

    pub fn controller_path(&self) -> PathBuf {
        self.config.base_dir.join(&self.config.controller_dir)
    }

    pub fn model_path(&self) -> PathBuf {
        self.config.base_dir.join(&self.config.model_dir)
    }

    pub fn module_path(&self) -> PathBuf {
        self.config.base_dir.join(&self.config.module_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(content: &str) -> Application {
        Application::new(AppConfig::parse_toml(content).expect("valid config"))
    }

    #[test]
    fn test_empty_application() {
        assert!(Application::new(AppConfig::default()).is_empty());
        assert!(!app(r#"base_dir = "/app""#).is_empty());
    }

    #[test]
    fn test_directory_paths() {
        let app = app(
            r#"
                base_dir = "/var/www/blog"
                module_dir = "/opt/shared/modules"
            "#,
        );
        assert_eq!(app.controller_path(), PathBuf::from("/var/www/blog/controllers"));
        assert_eq!(app.model_path(), PathBuf::from("/var/www/blog/models"));
        assert_eq!(app.module_path(), PathBuf::from("/opt/shared/modules"));
    }

    #[test]
    fn test_base_url_fallback() {
        let mut app = app(
            r#"
                base_dir = "/var/www/blog"
                base_path = "/blog"
                server_name = "example.org"
            "#,
        );
        assert_eq!(app.base_url(), "http://example.org/blog");

        app.set_base_url("https://blog.example.org");
        assert_eq!(app.base_url(), "https://blog.example.org");
    }

    #[test]
    fn test_derived_paths_follow_base_path_changes() {
        let mut app = app(
            r#"
                base_dir = "/var/www/example/app"
                base_path = "/example"
            "#,
        );
        assert_eq!(app.base_url(), "http://localhost/example");
        assert_eq!(app.app_path(), "/example/app");
        assert!(std::ptr::eq(app.base_url(), app.base_url()));

        app.set_base_path("/www");
        assert_eq!(app.base_url(), "http://localhost/www");
        assert_eq!(app.app_path(), "/www/example/app");
    }

    #[test]
    fn test_app_path() {
        let app = app(
            r#"
                base_dir = "/var/www/example/app"
                base_path = "/example"
            "#,
        );
        assert_eq!(app.app_path(), "/example/app");

        let unrelated = self::app(
            r#"
                base_dir = "/srv/app"
                base_path = "/shop"
            "#,
        );
        assert_eq!(unrelated.app_path(), "/srv/app");
    }

    #[test]
    fn test_db_prefix() {
        let mut app = app(r#"base_dir = "/app""#);
        assert_eq!(app.db_prefix(), "");

        app.set_db_config(DbConfig {
            table_prefix: "group_".to_string(),
            ..DbConfig::default()
        });
        assert_eq!(app.db_prefix(), "group_");
    }

    #[test]
    fn test_setters() {
        let mut app = app(r#"base_dir = "/app""#);
        app.set_name("Shop");
        app.set_time_zone("UTC");
        app.set_base_path("/shop");
        app.set_exception_action("site/exception");
        app.set_cache_config(CacheConfig {
            cache_time: 60,
            ..CacheConfig::default()
        });

        assert_eq!(app.name(), "Shop");
        assert_eq!(app.time_zone(), "UTC");
        assert_eq!(app.base_path(), "/shop");
        assert_eq!(app.exception_action(), "site/exception");
        assert_eq!(app.cache_config().unwrap().cache_time, 60);
        assert_eq!(app.charset(), "UTF-8");
        assert!(app.is_debug());
    }
}
