//! Rays - MVC Web Framework Bootstrap
//!
//! This library provides the bootstrap layer of the Rays framework: it turns
//! dotted logical names and bare class names into unit files, loads each unit
//! at most once, and extends the class search path when an application attaches.
//!
//! # Architecture
//!
//! 1. **Application context** (`application` module)
//!    - TOML configuration with framework defaults layered underneath
//!    - The `Application` instance and its derived directories and URLs
//!
//! 2. **Bootstrap** (`bootstrap` module)
//!    - `system.`/`application.`/unscoped logical names, with `.*` directory imports
//!    - Explicit class map first, then an ordered directory scan
//!    - Module entry files at `<module_dir>/<id>/<id><ext>`
//!    - A single attach of the application, guarded
//!
//! 3. **Faults** (`faults` module)
//!    - Registration point for handlers of uncaught faults
//!
//! # Example
//!
//! ```rust,no_run
//! use rays::application::{AppConfig, Application};
//! use rays::bootstrap::{Framework, FrameworkConfig, SourceLoader};
//!
//! let mut framework = Framework::new(FrameworkConfig::new("/opt/rays"), SourceLoader::new());
//! let config = AppConfig::load("/var/www/blog/app.toml".as_ref()).unwrap();
//! framework.attach(Application::new(config));
//!
//! framework.import("application.helpers.*").unwrap();
//! framework.require_class("SiteController").unwrap();
//! framework.load_module("blog").unwrap();
//! ```
//!
//! # Resolution Rules
//!
//! - **Precedence**: framework directories are always scanned before
//!   application directories, so framework classes win name collisions
//! - **Idempotence**: a logical name or file is loaded at most once per framework
//! - **Silent misses**: a missing import target is not an error; the failure
//!   surfaces when the class is required
//! - **Modules**: a missing module entry file is always an error

pub mod application;
pub mod bootstrap;
pub mod faults;

pub use application::{AppConfig, Application, ConfigError};
pub use bootstrap::{
    translate, ConfigurationError, Framework, FrameworkConfig, ImportOutcome, LoadError,
    LoadResult, Loader, ModuleOutcome, Resolution, SourceLoader,
};
pub use faults::{install_panic_hook, ExceptionHandler, Fault, FaultHandler, FaultHooks};
