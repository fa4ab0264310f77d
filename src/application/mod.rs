//! Application context: configuration and the attachable application instance.

mod config;
mod context;

pub use config::{AppConfig, CacheConfig, ConfigError, DbConfig};
pub use context::Application;
