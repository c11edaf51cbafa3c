//! Configuration structs

mod app_config;

pub use app_config::{
    redact_url, AppConfig, AppSettings, ConfigError, DatabaseConfig, Environment, ServerConfig,
};
