//! Process-level plumbing shared by the server binary: layered configuration,
//! home directory resolution and logging initialization.

pub mod config;
pub mod logging;
pub mod paths;

pub use config::{
    absolutize_sqlite_dsn, default_logging_config, detect_backend, AppConfig, CliArgs,
    DatabaseConfig, LoggingConfig, Section, ServerConfig,
};
