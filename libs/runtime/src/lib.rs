//! Process-level plumbing shared by the server binary: layered configuration,
//! home directory resolution, and logging bootstrap.

pub mod config;
pub mod logging;
pub mod paths;

pub use config::{
    default_logging_config, AppConfig, CliArgs, DatabaseConfig, LoggingConfig, Section,
    ServerConfig,
};
pub use paths::resolve_home_dir;
