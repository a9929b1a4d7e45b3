//! Process runtime for gardenspace binaries: layered configuration,
//! home directory resolution and logging setup.

pub mod config;
pub mod home_dir;
pub mod logging;

pub use config::{AppConfig, AppSection, CliArgs, LoggingConfig, Section};
pub use home_dir::{resolve_home_dir, HomeDirError};
pub use logging::init_logging_from_config;
