//! Configuration file loading for trisolve
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `--config <path>` specified file
//! 2. Project root: `./trisolve.toml` or `./.trisolve.toml`
//! 3. XDG config: `$XDG_CONFIG_HOME/trisolve/config.toml`
//! 4. Fallback: `~/.config/trisolve/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileProviderConfig, FileSchedulerConfig, FileSolverConfig,
};
pub use loader::ConfigLoader;
