//! Logging utilities.
//!
//! Centralizes logger initialization. Code across the workspace logs through
//! the `log` facade; `env_logger` is the only backend installed.

mod init;

pub use init::{init_logging, LoggingConfig};
