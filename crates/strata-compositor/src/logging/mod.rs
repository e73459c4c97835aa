//! Logging utilities.
//!
//! The compositor only ever emits through the `log` facade. This module offers
//! a one-shot `env_logger` initializer for binaries and tests that want output.

mod init;

pub use init::{init_logging, LoggingConfig};
