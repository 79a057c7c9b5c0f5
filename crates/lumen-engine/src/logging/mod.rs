//! Logging setup.
//!
//! The crate logs through the `log` facade only. Hosts call [`init_logging`]
//! early; embedders that install their own logger can skip it.

mod init;

pub use init::{init_logging, LoggingConfig, DEFAULT_FILTER};
