//! Utilities shared by the library and the CLI.

pub mod logging;

pub use logging::{init_logging, LoggingConfig};
