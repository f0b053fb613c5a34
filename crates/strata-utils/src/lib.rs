//! # Strata Utilities
//!
//! Shared helpers for the Strata workspace.
//!
//! Today this is the logging setup used by the `strata` binary and by
//! anything embedding `strata-core` that wants the same log output: a
//! `tracing` subscriber with environment-driven filtering, pretty or JSON
//! output, and an optional log file.

pub mod logging;

// Re-export commonly used logging functions for convenience
pub use logging::{
    init_logging, init_logging_to_dir, init_logging_with_level, LogFormat, LogLevel, LoggingConfig, LoggingError,
    LoggingGuard,
};
pub use tracing::{debug, error, info, trace, warn};
