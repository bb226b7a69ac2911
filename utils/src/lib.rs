//! Shared utilities for the service rating directory.

pub mod logging;

pub use logging::{init_logging, LogFormat};
