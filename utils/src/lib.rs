//! Shared utilities for the Shield settlement core.

pub mod logging;

pub use logging::{init_tracing, LogFormat};
