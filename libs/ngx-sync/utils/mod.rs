//! Common utilities for sync binaries.

mod logging;

pub use logging::init_tracing;
