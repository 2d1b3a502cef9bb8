//! NGX Oracle Sync - Main Library
//!
//! Re-exports the core sync library and provides shared utilities for the
//! binary executables.

// Re-export workspace library for convenience
pub use ngx_sync;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables

    pub mod cli;

    pub use cli::{load_config_from_env, ConfigType};
}
