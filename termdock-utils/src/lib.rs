//! termdock-utils: Common utilities shared across termdock crates
//!
//! This crate provides:
//! - Unified error types ([`TermdockError`], [`Result`])
//! - Logging infrastructure ([`init_logging`], [`LogConfig`])
//! - Platform path utilities ([`paths`] module)

pub mod error;
pub mod logging;
pub mod paths;

// Re-export main types at crate root for convenience
pub use error::{Result, TermdockError};
pub use logging::{init_logging, init_logging_with_config, LogConfig, LogOutput};

// Re-export commonly used path functions
pub use paths::{
    config_dir, config_file, ensure_all_dirs, layout_file, log_dir, sessions_file, state_dir,
};
