//! Configuration module for thread-mirror
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use thread_mirror::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("mirror.toml")).unwrap();
//! println!("Mirroring {}", config.api.base_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ApiConfig, Config, OutputConfig, SyncLimits};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
