//! Configuration module for Scope-Crawl
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file. Command-line flags are applied on top by the binary.
//!
//! # Example
//!
//! ```no_run
//! use scope_crawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! println!("Fetching with up to {} connections", config.crawler.max_concurrent_fetches);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, OutputConfig, UserAgentConfig, DEFAULT_CHECKPOINT_PATH,
    DEFAULT_OUTPUT_PATH,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::{validate, validate_seed};
