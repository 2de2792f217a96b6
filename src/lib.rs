//! Scope-Crawl: a resumable, scope-limited web crawler
//!
//! This crate starts from a single seed address, records every link it finds,
//! and recursively fetches only the links that stay inside the seed's prefix.
//! Progress is checkpointed to a JSON file on interrupt so a later run can
//! pick up where the previous one stopped.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Scope-Crawl operations
///
/// Per-URL fetch failures are never represented here; they are recorded on
/// the URL record itself as an [`ErrorCode`].
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("No initial url provided, only allowed when resuming")]
    MissingSeed,

    #[error("Working file {path} found; use --resume to continue it, or remove it and run again")]
    CheckpointExists { path: String },

    #[error("Empty or malformed working file {path}, please check or delete it")]
    EmptyCheckpoint { path: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors reading or writing checkpoint and output files
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to decode {path}: {source}")]
    Decode {
        path: String,
        source: serde_json::Error,
    },

    #[error("Failed to encode registry: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Result type alias for Scope-Crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

// Re-export commonly used types
pub use config::Config;
pub use state::{ErrorCode, Registry, SharedRegistry, UrlRecord};
pub use crate::url::{is_in_scope, ScopePolicy};
