//! State module for tracking crawl progress
//!
//! This module provides the registry of discovered URLs and the per-URL state
//! stored in it.
//!
//! # Components
//!
//! - `UrlRecord`: One discovered address, its completion flag, error code and links
//! - `ErrorCode`: Classification of a finished fetch
//! - `Registry` / `SharedRegistry`: The ordered, lock-protected store of records

mod record;
mod registry;

// Re-export main types
pub use record::{ErrorCode, UrlRecord};
pub use registry::{RecordedLink, Registry, SharedRegistry};
