//! Output module for crawl summaries
//!
//! This module handles summarizing crawl results for the operator, both at
//! the end of a run and from a previously written file.

pub mod stats;

pub use stats::{log_statistics, print_statistics, CrawlStatistics};

use crate::storage::read_records;
use crate::Result;
use std::path::Path;

/// Loads statistics from a checkpoint or output file
///
/// # Returns
///
/// * `Ok(Some(stats))` - The file was read
/// * `Ok(None)` - The file does not exist
/// * `Err(CrawlError)` - The file could not be read or decoded
pub fn load_statistics(path: &Path) -> Result<Option<CrawlStatistics>> {
    Ok(read_records(path)?.map(|records| CrawlStatistics::from_records(&records)))
}
