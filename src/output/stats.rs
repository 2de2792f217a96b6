//! Statistics generation from a crawl registry
//!
//! This module provides functionality for summarizing a set of URL records,
//! either live at the end of a run or loaded from a checkpoint/output file.

use crate::state::{ErrorCode, UrlRecord};
use std::collections::{HashMap, HashSet};

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Total number of records in the registry
    pub total_urls: usize,

    /// Records whose fetch task has finished
    pub completed: usize,

    /// Records still waiting for a fetch
    pub pending: usize,

    /// Number of distinct hosts among the records
    pub unique_hosts: usize,

    /// Sum of discovered links over all records
    pub total_links: usize,

    /// Completed records by classification
    pub by_error_code: HashMap<ErrorCode, usize>,
}

impl CrawlStatistics {
    /// Computes statistics over a slice of records
    pub fn from_records(records: &[UrlRecord]) -> Self {
        let mut stats = Self {
            total_urls: records.len(),
            ..Self::default()
        };
        let mut hosts = HashSet::new();

        for record in records {
            if record.completed {
                stats.completed += 1;
                *stats.by_error_code.entry(record.error_code).or_insert(0) += 1;
            } else {
                stats.pending += 1;
            }
            stats.total_links += record.discovered_links.len();

            if let Some(host) = url::Url::parse(&record.address)
                .ok()
                .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
            {
                hosts.insert(host);
            }
        }

        stats.unique_hosts = hosts.len();
        stats
    }

    /// Completed records with the given classification
    pub fn count(&self, code: ErrorCode) -> usize {
        self.by_error_code.get(&code).copied().unwrap_or(0)
    }
}

/// Logs statistics at info level
pub fn log_statistics(stats: &CrawlStatistics) {
    tracing::info!(
        "Crawl statistics: {} urls ({} completed, {} pending) across {} hosts, {} links found",
        stats.total_urls,
        stats.completed,
        stats.pending,
        stats.unique_hosts,
        stats.total_links
    );

    for code in ErrorCode::all().into_iter().filter(|c| c.is_error()) {
        let count = stats.count(code);
        if count > 0 {
            tracing::info!("  {}: {}", code, count);
        }
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Total urls: {}", stats.total_urls);
    println!("  Completed: {}", stats.completed);
    println!("  Pending: {}", stats.pending);
    println!("  Unique hosts: {}", stats.unique_hosts);
    println!("  Total links found: {}", stats.total_links);
    println!();

    println!("Completed by Outcome:");
    for code in ErrorCode::all() {
        let count = stats.count(code);
        let percentage = if stats.completed > 0 {
            (count as f64 / stats.completed as f64) * 100.0
        } else {
            0.0
        };
        println!("  {} ({}): {} ({:.1}%)", code, code.code(), count, percentage);
    }
}
