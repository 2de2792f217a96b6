//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and outcome classification
//! - HTML parsing and link extraction
//! - The per-URL fetch task
//! - Overall crawl coordination, completion detection and checkpointing

mod coordinator;
mod fetcher;
mod parser;
mod task;

pub use coordinator::{shutdown_signal, Coordinator, CrawlOutcome};
pub use fetcher::{build_http_client, decode_body, fetch_url, is_html_content_type, FetchResult};
pub use parser::{parse_html, ParsedPage};
pub use task::{run_fetch_task, SpawnRequest, TaskContext};
