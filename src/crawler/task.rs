//! Fetch task: the unit of concurrent crawl work
//!
//! One task runs per in-scope record. It fetches the page and classifies the
//! outcome. A parsed page's links are recorded and the record is marked
//! complete in one registry step; the task then asks the coordinator to spawn
//! tasks for the in-scope links.

use crate::crawler::fetcher::{fetch_url, FetchResult};
use crate::crawler::parser::parse_html;
use crate::state::{ErrorCode, RecordedLink, SharedRegistry};
use crate::url::ScopePolicy;
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use url::Url;

/// A request from a running task to start fetching a newly appended record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRequest {
    pub index: usize,
    pub address: String,
}

/// State shared by every fetch task of one crawl
pub struct TaskContext {
    pub registry: SharedRegistry,
    pub client: Client,
    pub seed: String,
    pub scope_policy: ScopePolicy,
    pub resolve_relative_links: bool,
    pub max_body_bytes: usize,

    /// Admission control for outbound requests
    pub permits: Arc<Semaphore>,

    /// Channel to the coordinator, which owns task spawning
    pub spawner: mpsc::UnboundedSender<SpawnRequest>,
}

/// Runs the fetch task for the record at `index`
///
/// `resuming` only affects logging: it marks records that were loaded from a
/// checkpoint rather than discovered in this process.
pub async fn run_fetch_task(
    ctx: Arc<TaskContext>,
    index: usize,
    address: String,
    resuming: bool,
) {
    let action = if resuming { "resuming" } else { "fetching" };
    tracing::debug!(id = index, "{} url {}", action, address);

    let outcome = {
        let Ok(_permit) = ctx.permits.acquire().await else {
            tracing::debug!(id = index, "admission closed, abandoning {}", address);
            return;
        };
        fetch_url(&ctx.client, &address, ctx.max_body_bytes).await
    };

    let error_code = match outcome {
        FetchResult::Success { final_url, body } => {
            process_page(&ctx, index, &address, &final_url, &body);
            ErrorCode::None
        }
        failed => {
            log_failure(index, &address, &failed);
            let error_code = failed.error_code().unwrap_or(ErrorCode::NetworkError);
            ctx.registry.mark_complete(index, error_code);
            error_code
        }
    };

    tracing::debug!(id = index, "process ended with exit code {}", error_code.code());
}

/// Parses a fetched page, records its links and marks it complete, then
/// requests tasks for the in-scope links
fn process_page(ctx: &TaskContext, index: usize, address: &str, final_url: &str, body: &str) {
    let base_url = if ctx.resolve_relative_links {
        Url::parse(final_url).or_else(|_| Url::parse(address)).ok()
    } else {
        None
    };

    let parsed = parse_html(body, base_url.as_ref());
    let recorded = ctx.registry.record_page(index, &parsed.links, &ctx.seed, ctx.scope_policy);

    for RecordedLink { link, outcome } in recorded {
        match outcome {
            Ok(new_index) => {
                tracing::debug!(id = index, "adding url {} as {}", link, new_index);
                let request = SpawnRequest {
                    index: new_index,
                    address: link,
                };
                if let Err(e) = ctx.spawner.send(request) {
                    let address = e.0.address;
                    tracing::debug!(id = index, "coordinator stopped; {} left pending", address);
                }
            }
            Err(reason) => {
                tracing::debug!(id = index, "found link {}: {}", link, reason);
            }
        }
    }
}

fn log_failure(index: usize, address: &str, failed: &FetchResult) {
    match failed {
        FetchResult::NetworkError { error } => {
            tracing::info!(id = index, "Network error for {}: {}", address, error);
        }
        FetchResult::HttpError { status_code } => {
            tracing::info!(id = index, "HTTP {} for {}", status_code, address);
        }
        FetchResult::ContentMismatch { content_type } => {
            tracing::debug!(id = index, "Skipping {}: content type {:?}", address, content_type);
        }
        FetchResult::Undecodable { encoding } => {
            tracing::warn!(id = index, "Failed to decode {} as {}", address, encoding);
        }
        FetchResult::Success { .. } => {}
    }
}
