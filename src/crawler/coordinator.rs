//! Crawler coordinator - main crawl orchestration logic
//!
//! The coordinator is the supervisor of a run. It owns:
//! - The set of running fetch tasks, and the channel tasks use to request new ones
//! - The admission semaphore that bounds concurrent outbound requests
//! - Completion detection: the run is quiescent when no task is running and
//!   no spawn request is queued
//! - The interrupt path, which checkpoints the registry and stops
//! - The completion path, which writes the output file and removes the checkpoint

use crate::config::Config;
use crate::crawler::build_http_client;
use crate::crawler::task::{run_fetch_task, SpawnRequest, TaskContext};
use crate::state::SharedRegistry;
use crate::storage::{remove_file_if_present, write_records, CrawlStart};
use crate::Result;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// Every task finished; the output file was written
    Completed { records: usize },

    /// A shutdown signal arrived; the checkpoint file was written
    Interrupted { records: usize, pending: usize },
}

/// Main crawler coordinator structure
pub struct Coordinator {
    ctx: Arc<TaskContext>,
    spawn_rx: mpsc::UnboundedReceiver<SpawnRequest>,
    resumed: bool,
    checkpoint_path: PathBuf,
    output_path: PathBuf,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `start` - The bootstrapped registry and seed
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(CrawlError)` - The HTTP client could not be built
    pub fn new(config: &Config, start: CrawlStart) -> Result<Self> {
        let client = build_http_client(&config.crawler, &config.user_agent)?;
        let (spawner, spawn_rx) = mpsc::unbounded_channel();

        let ctx = TaskContext {
            registry: SharedRegistry::new(start.registry),
            client,
            seed: start.seed,
            scope_policy: config.crawler.scope_policy,
            resolve_relative_links: config.crawler.resolve_relative_links,
            max_body_bytes: config.crawler.max_body_bytes,
            permits: Arc::new(Semaphore::new(config.crawler.max_concurrent_fetches as usize)),
            spawner,
        };

        Ok(Self {
            ctx: Arc::new(ctx),
            spawn_rx,
            resumed: start.resumed,
            checkpoint_path: PathBuf::from(&config.output.checkpoint_path),
            output_path: PathBuf::from(&config.output.output_path),
        })
    }

    /// A handle to the registry this coordinator crawls into
    pub fn registry(&self) -> SharedRegistry {
        self.ctx.registry.clone()
    }

    /// The scope boundary of this run
    pub fn seed(&self) -> &str {
        &self.ctx.seed
    }

    /// Runs the crawl until quiescence or until `shutdown` resolves
    ///
    /// One fetch task is started per incomplete record. Tasks ask for further
    /// tasks through the spawn channel; the coordinator is the only place
    /// tasks are spawned.
    ///
    /// Quiescence is detected when the last running task has been joined and
    /// the spawn channel is empty. A task sends its spawn requests before it
    /// returns, so joining it happens after its requests are queued.
    pub async fn run<F>(mut self, shutdown: F) -> Result<CrawlOutcome>
    where
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let mut tasks = JoinSet::new();

        let pending = self.ctx.registry.pending();
        tracing::info!(
            "Starting crawl of {} with {} pending urls",
            self.ctx.seed,
            pending.len()
        );
        for (index, address) in pending {
            tasks.spawn(run_fetch_task(self.ctx.clone(), index, address, self.resumed));
        }

        tokio::pin!(shutdown);

        while !tasks.is_empty() {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    tracing::info!("Program stopped by user");
                    tasks.abort_all();
                    return self.checkpoint();
                }

                Some(request) = self.spawn_rx.recv() => {
                    spawn_fetch(&mut tasks, &self.ctx, request);
                }

                Some(joined) = tasks.join_next() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            tracing::error!("Fetch task panicked: {}", e);
                        }
                    }
                    if tasks.is_empty() {
                        if let Ok(request) = self.spawn_rx.try_recv() {
                            spawn_fetch(&mut tasks, &self.ctx, request);
                        }
                    }
                }
            }
        }

        tracing::info!("All tasks finished in {:?}", start_time.elapsed());
        self.finish()
    }

    /// Writes the registry snapshot to the checkpoint file
    fn checkpoint(&self) -> Result<CrawlOutcome> {
        let records = self.ctx.registry.snapshot();
        let pending = records.iter().filter(|r| !r.completed).count();

        write_records(&self.checkpoint_path, &records)?;
        tracing::info!(
            "Progress saved in {} ({} urls, {} pending)",
            self.checkpoint_path.display(),
            records.len(),
            pending
        );

        Ok(CrawlOutcome::Interrupted {
            records: records.len(),
            pending,
        })
    }

    /// Writes the output file and removes the checkpoint
    fn finish(&self) -> Result<CrawlOutcome> {
        let records = self.ctx.registry.snapshot();
        let incomplete = records.iter().filter(|r| !r.completed).count();
        if incomplete > 0 {
            tracing::warn!(
                "{} urls were left incomplete by failed tasks",
                incomplete
            );
        }

        write_records(&self.output_path, &records)?;
        remove_file_if_present(&self.checkpoint_path)?;

        tracing::info!(
            "File {} saved with {} urls",
            self.output_path.display(),
            records.len()
        );

        Ok(CrawlOutcome::Completed {
            records: records.len(),
        })
    }
}

fn spawn_fetch(tasks: &mut JoinSet<()>, ctx: &Arc<TaskContext>, request: SpawnRequest) {
    tasks.spawn(run_fetch_task(ctx.clone(), request.index, request.address, false));
}

/// Resolves when the process receives SIGINT or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
