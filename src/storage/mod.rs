//! Storage module for persisting crawl progress
//!
//! This module handles the checkpoint lifecycle:
//! - Encoding and decoding the registry as JSON
//! - Bootstrapping a run from a fresh seed or a previous checkpoint
//! - Writing the checkpoint on interrupt and the output file on completion

mod checkpoint;

pub use checkpoint::{
    decode_records, encode_records, read_records, remove_file_if_present, write_records,
};

use crate::config::validate_seed;
use crate::state::Registry;
use crate::{CrawlError, Result};
use std::path::Path;

/// The registry a run starts from, plus where it came from
#[derive(Debug)]
pub struct CrawlStart {
    pub registry: Registry,

    /// Scope boundary for the run: the command-line seed, or the first
    /// record's address when resuming
    pub seed: String,

    /// True if the registry was loaded from a checkpoint
    pub resumed: bool,
}

/// Builds the starting registry for a run
///
/// | Checkpoint file | `resume` | Result |
/// |-----------------|----------|--------|
/// | present | false | `CheckpointExists`, file untouched |
/// | present | true | load it; empty or undecodable is fatal |
/// | absent | either | `seed` is required; one fresh record |
///
/// When resuming, `seed` is ignored and the first record's address becomes
/// the scope boundary.
///
/// # Arguments
///
/// * `checkpoint_path` - Where an interrupted run would have left its checkpoint
/// * `seed` - The seed address from the command line, if any
/// * `resume` - Whether the operator asked to continue a previous run
pub fn bootstrap(
    checkpoint_path: &Path,
    seed: Option<&str>,
    resume: bool,
) -> Result<CrawlStart> {
    let seed = seed.filter(|s| !s.is_empty());
    if seed.is_none() && !resume {
        return Err(CrawlError::MissingSeed);
    }

    let exists = checkpoint_path.try_exists()?;

    if exists {
        let path = checkpoint_path.display().to_string();
        if !resume {
            return Err(CrawlError::CheckpointExists { path });
        }

        let records = read_records(checkpoint_path)?.unwrap_or_default();
        if records.is_empty() {
            return Err(CrawlError::EmptyCheckpoint { path });
        }

        let registry = Registry::from_records(records);
        let effective_seed = registry.get(0).address.clone();
        if let Some(given) = seed {
            if given != effective_seed {
                tracing::warn!(
                    "Ignoring --url {}; resuming crawl of {}",
                    given,
                    effective_seed
                );
            }
        }

        tracing::info!(
            "Working file loaded: {} urls, {} pending",
            registry.len(),
            registry.incomplete_count()
        );

        return Ok(CrawlStart {
            registry,
            seed: effective_seed,
            resumed: true,
        });
    }

    let seed = seed.ok_or(CrawlError::MissingSeed)?;
    validate_seed(seed)?;

    if resume {
        tracing::info!(
            "No working file at {}; starting a fresh crawl",
            checkpoint_path.display()
        );
    }

    Ok(CrawlStart {
        registry: Registry::with_seed(seed),
        seed: seed.to_string(),
        resumed: false,
    })
}
