//! URL handling module for Scope-Crawl
//!
//! This module provides request-URI validation, relative link resolution and
//! the scope filter that decides which discovered links get crawled.

mod request_uri;
mod resolve;

use crate::state::Registry;
use serde::Deserialize;
use std::fmt;

// Re-export main functions
pub use request_uri::is_valid_request_uri;
pub use resolve::resolve_link;

/// How a candidate link is compared against the seed address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ScopePolicy {
    /// Plain case-insensitive string prefix: `http://x.test/foo10` is inside
    /// `http://x.test/foo`
    #[default]
    Prefix,

    /// Prefix plus a boundary check: the character after the seed must be
    /// `/` or `?`
    PathBoundary,
}

impl fmt::Display for ScopePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prefix => write!(f, "prefix"),
            Self::PathBoundary => write!(f, "path-boundary"),
        }
    }
}

/// Why the scope filter refused to queue a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeRejection {
    /// Not a well-formed absolute request URI
    Invalid,
    /// Does not start with the seed address
    OutOfScope,
    /// Already present in the registry
    AlreadySeen,
}

impl fmt::Display for ScopeRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid => write!(f, "not a valid request uri"),
            Self::OutOfScope => write!(f, "not a child of the initial url"),
            Self::AlreadySeen => write!(f, "already in registry"),
        }
    }
}

/// Runs the scope filter checks in order; the first failing check decides
///
/// 1. Syntactic validity
/// 2. Prefix containment under `seed` (case-insensitive, per `policy`)
/// 3. Absence from the registry (case-insensitive)
pub fn check_scope(
    candidate: &str,
    seed: &str,
    policy: ScopePolicy,
    registry: &Registry,
) -> Result<(), ScopeRejection> {
    if !is_valid_request_uri(candidate) {
        return Err(ScopeRejection::Invalid);
    }

    if !is_under_seed(candidate, seed, policy) {
        return Err(ScopeRejection::OutOfScope);
    }

    if registry.contains(candidate) {
        return Err(ScopeRejection::AlreadySeen);
    }

    Ok(())
}

/// Decides whether a discovered link should be queued for fetching
///
/// Links rejected here are still recorded on the page that linked to them;
/// this only decides whether they get their own record and fetch task.
///
/// # Examples
///
/// ```
/// use scope_crawl::state::Registry;
/// use scope_crawl::url::{is_in_scope, ScopePolicy};
///
/// let registry = Registry::with_seed("http://x.test/a");
/// assert!(is_in_scope("http://x.test/a/b", "http://x.test/a", ScopePolicy::Prefix, &registry));
/// assert!(!is_in_scope("http://other.test/x", "http://x.test/a", ScopePolicy::Prefix, &registry));
/// assert!(!is_in_scope("http://X.TEST/A", "http://x.test/a", ScopePolicy::Prefix, &registry));
/// ```
pub fn is_in_scope(candidate: &str, seed: &str, policy: ScopePolicy, registry: &Registry) -> bool {
    check_scope(candidate, seed, policy, registry).is_ok()
}

fn is_under_seed(candidate: &str, seed: &str, policy: ScopePolicy) -> bool {
    let candidate = candidate.to_lowercase();
    let seed = seed.to_lowercase();

    if !candidate.starts_with(&seed) {
        return false;
    }

    match policy {
        ScopePolicy::Prefix => true,
        ScopePolicy::PathBoundary => {
            if seed.ends_with('/') || seed.ends_with('?') {
                return true;
            }
            match candidate[seed.len()..].chars().next() {
                None => true,
                Some(next) => next == '/' || next == '?',
            }
        }
    }
}
