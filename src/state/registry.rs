//! URL registry: the single store of every discovered address
//!
//! Records are addressed by their creation index, which stays stable for the
//! lifetime of the process. [`SharedRegistry`] puts the whole registry behind
//! one mutex so appends, completion marks, link appends and the completion
//! scan are all atomic with respect to each other.

use crate::state::{ErrorCode, UrlRecord};
use crate::url::{check_scope, ScopePolicy, ScopeRejection};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A link found on a page and what the scope filter made of it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedLink {
    pub link: String,

    /// Index of the record created for the link, or why none was
    pub outcome: Result<usize, ScopeRejection>,
}

/// Ordered store of URL records with a case-insensitive address index
#[derive(Debug, Default)]
pub struct Registry {
    records: Vec<UrlRecord>,

    /// Lowercased addresses of every record
    seen: HashSet<String>,

    /// Number of records with `completed == false`
    incomplete: usize,
}

impl Registry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding a single fresh record for the seed
    pub fn with_seed(seed: &str) -> Self {
        let mut registry = Self::new();
        registry.append(seed);
        registry
    }

    /// Rebuilds a registry from previously persisted records
    ///
    /// Record order is preserved so indices match the persisted file.
    pub fn from_records(records: Vec<UrlRecord>) -> Self {
        let mut registry = Self::new();
        for record in records {
            if !registry.seen.insert(record.address.to_lowercase()) {
                tracing::warn!(
                    "Loaded duplicate address {}; keeping both records",
                    record.address
                );
            }
            if !record.completed {
                registry.incomplete += 1;
            }
            registry.records.push(record);
        }
        registry
    }

    /// Appends a new incomplete record and returns its index
    pub fn append(&mut self, address: &str) -> usize {
        self.seen.insert(address.to_lowercase());
        self.records.push(UrlRecord::new(address));
        self.incomplete += 1;
        self.records.len() - 1
    }

    /// Returns the record at `index`
    ///
    /// # Panics
    ///
    /// Panics if `index` was never handed out by this registry.
    pub fn get(&self, index: usize) -> &UrlRecord {
        match self.records.get(index) {
            Some(record) => record,
            None => panic!("record index {} out of range ({})", index, self.records.len()),
        }
    }

    fn get_mut(&mut self, index: usize) -> &mut UrlRecord {
        let len = self.records.len();
        match self.records.get_mut(index) {
            Some(record) => record,
            None => panic!("record index {} out of range ({})", index, len),
        }
    }

    /// Marks a record complete with the given classification
    ///
    /// A record that is already complete keeps `completed = true`; its error
    /// code is overwritten.
    pub fn mark_complete(&mut self, index: usize, error_code: ErrorCode) {
        let record = self.get_mut(index);
        let was_complete = record.completed;
        record.completed = true;
        record.error_code = error_code;
        if !was_complete {
            self.incomplete -= 1;
        }
    }

    /// Appends a link to the record's discovered links
    pub fn append_discovered_link(&mut self, index: usize, link: &str) {
        self.get_mut(index).discovered_links.push(link.to_string());
    }

    /// Records the links of a successfully parsed page and marks it complete
    ///
    /// Every link is appended to the page's discovered links and run through
    /// the scope filter; links that pass get a new record. Links the page
    /// already lists (ignoring case) are skipped, so a page whose earlier
    /// fetch was cut short never lists a link twice.
    pub fn record_page(
        &mut self,
        index: usize,
        links: &[String],
        seed: &str,
        policy: ScopePolicy,
    ) -> Vec<RecordedLink> {
        let mut listed: HashSet<String> = self
            .get(index)
            .discovered_links
            .iter()
            .map(|link| link.to_lowercase())
            .collect();

        let mut recorded = Vec::with_capacity(links.len());
        for link in links {
            if !listed.insert(link.to_lowercase()) {
                continue;
            }
            self.append_discovered_link(index, link);
            let outcome = check_scope(link, seed, policy, self).map(|()| self.append(link));
            recorded.push(RecordedLink {
                link: link.clone(),
                outcome,
            });
        }

        self.mark_complete(index, ErrorCode::None);
        recorded
    }

    /// Returns true if any record's address matches ignoring case
    pub fn contains(&self, address: &str) -> bool {
        self.seen.contains(&address.to_lowercase())
    }

    /// Returns true if every record is complete
    pub fn all_complete(&self) -> bool {
        self.incomplete == 0
    }

    /// Number of records still waiting for their fetch task
    pub fn incomplete_count(&self) -> usize {
        self.incomplete
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[UrlRecord] {
        &self.records
    }

    /// Returns `(index, address)` for every incomplete record, in index order
    pub fn pending(&self) -> Vec<(usize, String)> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| !record.completed)
            .map(|(index, record)| (index, record.address.clone()))
            .collect()
    }
}

/// Registry handle shared by every fetch task
///
/// Every method takes the single registry lock for its whole duration.
#[derive(Debug, Clone, Default)]
pub struct SharedRegistry {
    inner: Arc<Mutex<Registry>>,
}

impl SharedRegistry {
    pub fn new(registry: Registry) -> Self {
        Self {
            inner: Arc::new(Mutex::new(registry)),
        }
    }

    // Every mutation completes before the guard drops, so a poisoned lock
    // still guards a consistent registry.
    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs a read-only closure against a consistent view of the registry
    pub fn with<R>(&self, f: impl FnOnce(&Registry) -> R) -> R {
        f(&self.lock())
    }

    pub fn append(&self, address: &str) -> usize {
        self.lock().append(address)
    }

    /// Returns a copy of the record at `index`
    pub fn get(&self, index: usize) -> UrlRecord {
        self.lock().get(index).clone()
    }

    pub fn mark_complete(&self, index: usize, error_code: ErrorCode) {
        self.lock().mark_complete(index, error_code);
    }

    pub fn append_discovered_link(&self, index: usize, link: &str) {
        self.lock().append_discovered_link(index, link);
    }

    pub fn contains(&self, address: &str) -> bool {
        self.lock().contains(address)
    }

    pub fn all_complete(&self) -> bool {
        self.lock().all_complete()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copies every record for serialization
    pub fn snapshot(&self) -> Vec<UrlRecord> {
        self.lock().records().to_vec()
    }

    pub fn pending(&self) -> Vec<(usize, String)> {
        self.lock().pending()
    }

    /// Records a parsed page's links and marks it complete
    ///
    /// Runs under one lock acquisition, so a snapshot never sees a page with
    /// only part of its links, and two tasks discovering the same address
    /// concurrently create exactly one record.
    pub fn record_page(
        &self,
        index: usize,
        links: &[String],
        seed: &str,
        policy: ScopePolicy,
    ) -> Vec<RecordedLink> {
        self.lock().record_page(index, links, seed, policy)
    }
}
