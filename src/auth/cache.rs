//! Cache of authentication contexts
//!
//! Entries are kept in a plain vector behind one mutex. Every lookup first
//! drops expired contexts and then stable-sorts the rest so that contexts
//! known to work come first and contexts known to fail come last.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use url::Url;

use super::challenge::Challenge;
use super::scheme::AuthContext;

/// A context together with what has been observed when using it
#[derive(Debug)]
pub struct TestedContext {
    context: Arc<dyn AuthContext>,
    succeeded: AtomicBool,
    failed: AtomicBool,
}

impl TestedContext {
    pub fn new(context: Arc<dyn AuthContext>) -> Self {
        Self {
            context,
            succeeded: AtomicBool::new(false),
            failed: AtomicBool::new(false),
        }
    }

    pub fn context(&self) -> &Arc<dyn AuthContext> {
        &self.context
    }

    pub fn has_succeeded(&self) -> bool {
        self.succeeded.load(Ordering::SeqCst)
    }

    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    pub fn mark_succeeded(&self) {
        self.succeeded.store(true, Ordering::SeqCst);
    }

    pub fn mark_failed(&self) {
        self.failed.store(true, Ordering::SeqCst);
    }

    // Successes first, unknowns next, failures last
    fn rank(&self) -> (bool, bool) {
        (self.has_failed(), !self.has_succeeded())
    }
}

/// Thread-safe store of [`TestedContext`] entries
#[derive(Debug, Default)]
pub struct ContextCache {
    entries: Mutex<Vec<Arc<TestedContext>>>,
}

impl ContextCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<TestedContext>>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Lock, drop expired entries and sort the remainder
    fn sorted(&self) -> MutexGuard<'_, Vec<Arc<TestedContext>>> {
        let mut entries = self.lock();
        entries.retain(|entry| !entry.context.is_expired());
        entries.sort_by_key(|entry| entry.rank());
        entries
    }

    /// First entry whose context covers `url`
    pub fn find_by_url(&self, url: &Url) -> Option<Arc<TestedContext>> {
        self.sorted()
            .iter()
            .find(|entry| entry.context.is_url_domain(url))
            .cloned()
    }

    /// First entry whose context answers any of `challenges` for `url`
    pub fn find_by_challenges(&self, challenges: &[Challenge], url: &Url) -> Option<Arc<TestedContext>> {
        self.sorted()
            .iter()
            .find(|entry| {
                challenges
                    .iter()
                    .any(|ch| entry.context.is_challenge_domain(ch, url))
            })
            .cloned()
    }

    /// Add an entry; adding the same entry twice has no effect
    pub fn add(&self, entry: Arc<TestedContext>) {
        let mut entries = self.lock();
        if !entries.iter().any(|e| Arc::ptr_eq(e, &entry)) {
            entries.push(entry);
        }
    }

    /// Remove entries matching `predicate`, returning how many went
    pub fn remove_if<F>(&self, predicate: F) -> usize
    where
        F: Fn(&TestedContext) -> bool,
    {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|entry| !predicate(entry));
        before - entries.len()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of live (non-expired) entries
    pub fn len(&self) -> usize {
        self.sorted().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the live entries in lookup order
    pub fn entries(&self) -> Vec<Arc<TestedContext>> {
        self.sorted().to_vec()
    }
}
