//! Ordered registry of authentication schemes
//!
//! Earlier schemes are preferred (RFC 7235 section 2.1: pick the most
//! secure scheme the client understands). The list is copy-on-write: a
//! reader takes a snapshot and iterates it without holding any lock.

use std::sync::{Arc, RwLock};
use tracing::warn;
use url::Url;

use super::basic::BasicScheme;
use super::challenge::Challenge;
use super::digest::DigestScheme;
use super::scheme::{AuthScheme, ContextFactory};

type SchemeList = Arc<Vec<Arc<dyn AuthScheme>>>;

/// Thread-safe, ordered list of [`AuthScheme`]s
#[derive(Debug)]
pub struct SchemeRegistry {
    schemes: RwLock<SchemeList>,
}

impl SchemeRegistry {
    pub fn new(schemes: Vec<Arc<dyn AuthScheme>>) -> Self {
        Self {
            schemes: RwLock::new(Arc::new(schemes)),
        }
    }

    /// Schemes used when nothing else is configured, most preferred first
    pub fn default_schemes() -> Vec<Arc<dyn AuthScheme>> {
        vec![Arc::new(DigestScheme), Arc::new(BasicScheme)]
    }

    /// Look up a built-in scheme by name (case-insensitive)
    pub fn builtin(name: &str) -> Option<Arc<dyn AuthScheme>> {
        if name.eq_ignore_ascii_case(BasicScheme::NAME) {
            Some(Arc::new(BasicScheme))
        } else if name.eq_ignore_ascii_case(DigestScheme::NAME) {
            Some(Arc::new(DigestScheme))
        } else {
            None
        }
    }

    /// Current list; later changes to the registry do not affect it
    pub fn snapshot(&self) -> SchemeList {
        self.schemes
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Vec<Arc<dyn AuthScheme>>),
    {
        let mut guard = self.schemes.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut next: Vec<_> = (**guard).clone();
        f(&mut next);
        *guard = Arc::new(next);
    }

    /// Append a scheme at lowest preference
    pub fn push(&self, scheme: Arc<dyn AuthScheme>) {
        self.update(|list| list.push(scheme));
    }

    /// Insert a scheme at `index` (clamped to the list length)
    pub fn insert(&self, index: usize, scheme: Arc<dyn AuthScheme>) {
        self.update(|list| {
            let index = index.min(list.len());
            list.insert(index, scheme);
        });
    }

    /// Remove every scheme with the given name; returns whether any went
    pub fn remove(&self, name: &str) -> bool {
        let mut removed = false;
        self.update(|list| {
            let before = list.len();
            list.retain(|s| !s.name().eq_ignore_ascii_case(name));
            removed = list.len() != before;
        });
        removed
    }

    pub fn replace_all(&self, schemes: Vec<Arc<dyn AuthScheme>>) {
        self.update(|list| *list = schemes);
    }

    pub fn names(&self) -> Vec<String> {
        self.snapshot().iter().map(|s| s.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pick the preferred factory for a set of challenges: schemes in
    /// preference order, then challenges in header order. Malformed
    /// challenges are logged and skipped.
    pub fn select_factory(&self, challenges: &[Challenge], url: &Url) -> Option<Box<dyn ContextFactory>> {
        for scheme in self.snapshot().iter() {
            for challenge in challenges {
                match scheme.create_context_factory(challenge, url) {
                    Ok(Some(factory)) => return Some(factory),
                    Ok(None) => {}
                    Err(e) => {
                        warn!(
                            scheme = scheme.name(),
                            challenge = %challenge,
                            "Challenge error reported by scheme: {}",
                            e.reason
                        );
                    }
                }
            }
        }
        None
    }
}

impl Default for SchemeRegistry {
    fn default() -> Self {
        Self::new(Self::default_schemes())
    }
}
