//! Credential Cache.
//!
//! Holds the last fetched credential set for a single origin. A new origin's
//! `put` replaces the previous entry; there is no per-origin map. The cache
//! never fetches on its own: a miss tells the caller to go to the network.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::types::credential::Credential;

/// Millisecond wall clock used to stamp and expire cache entries.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Clock backed by `SystemTime`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64
    }
}

/// Clock that only moves when told to. Used by tests and replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(start_millis),
        }
    }

    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }

    pub fn set(&self, millis: i64) {
        self.now.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// The single retained cache entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialCacheEntry {
    pub origin: String,
    pub credentials: Vec<Credential>,
    pub fetched_at_millis: i64,
}

/// Trait defining credential cache operations.
pub trait CredentialCacheTrait {
    /// Cached credentials for `origin`, or `None` on a miss or expiry.
    fn get(&self, origin: &str) -> Option<Vec<Credential>>;
    fn put(&mut self, origin: &str, credentials: Vec<Credential>);
    fn invalidate(&mut self);
    fn entry(&self) -> Option<&CredentialCacheEntry>;
}

/// Time-bounded single-origin cache.
pub struct CredentialCache {
    entry: Option<CredentialCacheEntry>,
    duration_millis: i64,
    clock: Arc<dyn Clock>,
}

impl CredentialCache {
    pub fn new(duration_millis: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            entry: None,
            duration_millis: duration_millis as i64,
            clock,
        }
    }

    pub fn with_system_clock(duration_millis: u64) -> Self {
        Self::new(duration_millis, Arc::new(SystemClock))
    }

    /// True while `now - fetched_at < duration`.
    fn is_fresh(&self, entry: &CredentialCacheEntry) -> bool {
        self.clock.now_millis() - entry.fetched_at_millis < self.duration_millis
    }
}

impl CredentialCacheTrait for CredentialCache {
    fn get(&self, origin: &str) -> Option<Vec<Credential>> {
        let entry = self.entry.as_ref()?;
        if entry.origin != origin {
            debug!(origin, cached = %entry.origin, "credential cache miss: different origin");
            return None;
        }
        if !self.is_fresh(entry) {
            debug!(origin, "credential cache miss: expired");
            return None;
        }
        debug!(origin, count = entry.credentials.len(), "using cached credentials");
        Some(entry.credentials.clone())
    }

    fn put(&mut self, origin: &str, credentials: Vec<Credential>) {
        self.entry = Some(CredentialCacheEntry {
            origin: origin.to_string(),
            credentials,
            fetched_at_millis: self.clock.now_millis(),
        });
    }

    fn invalidate(&mut self) {
        self.entry = None;
    }

    fn entry(&self) -> Option<&CredentialCacheEntry> {
        self.entry.as_ref()
    }
}
