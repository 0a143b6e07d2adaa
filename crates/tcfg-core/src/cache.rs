//! Time-bounded cache of resolved trees, one entry per tenant.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, TimeDelta, Utc};
use tcfg_model::{ConfigTree, TenantId};
use tracing::debug;

use crate::settings::EngineSettings;

/// Source of the current time for expiry checks.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now = now.checked_add_signed(by).unwrap_or(DateTime::<Utc>::MAX_UTC);
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone)]
pub struct CachedEntry {
    pub config: Arc<ConfigTree>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CachedEntry {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Concurrency-safe tenant to tree map with a fixed TTL.
///
/// Entries are replaced whole; a reader never observes a partially written
/// tree. Concurrent writers for one tenant race and the last insert wins.
#[derive(Debug)]
pub struct ResolutionCache {
    entries: RwLock<HashMap<TenantId, CachedEntry>>,
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
}

impl Default for ResolutionCache {
    fn default() -> Self {
        Self::new(EngineSettings::default().cache_ttl())
    }
}

impl ResolutionCache {
    pub fn new(ttl: TimeDelta) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: TimeDelta, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// The cached tree for `tenant`, if present and not expired.
    pub fn get(&self, tenant: &TenantId) -> Option<Arc<ConfigTree>> {
        let now = self.clock.now();
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(tenant)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| Arc::clone(&entry.config))
    }

    /// The stored entry for `tenant`, expired or not.
    pub fn entry(&self, tenant: &TenantId) -> Option<CachedEntry> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(tenant).cloned()
    }

    /// Stores `config` for `tenant`, replacing any previous entry.
    pub fn insert(&self, tenant: TenantId, config: Arc<ConfigTree>) -> CachedEntry {
        let created_at = self.clock.now();
        let expires_at = created_at
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let entry = CachedEntry {
            config,
            created_at,
            expires_at,
        };
        debug!(tenant = %tenant, %expires_at, "caching resolved configuration");
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(tenant, entry.clone());
        entry
    }

    /// Drops the entry for `tenant`. Returns whether one existed.
    pub fn invalidate(&self, tenant: &TenantId) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(tenant)
            .is_some()
    }

    pub fn invalidate_all(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Removes expired entries and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(now));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn tenant(id: &str) -> TenantId {
        TenantId::new(id).unwrap()
    }

    #[test]
    fn entries_expire_after_ttl() {
        let clock = Arc::new(ManualClock::new(start()));
        let cache = ResolutionCache::with_clock(TimeDelta::seconds(300), clock.clone());
        let entry = cache.insert(tenant("a"), Arc::new(ConfigTree::new()));
        assert_eq!(entry.expires_at - entry.created_at, TimeDelta::seconds(300));

        clock.advance(TimeDelta::seconds(299));
        assert!(cache.get(&tenant("a")).is_some());
        clock.advance(TimeDelta::seconds(1));
        assert!(cache.get(&tenant("a")).is_none());
        assert!(cache.entry(&tenant("a")).is_some());
    }

    #[test]
    fn purge_drops_only_expired() {
        let clock = Arc::new(ManualClock::new(start()));
        let cache = ResolutionCache::with_clock(TimeDelta::seconds(60), clock.clone());
        cache.insert(tenant("old"), Arc::new(ConfigTree::new()));
        clock.advance(TimeDelta::seconds(45));
        cache.insert(tenant("new"), Arc::new(ConfigTree::new()));
        clock.advance(TimeDelta::seconds(30));

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&tenant("new")).is_some());
    }

    #[test]
    fn invalidate_is_unconditional() {
        let cache = ResolutionCache::default();
        assert!(!cache.invalidate(&tenant("a")));
        cache.insert(tenant("a"), Arc::new(ConfigTree::new()));
        cache.insert(tenant("b"), Arc::new(ConfigTree::new()));
        assert!(cache.invalidate(&tenant("a")));
        assert!(cache.get(&tenant("a")).is_none());
        cache.invalidate_all();
        assert!(cache.is_empty());
    }

    #[test]
    fn zero_ttl_never_serves() {
        let cache = ResolutionCache::with_clock(
            TimeDelta::zero(),
            Arc::new(ManualClock::new(start())),
        );
        cache.insert(tenant("a"), Arc::new(ConfigTree::new()));
        assert!(cache.get(&tenant("a")).is_none());
    }

    #[test]
    fn expiry_saturates() {
        let clock = Arc::new(ManualClock::new(DateTime::<Utc>::MAX_UTC));
        let cache = ResolutionCache::with_clock(TimeDelta::seconds(10), clock);
        let entry = cache.insert(tenant("a"), Arc::new(ConfigTree::new()));
        assert_eq!(entry.expires_at, DateTime::<Utc>::MAX_UTC);
    }
}
