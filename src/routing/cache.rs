//! Table state cache
//!
//! Holds the result of the most recent `SHOW READYSET TABLES` as a single
//! immutable snapshot. A refresh replaces the whole snapshot at once, so a
//! caller never sees states from two different fetches in one answer.
//!
//! Refreshes are serialized: callers that find the cache stale while another
//! refresh is in flight wait for it and take its outcome, failure included.
//! Names a fresh snapshot confirmed absent are answered from the cache until
//! the TTL lapses.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{timeout, Instant};

use crate::error::{GateError, GateResult};
use crate::observability::{log_event, Event};
use crate::status::{StatusSource, TableState};

/// Freshness and refresh bounds
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Entries older than this are refreshed on next access
    pub ttl: Duration,
    /// Upper bound on a single bulk fetch
    pub refresh_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(5),
            refresh_timeout: Duration::from_secs(2),
        }
    }
}

/// One bulk fetch worth of table states
#[derive(Debug)]
struct CachedTables {
    generation: u64,
    fetched_at: Instant,
    tables: HashMap<String, TableState>,
    /// Requested names this fetch found missing
    absent: BTreeSet<String>,
}

impl CachedTables {
    fn covers(&self, names: &BTreeSet<String>, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
            && names
                .iter()
                .all(|n| self.tables.contains_key(n) || self.absent.contains(n))
    }
}

type RefreshOutcome = GateResult<Arc<CachedTables>>;

/// Process-wide memo of per-table replication state
#[derive(Debug)]
pub struct TableStateCache {
    source: StatusSource,
    config: CacheConfig,
    current: RwLock<Option<Arc<CachedTables>>>,
    /// Held for the duration of a refresh; holds the latest refresh outcome
    last_refresh: Mutex<Option<RefreshOutcome>>,
    generation: AtomicU64,
    /// Refresh attempts started; only changes under `last_refresh`
    fetches: AtomicU64,
}

impl TableStateCache {
    /// Empty cache reading from `source`
    pub fn new(source: StatusSource, config: CacheConfig) -> Self {
        Self {
            source,
            config,
            current: RwLock::new(None),
            last_refresh: Mutex::new(None),
            generation: AtomicU64::new(0),
            fetches: AtomicU64::new(0),
        }
    }

    /// Freshness and refresh bounds in effect
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// States for every requested table, all from the same fetch.
    ///
    /// Refreshes first if the cache is empty, older than the TTL, or missing
    /// a requested name that no fresh fetch has yet confirmed absent. A name
    /// still missing after that is reported as `GateError::UnknownTable`.
    pub async fn get(&self, names: &BTreeSet<String>) -> GateResult<HashMap<String, TableState>> {
        let snapshot = self.snapshot_covering(names).await?;

        let mut found = HashMap::with_capacity(names.len());
        for name in names {
            let state = snapshot
                .tables
                .get(name)
                .ok_or_else(|| GateError::unknown_table(name.clone()))?;
            found.insert(name.clone(), state.clone());
        }
        Ok(found)
    }

    /// Unconditionally re-fetch all tables, waiting for any refresh in flight
    pub async fn refresh(&self) -> GateResult<()> {
        let mut last = self.last_refresh.lock().await;
        self.refresh_locked(&mut last, &BTreeSet::new()).await.map(|_| ())
    }

    /// Drop the cached snapshot; the next `get` refreshes
    pub fn invalidate(&self) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Number of bulk fetches issued so far
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Age of the cached snapshot, if there is one
    pub fn age(&self) -> Option<Duration> {
        self.load().map(|c| c.fetched_at.elapsed())
    }

    fn load(&self) -> Option<Arc<CachedTables>> {
        self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    async fn snapshot_covering(&self, names: &BTreeSet<String>) -> RefreshOutcome {
        // Read before the snapshot so a refresh finishing in between is seen below
        let observed_fetches = self.fetches.load(Ordering::SeqCst);
        if let Some(current) = self.load() {
            if current.covers(names, self.config.ttl) {
                return Ok(current);
            }
        }

        let mut last = self.last_refresh.lock().await;

        // A refresh ran while we waited for the lock: its outcome is ours
        if self.fetches.load(Ordering::SeqCst) != observed_fetches {
            if let Some(outcome) = last.as_ref() {
                return outcome.clone();
            }
        }

        self.refresh_locked(&mut last, names).await
    }

    /// Caller must pass the guard of `last_refresh`
    async fn refresh_locked(
        &self,
        last: &mut Option<RefreshOutcome>,
        requested: &BTreeSet<String>,
    ) -> RefreshOutcome {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let outcome = self.fetch_snapshot(requested).await;
        *last = Some(outcome.clone());
        outcome
    }

    async fn fetch_snapshot(&self, requested: &BTreeSet<String>) -> RefreshOutcome {
        let timeout_ms = self.config.refresh_timeout.as_millis() as u64;

        let fetched = match timeout(self.config.refresh_timeout, self.source.fetch_tables()).await {
            Ok(Ok(tables)) => tables,
            Ok(Err(err)) => {
                let reason = err.to_string();
                log_event(Event::TableCacheRefreshFailed, &[("error", reason.as_str())]);
                return Err(err);
            }
            Err(_) => {
                let timeout_str = timeout_ms.to_string();
                log_event(Event::TableCacheRefreshFailed, &[("timeout_ms", timeout_str.as_str())]);
                return Err(GateError::RefreshTimeout { timeout_ms });
            }
        };

        let tables: HashMap<String, TableState> = fetched
            .into_iter()
            .map(|t| (t.name().to_string(), t))
            .collect();

        // Earlier confirmed misses stay confirmed if this fetch agrees
        let previous_absent = self.load().map(|c| c.absent.clone()).unwrap_or_default();
        let absent: BTreeSet<String> = previous_absent
            .into_iter()
            .chain(requested.iter().cloned())
            .filter(|n| !tables.contains_key(n))
            .collect();

        let snapshot = Arc::new(CachedTables {
            generation: self.generation.fetch_add(1, Ordering::SeqCst) + 1,
            fetched_at: Instant::now(),
            tables,
            absent,
        });

        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&snapshot));

        let count = snapshot.tables.len().to_string();
        let generation = snapshot.generation.to_string();
        log_event(
            Event::TableCacheRefresh,
            &[("generation", generation.as_str()), ("tables", count.as_str())],
        );
        Ok(snapshot)
    }
}
