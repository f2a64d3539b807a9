//! Memoizing allocation service over the planner core.
//!
//! Day-estimate queries repeat heavily during interactive use (drag
//! operations re-request the same window many times per second), so results
//! are cached behind an LRU + TTL map. Correctness hinges on the key:
//! [`EstimateKey::new`] fingerprints *every* input the calculator reads,
//! including each linked event's identity and timestamps, so a mutation to
//! any input produces a different key and can never serve a stale result.
//!
//! # Thread Safety
//!
//! The cache serializes access with a `Mutex`; the underlying calculation
//! is pure, so callers may also bypass the cache entirely from any thread.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use plan_core::{
    CalendarEvent, DayEstimate, Holiday, Milestone, Project, ProjectId, WorkPattern,
};

const DEFAULT_TTL_SECS: u64 = 5 * 60;
const DEFAULT_MAX_ENTRIES: usize = 256;

/// Configuration for the estimate cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long an entry stays valid.
    pub ttl: Duration,
    /// Maximum number of cached windows before LRU eviction.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

/// Composite cache key covering every calculator input.
///
/// Constructed only through [`EstimateKey::new`] so no input can be left
/// out of the fingerprint by accident.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EstimateKey {
    project: ProjectId,
    window_start: NaiveDate,
    window_end: NaiveDate,
    project_fp: u64,
    milestones_fp: u64,
    events_fp: u64,
    pattern_fp: u64,
    holidays_fp: u64,
}

impl EstimateKey {
    /// Builds a key from the exact snapshot the calculation will read.
    #[must_use]
    pub fn new(
        project: &Project,
        milestones: &[Milestone],
        events: &[CalendarEvent],
        pattern: &WorkPattern,
        holidays: &[Holiday],
        window_start: NaiveDate,
        window_end: NaiveDate,
    ) -> Self {
        Self {
            project: project.id.clone(),
            window_start,
            window_end,
            project_fp: project_fingerprint(project),
            milestones_fp: milestones_fingerprint(milestones),
            events_fp: events_fingerprint(events),
            pattern_fp: pattern_fingerprint(pattern),
            holidays_fp: holidays_fingerprint(holidays),
        }
    }

    /// The project this key belongs to.
    #[must_use]
    pub const fn project(&self) -> &ProjectId {
        &self.project
    }
}

fn project_fingerprint(project: &Project) -> u64 {
    let mut hasher = DefaultHasher::new();
    project.id.hash(&mut hasher);
    project.start.hash(&mut hasher);
    project.end.hash(&mut hasher);
    project.budget.value().to_bits().hash(&mut hasher);
    project.auto_weekdays.hash(&mut hasher);
    hasher.finish()
}

fn milestones_fingerprint(milestones: &[Milestone]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for m in milestones {
        m.id.hash(&mut hasher);
        m.project.hash(&mut hasher);
        m.allocation.value().to_bits().hash(&mut hasher);
        m.due.hash(&mut hasher);
        m.start.hash(&mut hasher);
        m.recurrence.hash(&mut hasher);
        m.position.hash(&mut hasher);
    }
    hasher.finish()
}

/// Every event's identity, timestamps, state, and series wiring. Omitting
/// events from the key is exactly the stale-auto-estimate failure mode this
/// crate exists to prevent.
fn events_fingerprint(events: &[CalendarEvent]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for e in events {
        e.id.hash(&mut hasher);
        e.project.hash(&mut hasher);
        e.start.hash(&mut hasher);
        e.end.hash(&mut hasher);
        e.state.hash(&mut hasher);
        e.recurrence.hash(&mut hasher);
        e.series.hash(&mut hasher);
    }
    hasher.finish()
}

fn pattern_fingerprint(pattern: &WorkPattern) -> u64 {
    let mut hasher = DefaultHasher::new();
    for schedule in pattern.weekday_schedules() {
        for interval in &schedule.intervals {
            interval.start.hash(&mut hasher);
            interval.hours.value().to_bits().hash(&mut hasher);
        }
        0xfeu8.hash(&mut hasher); // schedule separator
    }
    for (date, schedule) in pattern.overrides() {
        date.hash(&mut hasher);
        for interval in &schedule.intervals {
            interval.start.hash(&mut hasher);
            interval.hours.value().to_bits().hash(&mut hasher);
        }
    }
    hasher.finish()
}

fn holidays_fingerprint(holidays: &[Holiday]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for h in holidays {
        h.hash(&mut hasher);
    }
    hasher.finish()
}

struct CacheEntry {
    estimates: Vec<DayEstimate>,
    expires_at: Instant,
}

struct Inner {
    entries: HashMap<EstimateKey, CacheEntry>,
    access_order: Vec<EstimateKey>,
    hits: u64,
    misses: u64,
}

/// Cache observability counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// LRU + TTL cache for day-estimate results.
pub struct EstimateCache {
    inner: Mutex<Inner>,
    config: CacheConfig,
}

impl EstimateCache {
    /// Creates a cache with the given configuration.
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                access_order: Vec::new(),
                hits: 0,
                misses: 0,
            }),
            config,
        }
    }

    /// Returns the cached estimates for `key`, computing and storing them
    /// on a miss or after expiry.
    pub fn get_or_compute(
        &self,
        key: EstimateKey,
        compute: impl FnOnce() -> Vec<DayEstimate>,
    ) -> Vec<DayEstimate> {
        let mut inner = self.lock();
        let now = Instant::now();

        if let Some(entry) = inner.entries.get(&key) {
            if now < entry.expires_at {
                inner.hits += 1;
                let estimates = inner.entries[&key].estimates.clone();
                touch(&mut inner.access_order, &key);
                tracing::debug!(project = %key.project, "estimate cache hit");
                return estimates;
            }
            inner.entries.remove(&key);
            inner.access_order.retain(|k| k != &key);
        }

        inner.misses += 1;
        tracing::debug!(project = %key.project, "estimate cache miss");
        let estimates = compute();
        inner.entries.insert(
            key.clone(),
            CacheEntry {
                estimates: estimates.clone(),
                expires_at: now + self.config.ttl,
            },
        );
        inner.access_order.push(key);

        while inner.entries.len() > self.config.max_entries {
            if inner.access_order.is_empty() {
                break;
            }
            let evicted = inner.access_order.remove(0);
            inner.entries.remove(&evicted);
            tracing::debug!(project = %evicted.project, "estimate cache eviction");
        }

        estimates
    }

    /// Drops every entry belonging to the given project.
    pub fn invalidate_project(&self, project: &ProjectId) {
        let mut inner = self.lock();
        inner.entries.retain(|k, _| k.project != *project);
        inner.access_order.retain(|k| k.project != *project);
    }

    /// Drops everything. Correctness over cleverness: always safe after any
    /// write the caller cannot attribute to a single project.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.access_order.clear();
    }

    /// Current hit/miss/size counters.
    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            entries: inner.entries.len(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means another caller panicked mid-update of
        // the counters; the map itself is always consistent between calls.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for EstimateCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

/// Moves `key` to the most-recently-used position.
fn touch(order: &mut Vec<EstimateKey>, key: &EstimateKey) {
    if let Some(pos) = order.iter().position(|k| k == key) {
        let k = order.remove(pos);
        order.push(k);
    }
}
