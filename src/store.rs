//! Job store: ordered collection of scheduled jobs.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use glob::Pattern;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::job::Job;

/// Job store contract.
///
/// A store owns a set of jobs and keeps them ordered ascending by
/// `next_run_time` (finished jobs last, ties broken by insertion order),
/// so a scheduler's run loop can always ask "which job fires next?".
/// Queries hand out clones, never references into store internals.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a job.
    ///
    /// If the id is already present and `replace_existing` is false, fails
    /// with [`StoreError::JobAlreadyExists`]; if true, behaves exactly
    /// like [`update_job`](Self::update_job). A genuinely new job with an
    /// unset `next_run_time` gets its first fire time from its trigger,
    /// consulted exactly once. A replaced job keeps `None` as-is: a
    /// finished job stays finished.
    ///
    /// The id must be non-empty; an empty id is a caller bug, not a
    /// recoverable error.
    async fn add_job(&self, job: Job, replace_existing: bool) -> StoreResult<()>;

    /// Replace the stored record with `job`, re-sorted under its current
    /// `next_run_time`. Fails with [`StoreError::JobDoesNotExist`] if the
    /// id is absent.
    async fn update_job(&self, job: Job) -> StoreResult<()>;

    /// Remove a job by id.
    async fn remove_job(&self, id: &str) -> StoreResult<()>;

    /// Remove every job. Never fails.
    async fn remove_all_jobs(&self);

    /// Look up a job by id.
    async fn get_job(&self, id: &str) -> StoreResult<Job>;

    /// Snapshot of all jobs in fire order.
    ///
    /// `pattern` filters ids with full-match glob semantics (`report-*`
    /// matches `report-daily`, not the other way around). An unparsable
    /// pattern matches nothing.
    async fn get_jobs(&self, pattern: Option<&str>) -> Vec<Job>;

    /// Check whether a job with this id is present.
    async fn contains_job(&self, id: &str) -> bool;

    /// Fire time of the first job in sorted order, without removing it.
    ///
    /// `None` when the store is empty or the head job is finished. This is
    /// what the scheduler's sleep-until logic polls, so it never walks the
    /// collection.
    async fn peek_next_run_time(&self) -> Option<DateTime<Utc>>;

    /// Snapshot of every job with `next_run_time <= now`, in fire order.
    async fn due_jobs(&self, now: DateTime<Utc>) -> Vec<Job>;

    /// Number of stored jobs.
    async fn len(&self) -> usize;

    /// Check whether the store holds no jobs.
    async fn is_empty(&self) -> bool;
}

/// Ordering key for a stored job: fire time first, insertion sequence as
/// the tiebreak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FireKey {
    time: FireTime,
    seq: u64,
}

impl Ord for FireKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .cmp(&other.time)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for FireKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Fire time with finished jobs (`None`) ordered after every concrete
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FireTime(Option<DateTime<Utc>>);

impl Ord for FireTime {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0, other.0) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

impl PartialOrd for FireTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

struct Indexed {
    job: Job,
    key: FireKey,
}

/// Both structures live under one lock; every mutation touches them
/// together, so a reader can never observe an id without its ordering
/// entry or vice versa.
struct Inner {
    /// Jobs in fire order. Values are ids into `by_id`.
    by_time: BTreeMap<FireKey, String>,
    /// Id lookup, holding each record together with its ordering key.
    by_id: HashMap<String, Indexed>,
    /// Insertion sequence counter, the tiebreak for equal fire times.
    next_seq: u64,
}

impl Inner {
    fn insert(&mut self, job: Job) {
        let key = FireKey {
            time: FireTime(job.next_run_time),
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.by_time.insert(key, job.id.clone());
        self.by_id.insert(job.id.clone(), Indexed { job, key });
    }

    fn remove(&mut self, id: &str) -> Option<Indexed> {
        let entry = self.by_id.remove(id)?;
        self.by_time.remove(&entry.key);
        Some(entry)
    }
}

/// In-memory job store.
///
/// Ordering is derived from `BTreeMap` keys rather than cached positions,
/// so an insertion in front of existing jobs cannot leave anyone's index
/// stale. Insert/remove are O(log n), id lookup is O(1), peek is the head
/// of the tree.
pub struct MemoryJobStore {
    inner: RwLock<Inner>,
}

impl MemoryJobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                by_time: BTreeMap::new(),
                by_id: HashMap::new(),
                next_seq: 0,
            }),
        }
    }
}

impl Default for MemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn add_job(&self, mut job: Job, replace_existing: bool) -> StoreResult<()> {
        assert!(!job.id.is_empty(), "job id must not be empty");

        let mut inner = self.inner.write().await;
        if inner.by_id.contains_key(&job.id) {
            if !replace_existing {
                return Err(StoreError::JobAlreadyExists(job.id));
            }
            inner.remove(&job.id);
            debug!("Job '{}' replaced (next run: {:?})", job.id, job.next_run_time);
            inner.insert(job);
            return Ok(());
        }

        // The store asks the trigger for the first fire time, once.
        if job.next_run_time.is_none() {
            job.next_run_time = job.trigger.next_fire_time(None, Utc::now());
        }

        debug!("Job '{}' added (next run: {:?})", job.id, job.next_run_time);
        inner.insert(job);
        Ok(())
    }

    async fn update_job(&self, job: Job) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        // Remove-then-insert: changing the fire time in place would leave
        // the record sorted under its old key.
        if inner.remove(&job.id).is_none() {
            return Err(StoreError::JobDoesNotExist(job.id));
        }

        debug!("Job '{}' updated (next run: {:?})", job.id, job.next_run_time);
        inner.insert(job);
        Ok(())
    }

    async fn remove_job(&self, id: &str) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if inner.remove(id).is_none() {
            return Err(StoreError::JobDoesNotExist(id.to_string()));
        }

        debug!("Job '{}' removed", id);
        Ok(())
    }

    async fn remove_all_jobs(&self) {
        let mut inner = self.inner.write().await;
        let count = inner.by_id.len();
        inner.by_time.clear();
        inner.by_id.clear();
        info!("Removed all {} jobs", count);
    }

    async fn get_job(&self, id: &str) -> StoreResult<Job> {
        let inner = self.inner.read().await;
        inner
            .by_id
            .get(id)
            .map(|entry| entry.job.clone())
            .ok_or_else(|| StoreError::JobDoesNotExist(id.to_string()))
    }

    async fn get_jobs(&self, pattern: Option<&str>) -> Vec<Job> {
        let pattern = match pattern {
            Some(raw) => match Pattern::new(raw) {
                Ok(compiled) => Some(compiled),
                Err(e) => {
                    warn!("Invalid job id pattern '{}': {}", raw, e);
                    return Vec::new();
                }
            },
            None => None,
        };

        let inner = self.inner.read().await;
        inner
            .by_time
            .values()
            .filter(|id| pattern.as_ref().map_or(true, |p| p.matches(id.as_str())))
            .filter_map(|id| inner.by_id.get(id).map(|entry| entry.job.clone()))
            .collect()
    }

    async fn contains_job(&self, id: &str) -> bool {
        self.inner.read().await.by_id.contains_key(id)
    }

    async fn peek_next_run_time(&self) -> Option<DateTime<Utc>> {
        let inner = self.inner.read().await;
        inner.by_time.keys().next().and_then(|key| key.time.0)
    }

    async fn due_jobs(&self, now: DateTime<Utc>) -> Vec<Job> {
        let inner = self.inner.read().await;
        let end = FireKey {
            time: FireTime(Some(now)),
            seq: u64::MAX,
        };
        inner
            .by_time
            .range(..=end)
            .filter_map(|(_, id)| inner.by_id.get(id).map(|entry| entry.job.clone()))
            .collect()
    }

    async fn len(&self) -> usize {
        self.inner.read().await.by_id.len()
    }

    async fn is_empty(&self) -> bool {
        self.inner.read().await.by_id.is_empty()
    }
}
