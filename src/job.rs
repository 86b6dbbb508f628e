//! Job definition.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::trigger::Trigger;

/// A scheduled unit of work.
///
/// Identity is the `id` string, unique within a store. Everything except
/// `id` and `next_run_time` is opaque to the store. A job inside a store
/// is never mutated in place: every state transition replaces the whole
/// record, which is what lets the store re-sort it safely.
#[derive(Debug, Clone)]
pub struct Job {
    /// Unique id, assigned at creation.
    pub id: String,
    /// Human-readable label for logs. Defaults to the id.
    pub name: String,
    /// Schedule definition.
    pub trigger: Arc<dyn Trigger>,
    /// Next scheduled fire time. `None` means the job is finished.
    pub next_run_time: Option<DateTime<Utc>>,
    /// Job-specific payload, opaque to the store.
    pub payload: serde_json::Value,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// Create a new job with the given id and trigger.
    ///
    /// The first fire time is left unset; the store computes it from the
    /// trigger when the job is added.
    pub fn new(id: impl Into<String>, trigger: impl Trigger + 'static) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            trigger: Arc::new(trigger),
            next_run_time: None,
            payload: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    /// Create a job with a generated UUID id.
    pub fn with_random_id(trigger: impl Trigger + 'static) -> Self {
        Self::new(Uuid::new_v4().to_string(), trigger)
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the payload.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Set the next fire time explicitly.
    pub fn with_next_run_time(mut self, next_run_time: Option<DateTime<Utc>>) -> Self {
        self.next_run_time = next_run_time;
        self
    }

    /// Check if the job is due at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.next_run_time {
            Some(next) => next <= now,
            None => false,
        }
    }

    /// Check if the job has no further occurrences.
    pub fn is_finished(&self) -> bool {
        self.next_run_time.is_none()
    }
}
