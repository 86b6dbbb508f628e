//! # Firetable
//!
//! In-memory job store for recurring-job schedulers.
//!
//! ## Features
//!
//! - Jobs kept ordered by next fire time, finished jobs last, ties broken
//!   by insertion order
//! - O(1) id lookup, O(log n) insert/remove, head-of-tree peek
//! - One lock over the ordered index and the id map, so readers never see
//!   them out of sync
//! - Interval, cron expression, and one-shot triggers
//!
//! The store answers the one query a scheduler's run loop lives on:
//! "which job fires next, and when?". The loop peeks to decide how long
//! to sleep, collects due jobs, runs them, and writes each one back with
//! a freshly computed fire time (or removes it).
//!
//! ## Example
//!
//! ```rust
//! use firetable::{IntervalTrigger, Job, JobStore, MemoryJobStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = MemoryJobStore::new();
//!     let job = Job::new("heartbeat", IntervalTrigger::every_secs(30));
//!     store.add_job(job, false).await.unwrap();
//!
//!     let wake_at = store.peek_next_run_time().await;
//!     assert!(wake_at.is_some());
//! }
//! ```

pub mod error;
pub mod job;
pub mod store;
pub mod trigger;

pub use error::{StoreError, StoreResult};
pub use job::Job;
pub use store::{JobStore, MemoryJobStore};
pub use trigger::{CronTrigger, DateTrigger, IntervalTrigger, Trigger};
