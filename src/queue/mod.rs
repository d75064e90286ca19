//! Priority job queue with dependency and activation-time gating.
//!
//! Pending jobs are kept sorted by priority (highest first) and then by
//! creation time, so `next` always serves priority-then-FIFO. All three
//! collections (pending, processing, completed) live behind a single mutex
//! and are only touched through the queue's methods.

mod job;

pub use job::{ExecutionMode, JobId, JobOptions, QueueEvent, QueuedJob};

use crate::config::QueueConfig;
use crate::core::task::Priority;
use crate::error::{Error, Result};
use crate::{wlog_debug, wlog_trace, wlog_warn};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::cmp::Reverse;
use std::collections::HashMap;
use tokio::sync::{mpsc, Mutex};

/// Snapshot of queue occupancy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
}

#[derive(Default)]
struct QueueState {
    pending: Vec<QueuedJob>,
    processing: HashMap<JobId, QueuedJob>,
    completed: HashMap<JobId, QueuedJob>,
    next_sequence: u64,
}

impl QueueState {
    fn sort_key(job: &QueuedJob) -> (Reverse<Priority>, DateTime<Utc>, u64) {
        (Reverse(job.priority), job.created_at, job.sequence)
    }

    /// Insert keeping pending sorted; equal keys go after existing jobs.
    fn insert_sorted(&mut self, job: QueuedJob) {
        let key = Self::sort_key(&job);
        let at = self
            .pending
            .partition_point(|existing| Self::sort_key(existing) <= key);
        self.pending.insert(at, job);
    }

    fn is_eligible(&self, job: &QueuedJob, now: DateTime<Utc>) -> bool {
        !job.is_scheduled_after(now)
            && !self.processing.contains_key(&job.id)
            && job
                .dependencies
                .iter()
                .all(|dep| self.completed.contains_key(dep))
    }
}

/// Buffered ingress for jobs awaiting dispatch.
///
/// # Example
///
/// ```ignore
/// use weft::queue::{JobOptions, JobQueue};
/// use weft::config::QueueConfig;
///
/// let queue = JobQueue::new(QueueConfig::default());
/// let id = queue.add(serde_json::json!({"task": "build"}), JobOptions::default()).await?;
/// let job = queue.next().await.unwrap();
/// queue.complete(&job.id).await?;
/// ```
pub struct JobQueue {
    state: Mutex<QueueState>,
    max_size: usize,
    event_tx: Option<mpsc::Sender<QueueEvent>>,
}

impl JobQueue {
    pub fn new(config: QueueConfig) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            max_size: config.max_size,
            event_tx: None,
        }
    }

    /// Create a queue that reports its events on `event_tx`.
    ///
    /// Events are sent with `try_send`; a full or closed channel drops them.
    pub fn with_events(config: QueueConfig, event_tx: mpsc::Sender<QueueEvent>) -> Self {
        Self {
            event_tx: Some(event_tx),
            ..Self::new(config)
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    fn emit(&self, event: QueueEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.try_send(event);
        }
    }

    /// Add a job and return its id.
    ///
    /// # Errors
    /// `QueueFull` once the pending collection holds `max_size` jobs. The
    /// `QueueFull` event is emitted before the error is returned.
    pub async fn add(&self, payload: Value, options: JobOptions) -> Result<JobId> {
        let mut state = self.state.lock().await;
        self.add_locked(&mut state, payload, options, 0)
    }

    fn add_locked(
        &self,
        state: &mut QueueState,
        payload: Value,
        options: JobOptions,
        attempts: u32,
    ) -> Result<JobId> {
        if state.pending.len() >= self.max_size {
            wlog_warn!("Job queue full (max {}), rejecting job", self.max_size);
            self.emit(QueueEvent::QueueFull { max: self.max_size });
            return Err(Error::QueueFull { max: self.max_size });
        }

        let sequence = state.next_sequence;
        state.next_sequence += 1;

        let mut job = QueuedJob::new(payload, options, sequence);
        job.attempts = attempts;
        let job_id = job.id;
        let priority = job.priority;
        wlog_debug!(
            "Job {} added: priority={}, mode={:?}, deps={}",
            job_id.short(),
            priority,
            job.execution_mode,
            job.dependencies.len()
        );
        state.insert_sorted(job);

        self.emit(QueueEvent::JobAdded { job_id, priority });
        Ok(job_id)
    }

    /// Claim the highest-priority eligible job.
    pub async fn next(&self) -> Option<QueuedJob> {
        self.next_at(Utc::now()).await
    }

    /// Claim the highest-priority job eligible at `now`.
    ///
    /// A job is eligible when it is not scheduled after `now` and every
    /// dependency is in the completed set. The claimed job moves from
    /// pending to processing under the same lock.
    pub async fn next_at(&self, now: DateTime<Utc>) -> Option<QueuedJob> {
        let mut state = self.state.lock().await;

        let position = state
            .pending
            .iter()
            .position(|job| state.is_eligible(job, now))?;
        let job = state.pending.remove(position);
        state.processing.insert(job.id, job.clone());

        wlog_trace!(
            "Job {} claimed, {} pending left",
            job.id.short(),
            state.pending.len()
        );
        self.emit(QueueEvent::JobReady { job_id: job.id });
        if state.pending.is_empty() {
            self.emit(QueueEvent::QueueEmpty);
        }
        Some(job)
    }

    /// Highest-priority pending job, ignoring dependency and time gating.
    pub async fn peek(&self) -> Option<QueuedJob> {
        self.state.lock().await.pending.first().cloned()
    }

    /// Move a processing job to the completed set.
    pub async fn complete(&self, job_id: &JobId) -> Result<()> {
        let mut state = self.state.lock().await;
        let job = state
            .processing
            .remove(job_id)
            .ok_or(Error::JobNotFound { id: *job_id })?;
        state.completed.insert(job.id, job);
        wlog_debug!("Job {} completed", job_id.short());
        self.emit(QueueEvent::JobCompleted { job_id: *job_id });
        Ok(())
    }

    /// Drop a processing job, optionally re-adding it one rank lower.
    ///
    /// The requeued job is a new job with a new id; the failed one is
    /// discarded. Returns the new id when requeued.
    ///
    /// # Errors
    /// - `JobNotFound` if the job is not processing
    /// - `QueueFull` if a requeue finds no room; the job stays processing
    pub async fn fail(&self, job_id: &JobId, requeue: bool) -> Result<Option<JobId>> {
        let mut state = self.state.lock().await;
        if !state.processing.contains_key(job_id) {
            return Err(Error::JobNotFound { id: *job_id });
        }
        if requeue && state.pending.len() >= self.max_size {
            wlog_warn!(
                "Job {} failed but queue is full (max {}), keeping it processing",
                job_id.short(),
                self.max_size
            );
            self.emit(QueueEvent::QueueFull { max: self.max_size });
            return Err(Error::QueueFull { max: self.max_size });
        }
        let job = state
            .processing
            .remove(job_id)
            .ok_or(Error::JobNotFound { id: *job_id })?;

        let requeued_as = if requeue {
            let options = job.demoted_options();
            let new_id = self.add_locked(&mut state, job.payload, options, job.attempts + 1)?;
            wlog_debug!("Job {} failed, requeued as {}", job_id.short(), new_id.short());
            Some(new_id)
        } else {
            wlog_debug!("Job {} failed", job_id.short());
            None
        };

        self.emit(QueueEvent::JobFailed {
            job_id: *job_id,
            requeued_as,
        });
        Ok(requeued_as)
    }

    /// Change the priority of a pending job and restore sort order.
    ///
    /// Returns false if the job is not pending.
    pub async fn promote(&self, job_id: &JobId, priority: Priority) -> bool {
        let mut state = self.state.lock().await;
        let Some(position) = state.pending.iter().position(|job| job.id == *job_id) else {
            return false;
        };
        let mut job = state.pending.remove(position);
        job.priority = priority;
        state.insert_sorted(job);
        wlog_debug!("Job {} promoted to {}", job_id.short(), priority);
        true
    }

    /// Look a job up in any collection.
    pub async fn get(&self, job_id: &JobId) -> Option<QueuedJob> {
        let state = self.state.lock().await;
        state
            .pending
            .iter()
            .find(|job| job.id == *job_id)
            .or_else(|| state.processing.get(job_id))
            .or_else(|| state.completed.get(job_id))
            .cloned()
    }

    /// Pending jobs carrying `tag`, in serving order.
    pub async fn jobs_with_tag(&self, tag: &str) -> Vec<QueuedJob> {
        let state = self.state.lock().await;
        state
            .pending
            .iter()
            .filter(|job| job.has_tag(tag))
            .cloned()
            .collect()
    }

    /// Number of pending jobs.
    pub async fn len(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.pending.is_empty()
    }

    pub async fn stats(&self) -> QueueStats {
        let state = self.state.lock().await;
        QueueStats {
            pending: state.pending.len(),
            processing: state.processing.len(),
            completed: state.completed.len(),
        }
    }

    /// Forget completed jobs. Jobs still depending on them stay blocked.
    pub async fn clear_completed(&self) -> usize {
        let mut state = self.state.lock().await;
        let cleared = state.completed.len();
        state.completed.clear();
        cleared
    }
}
