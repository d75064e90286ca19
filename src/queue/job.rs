//! Queued job model and queue events.

use crate::core::task::Priority;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Unique identifier for a queued job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Return first 8 characters of the UUID for display.
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the host intends to run a job once it is claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    Immediate,
    Background,
    Deferred,
}

/// Options accepted by `JobQueue::add`.
#[derive(Debug, Clone, Default)]
pub struct JobOptions {
    pub priority: Priority,
    pub execution_mode: ExecutionMode,
    /// Earliest instant the job may be claimed.
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Jobs that must be completed first.
    pub dependencies: Vec<JobId>,
    pub tags: Vec<String>,
}

impl JobOptions {
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.execution_mode = mode;
        self
    }

    pub fn scheduled_for(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_for = Some(at);
        self
    }

    pub fn depends_on(mut self, id: JobId) -> Self {
        self.dependencies.push(id);
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }
}

/// A unit of work waiting in (or claimed from) the queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedJob {
    pub id: JobId,
    /// Opaque configuration handed back to the consumer.
    pub payload: Value,
    pub priority: Priority,
    pub execution_mode: ExecutionMode,
    pub created_at: DateTime<Utc>,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub dependencies: Vec<JobId>,
    pub tags: Vec<String>,
    /// Number of earlier failed runs this job replaces.
    pub attempts: u32,
    /// Insertion counter, breaks `created_at` ties.
    #[serde(skip)]
    pub(crate) sequence: u64,
}

impl QueuedJob {
    pub(crate) fn new(payload: Value, options: JobOptions, sequence: u64) -> Self {
        Self {
            id: JobId::new(),
            payload,
            priority: options.priority,
            execution_mode: options.execution_mode,
            created_at: Utc::now(),
            scheduled_for: options.scheduled_for,
            dependencies: options.dependencies,
            tags: options.tags,
            attempts: 0,
            sequence,
        }
    }

    /// Options that reproduce this job one priority rank lower.
    pub(crate) fn demoted_options(&self) -> JobOptions {
        JobOptions {
            priority: self.priority.demote(),
            execution_mode: self.execution_mode,
            scheduled_for: None,
            dependencies: self.dependencies.clone(),
            tags: self.tags.clone(),
        }
    }

    pub fn is_scheduled_after(&self, now: DateTime<Utc>) -> bool {
        self.scheduled_for.is_some_and(|at| at > now)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Events emitted by the job queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueEvent {
    JobAdded { job_id: JobId, priority: Priority },
    /// A job was claimed by `next`.
    JobReady { job_id: JobId },
    JobCompleted { job_id: JobId },
    JobFailed { job_id: JobId, requeued_as: Option<JobId> },
    /// `add` was refused because the queue is at capacity.
    QueueFull { max: usize },
    /// The pending collection became empty.
    QueueEmpty,
}
