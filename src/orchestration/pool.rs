//! Worker pool and executor contracts.
//!
//! The orchestrator never owns workers directly. It ranks, acquires and
//! releases them through `WorkerPool`, and runs tasks on them through
//! `TaskExecutor`. `InMemoryWorkerPool` is a self-contained pool suitable for
//! embedding and tests.

use crate::core::result::TaskResult;
use crate::core::task::{Task, TaskId};
use crate::error::Result;
use crate::wlog_trace;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Capability that matches every task.
pub const ANY_CAPABILITY: &str = "*";

/// Role of workers that take part in vote steps.
pub const REVIEWER_ROLE: &str = "reviewer";

/// Description of one worker as seen by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerInfo {
    pub id: String,
    pub role: String,
    pub capabilities: Vec<String>,
}

impl WorkerInfo {
    pub fn new(id: &str, role: &str) -> Self {
        Self {
            id: id.to_string(),
            role: role.to_string(),
            capabilities: Vec::new(),
        }
    }

    pub fn with_capability(mut self, capability: &str) -> Self {
        self.capabilities.push(capability.to_string());
        self
    }

    /// Fraction of the task's required capabilities this worker covers.
    ///
    /// A task without requirements, or a worker holding `ANY_CAPABILITY`,
    /// scores 1.0.
    pub fn match_score(&self, task: &Task) -> f64 {
        if task.capabilities.is_empty() || self.capabilities.iter().any(|c| c == ANY_CAPABILITY) {
            return 1.0;
        }
        let matched = task
            .capabilities
            .iter()
            .filter(|required| {
                self.capabilities
                    .iter()
                    .any(|c| c.eq_ignore_ascii_case(required))
            })
            .count();
        matched as f64 / task.capabilities.len() as f64
    }
}

/// Pool of interchangeable workers.
///
/// Implementations must guarantee that a worker is held by at most one task:
/// `acquire` on a busy worker returns `false`.
#[async_trait]
pub trait WorkerPool: Send + Sync {
    /// Up to `max` workers able to run `task`, best first.
    async fn find_candidates(&self, task: &Task, max: usize) -> Vec<WorkerInfo>;

    /// Claim a worker for a task. Returns `false` if it is busy or unknown.
    async fn acquire(&self, worker_id: &str, task_id: TaskId) -> bool;

    /// Return a worker to the pool, recording the outcome for ranking.
    async fn release(&self, worker_id: &str, success: bool);

    async fn get_by_role(&self, role: &str) -> Vec<WorkerInfo>;
}

/// Runs one task on one worker.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// # Errors
    /// Implementations return an error when the worker could not produce a
    /// result at all. A task that ran but failed is an `Ok` result with
    /// `success == false`.
    async fn execute(&self, worker: &WorkerInfo, task: &Task) -> Result<TaskResult>;
}

/// Outcome counters of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkerStats {
    pub successes: u32,
    pub failures: u32,
}

impl WorkerStats {
    /// Smoothed success rate; an unused worker rates 0.5.
    pub fn success_rate(&self) -> f64 {
        (f64::from(self.successes) + 1.0) / (f64::from(self.successes + self.failures) + 2.0)
    }
}

#[derive(Debug)]
struct WorkerSlot {
    info: WorkerInfo,
    current_task: Option<TaskId>,
    stats: WorkerStats,
}

/// Worker pool held in memory.
///
/// Candidates are idle workers with a non-zero capability match, ranked by
/// match score, then success rate, then registration order.
#[derive(Debug, Default)]
pub struct InMemoryWorkerPool {
    slots: Mutex<Vec<WorkerSlot>>,
}

impl InMemoryWorkerPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workers(workers: impl IntoIterator<Item = WorkerInfo>) -> Self {
        let slots = workers
            .into_iter()
            .map(|info| WorkerSlot {
                info,
                current_task: None,
                stats: WorkerStats::default(),
            })
            .collect();
        Self {
            slots: Mutex::new(slots),
        }
    }

    /// Add a worker. Returns `false` if the id is already registered.
    pub async fn register(&self, info: WorkerInfo) -> bool {
        let mut slots = self.slots.lock().await;
        if slots.iter().any(|slot| slot.info.id == info.id) {
            return false;
        }
        slots.push(WorkerSlot {
            info,
            current_task: None,
            stats: WorkerStats::default(),
        });
        true
    }

    pub async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.lock().await.is_empty()
    }

    /// Task currently held by a worker.
    pub async fn current_task(&self, worker_id: &str) -> Option<TaskId> {
        self.slots
            .lock()
            .await
            .iter()
            .find(|slot| slot.info.id == worker_id)
            .and_then(|slot| slot.current_task)
    }

    pub async fn busy_count(&self) -> usize {
        self.slots
            .lock()
            .await
            .iter()
            .filter(|slot| slot.current_task.is_some())
            .count()
    }

    pub async fn stats(&self, worker_id: &str) -> Option<WorkerStats> {
        self.slots
            .lock()
            .await
            .iter()
            .find(|slot| slot.info.id == worker_id)
            .map(|slot| slot.stats)
    }
}

#[async_trait]
impl WorkerPool for InMemoryWorkerPool {
    async fn find_candidates(&self, task: &Task, max: usize) -> Vec<WorkerInfo> {
        let slots = self.slots.lock().await;
        let mut ranked: Vec<(f64, f64, &WorkerSlot)> = slots
            .iter()
            .filter(|slot| slot.current_task.is_none())
            .map(|slot| (slot.info.match_score(task), slot.stats.success_rate(), slot))
            .filter(|(score, _, _)| *score > 0.0)
            .collect();
        // Stable sort keeps registration order for ties.
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0).then(b.1.total_cmp(&a.1)));
        ranked
            .into_iter()
            .take(max)
            .map(|(_, _, slot)| slot.info.clone())
            .collect()
    }

    async fn acquire(&self, worker_id: &str, task_id: TaskId) -> bool {
        let mut slots = self.slots.lock().await;
        match slots.iter_mut().find(|slot| slot.info.id == worker_id) {
            Some(slot) if slot.current_task.is_none() => {
                slot.current_task = Some(task_id);
                wlog_trace!("Worker {} acquired for task {}", worker_id, task_id.short());
                true
            }
            _ => false,
        }
    }

    async fn release(&self, worker_id: &str, success: bool) {
        let mut slots = self.slots.lock().await;
        if let Some(slot) = slots.iter_mut().find(|slot| slot.info.id == worker_id) {
            slot.current_task = None;
            if success {
                slot.stats.successes += 1;
            } else {
                slot.stats.failures += 1;
            }
            wlog_trace!("Worker {} released (success={})", worker_id, success);
        }
    }

    async fn get_by_role(&self, role: &str) -> Vec<WorkerInfo> {
        self.slots
            .lock()
            .await
            .iter()
            .filter(|slot| slot.info.role == role)
            .map(|slot| slot.info.clone())
            .collect()
    }
}
