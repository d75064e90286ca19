//! Orchestration layer.
//!
//! This module runs workflows against a pool of workers: single-task
//! dispatch with ranked fallback, parallel fan-out with majority merge,
//! branch steps where every branch must succeed, conditional skips,
//! reviewer votes, retries and timeouts. It also builds ad-hoc workflows
//! from task decompositions.

mod orchestrator;
mod pool;
mod synthesis;
mod voting;

pub use orchestrator::{Orchestrator, OrchestratorEvent, TaskRun, WorkflowRun};
pub use pool::{
    InMemoryWorkerPool, TaskExecutor, WorkerInfo, WorkerPool, WorkerStats, ANY_CAPABILITY,
    REVIEWER_ROLE,
};
pub use synthesis::workflow_from_decomposition;
pub use voting::{Decision, Vote, VotingRound, VotingStatus};
