//! Core workflow type definitions.

use crate::core::result::TaskResult;
use crate::core::task::{Task, TaskId, TaskStatus};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use uuid::Uuid;

/// Unique identifier for a workflow definition.
///
/// Uses UUID v4 for generation and provides a short form display
/// for human-readable output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowId(pub Uuid);

impl WorkflowId {
    /// Create a new unique workflow identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Return first 8 characters of the UUID for display.
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for WorkflowId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for WorkflowId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Unique identifier for one run of a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(pub Uuid);

impl ExecutionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Return first 8 characters of the UUID for display.
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for ExecutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a step dispatches its task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    /// One worker at a time, falling back through ranked candidates.
    Sequential,
    /// Several workers concurrently; succeeds on a majority.
    Parallel,
    /// Dispatches only when its condition holds.
    Conditional,
    /// Reviewer workers vote on the task.
    Vote,
}

impl std::fmt::Display for StepType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepType::Sequential => write!(f, "sequential"),
            StepType::Parallel => write!(f, "parallel"),
            StepType::Conditional => write!(f, "conditional"),
            StepType::Vote => write!(f, "vote"),
        }
    }
}

/// Retry policy with linear backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_ms: u64,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_ms: u64) -> Self {
        Self {
            max_retries,
            backoff_ms,
        }
    }

    /// Delay before retry number `attempt` (zero-based): backoff × (attempt + 1).
    pub fn delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_ms.saturating_mul(u64::from(attempt) + 1))
    }
}

/// Quorum settings for a vote step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoteConfig {
    /// Reviewers required before the round can be decided.
    pub quorum: usize,
    /// Fraction of approvals needed, in [0, 1].
    pub required_majority: f64,
}

/// One node of a workflow graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub id: String,
    pub step_type: StepType,
    pub task: Task,
    /// Distinct tasks for a parallel step, one worker each. Empty means the
    /// step's task fans out to several workers.
    #[serde(default)]
    pub branches: Vec<Task>,
    pub on_success: Option<String>,
    pub on_failure: Option<String>,
    pub retry: Option<RetryPolicy>,
    /// Condition for conditional steps.
    pub condition: Option<String>,
    pub vote: Option<VoteConfig>,
    /// Fan-out width override for parallel steps.
    pub parallelism: Option<usize>,
}

impl WorkflowStep {
    fn new(id: &str, step_type: StepType, task: Task) -> Self {
        Self {
            id: id.to_string(),
            step_type,
            task,
            branches: Vec::new(),
            on_success: None,
            on_failure: None,
            retry: None,
            condition: None,
            vote: None,
            parallelism: None,
        }
    }

    pub fn sequential(id: &str, task: Task) -> Self {
        Self::new(id, StepType::Sequential, task)
    }

    pub fn parallel(id: &str, task: Task) -> Self {
        Self::new(id, StepType::Parallel, task)
    }

    pub fn conditional(id: &str, task: Task, condition: &str) -> Self {
        Self::new(id, StepType::Conditional, task).with_condition(condition)
    }

    pub fn vote(id: &str, task: Task) -> Self {
        Self::new(id, StepType::Vote, task)
    }

    pub fn with_on_success(mut self, step_id: &str) -> Self {
        self.on_success = Some(step_id.to_string());
        self
    }

    pub fn with_on_failure(mut self, step_id: &str) -> Self {
        self.on_failure = Some(step_id.to_string());
        self
    }

    pub fn with_retry(mut self, max_retries: u32, backoff_ms: u64) -> Self {
        self.retry = Some(RetryPolicy::new(max_retries, backoff_ms));
        self
    }

    pub fn with_condition(mut self, condition: &str) -> Self {
        self.condition = Some(condition.to_string());
        self
    }

    pub fn with_vote(mut self, quorum: usize, required_majority: f64) -> Self {
        self.vote = Some(VoteConfig {
            quorum,
            required_majority,
        });
        self
    }

    pub fn with_parallelism(mut self, workers: usize) -> Self {
        self.parallelism = Some(workers);
        self
    }

    pub fn with_branches(mut self, branches: Vec<Task>) -> Self {
        self.branches = branches;
        self
    }

    /// True for a parallel step that runs one task per branch.
    pub fn has_branches(&self) -> bool {
        self.step_type == StepType::Parallel && !self.branches.is_empty()
    }

    /// Ids of the tasks this step dispatches.
    pub fn task_ids(&self) -> Vec<TaskId> {
        if self.has_branches() {
            self.branches.iter().map(|b| b.id).collect()
        } else {
            vec![self.task.id]
        }
    }
}

/// A graph of steps with entry and exit points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    pub name: String,
    pub steps: Vec<WorkflowStep>,
    pub entry_point: String,
    pub exit_points: HashSet<String>,
    /// Global timeout measured from execution start.
    pub timeout_ms: u64,
}

impl Workflow {
    pub fn new(name: &str, entry_point: &str, timeout: Duration) -> Self {
        Self {
            id: WorkflowId::new(),
            name: name.to_string(),
            steps: Vec::new(),
            entry_point: entry_point.to_string(),
            exit_points: HashSet::new(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn with_step(mut self, step: WorkflowStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_exit(mut self, step_id: &str) -> Self {
        self.exit_points.insert(step_id.to_string());
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn step(&self, id: &str) -> Option<&WorkflowStep> {
        self.steps.iter().find(|step| step.id == id)
    }

    pub fn is_exit(&self, id: &str) -> bool {
        self.exit_points.contains(id)
    }

    /// Check that every referenced step id resolves.
    ///
    /// # Errors
    /// `InvalidWorkflowGraph` for duplicate step ids, an unknown entry or
    /// exit point, or a transition to an unknown step.
    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for step in &self.steps {
            if !ids.insert(step.id.as_str()) {
                return Err(Error::InvalidWorkflowGraph(format!(
                    "duplicate step id '{}'",
                    step.id
                )));
            }
        }

        if !ids.contains(self.entry_point.as_str()) {
            return Err(Error::InvalidWorkflowGraph(format!(
                "entry point '{}' not found",
                self.entry_point
            )));
        }
        if let Some(exit) = self.exit_points.iter().find(|e| !ids.contains(e.as_str())) {
            return Err(Error::InvalidWorkflowGraph(format!(
                "exit point '{}' not found",
                exit
            )));
        }

        for step in &self.steps {
            for target in [&step.on_success, &step.on_failure].into_iter().flatten() {
                if !ids.contains(target.as_str()) {
                    return Err(Error::InvalidWorkflowGraph(format!(
                        "step '{}' transitions to unknown step '{}'",
                        step.id, target
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Status of a workflow execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    #[default]
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExecutionStatus::Running)
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionStatus::Running => write!(f, "running"),
            ExecutionStatus::Completed => write!(f, "completed"),
            ExecutionStatus::Failed => write!(f, "failed"),
            ExecutionStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Live state of one workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowExecution {
    pub id: ExecutionId,
    pub workflow_id: WorkflowId,
    pub status: ExecutionStatus,
    pub current_step: Option<String>,
    /// Visited step ids in execution order, without duplicates.
    pub completed_steps: Vec<String>,
    pub step_results: HashMap<String, TaskResult>,
    /// Status of every task dispatched so far, keyed by task id.
    #[serde(default)]
    pub task_statuses: HashMap<TaskId, TaskStatus>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl WorkflowExecution {
    pub fn new(workflow: &Workflow) -> Self {
        let now = Utc::now();
        Self {
            id: ExecutionId::new(),
            workflow_id: workflow.id,
            status: ExecutionStatus::Running,
            current_step: Some(workflow.entry_point.clone()),
            completed_steps: Vec::new(),
            step_results: HashMap::new(),
            task_statuses: HashMap::new(),
            started_at: now,
            updated_at: now,
            completed_at: None,
            error: None,
        }
    }

    /// Record the result of a finished step.
    ///
    /// A revisited step keeps its first position in `completed_steps`; its
    /// result is replaced.
    pub fn record_step(&mut self, step_id: &str, result: TaskResult) {
        if !self.completed_steps.iter().any(|s| s == step_id) {
            self.completed_steps.push(step_id.to_string());
        }
        self.step_results.insert(step_id.to_string(), result);
        self.updated_at = Utc::now();
    }

    pub fn record_task(&mut self, task_id: TaskId, status: TaskStatus) {
        self.task_statuses.insert(task_id, status);
        self.updated_at = Utc::now();
    }

    /// Results in execution order.
    pub fn ordered_results(&self) -> Vec<&TaskResult> {
        self.completed_steps
            .iter()
            .filter_map(|id| self.step_results.get(id))
            .collect()
    }

    /// Move to a terminal status. Ignored once terminal.
    pub fn finish(&mut self, status: ExecutionStatus, error: Option<String>) {
        if self.status.is_terminal() {
            return;
        }
        let now = Utc::now();
        self.status = status;
        self.error = error;
        self.updated_at = now;
        self.completed_at = Some(now);
    }
}
