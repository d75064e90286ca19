//! Workflow orchestrator.
//!
//! The `Orchestrator` walks a workflow graph step by step, dispatching each
//! step's task to workers from the pool. Dispatched work runs in its own
//! tokio task and always releases its worker, so a timed-out or cancelled
//! walk never leaks a worker. The workflow timeout and cancellation stop the
//! walk; they do not abort work that was already dispatched.

use crate::config::OrchestratorConfig;
use crate::core::result::{majority_of, TaskResult};
use crate::core::task::{SubTask, Task, TaskStatus};
use crate::decompose::{Decomposer, DecompositionResult};
use crate::error::{Error, Result};
use crate::orchestration::pool::{TaskExecutor, WorkerInfo, WorkerPool, REVIEWER_ROLE};
use crate::orchestration::synthesis::workflow_from_decomposition;
use crate::orchestration::voting::{Decision, Vote, VotingRound};
use crate::workflow::{
    condition, ExecutionId, ExecutionStatus, StepType, VoteConfig, Workflow, WorkflowExecution,
    WorkflowId, WorkflowStep,
};
use crate::{wlog, wlog_debug, wlog_error, wlog_warn};
use futures::future::join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Deadline used when a workflow timeout does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// Events emitted while workflows run.
#[derive(Debug, Clone, PartialEq)]
pub enum OrchestratorEvent {
    WorkflowStarted {
        execution_id: ExecutionId,
        workflow_id: WorkflowId,
    },
    StepStarted {
        execution_id: ExecutionId,
        step_id: String,
        step_type: StepType,
    },
    StepCompleted {
        execution_id: ExecutionId,
        step_id: String,
        success: bool,
    },
    /// A failed step will run again after `delay`.
    StepRetrying {
        execution_id: ExecutionId,
        step_id: String,
        attempt: u32,
        delay: Duration,
    },
    VoteCast {
        execution_id: ExecutionId,
        step_id: String,
        voter_id: String,
        decision: Decision,
    },
    WorkflowFinished {
        execution_id: ExecutionId,
        status: ExecutionStatus,
    },
}

/// Final state of a workflow run and its aggregated result.
#[derive(Debug, Clone)]
pub struct WorkflowRun {
    pub execution: WorkflowExecution,
    pub result: TaskResult,
}

/// Outcome of `Orchestrator::run_task`.
///
/// The decomposition carries the subtasks with the status each one reached.
/// `execution` is set when the task ran as a synthesized workflow.
#[derive(Debug, Clone)]
pub struct TaskRun {
    pub result: TaskResult,
    pub decomposition: DecompositionResult,
    pub execution: Option<WorkflowExecution>,
}

struct LiveExecution {
    state: Arc<Mutex<WorkflowExecution>>,
    cancel: CancellationToken,
}

/// How a walk ended when it did not hit a graph error.
enum WalkEnd {
    Finished,
    StepFailed { step_id: String, error: String },
    TimedOut(Duration),
    Cancelled,
}

/// Executes workflows and single tasks against a worker pool.
pub struct Orchestrator {
    config: OrchestratorConfig,
    decomposer: Decomposer,
    pool: Arc<dyn WorkerPool>,
    executor: Arc<dyn TaskExecutor>,
    live: RwLock<HashMap<ExecutionId, LiveExecution>>,
    event_tx: Option<mpsc::Sender<OrchestratorEvent>>,
}

impl Orchestrator {
    pub fn new(
        config: OrchestratorConfig,
        decomposer: Decomposer,
        pool: Arc<dyn WorkerPool>,
        executor: Arc<dyn TaskExecutor>,
    ) -> Self {
        Self {
            config,
            decomposer,
            pool,
            executor,
            live: RwLock::new(HashMap::new()),
            event_tx: None,
        }
    }

    /// Report events on `event_tx`. Events are dropped when the channel is full.
    pub fn with_events(mut self, event_tx: mpsc::Sender<OrchestratorEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn decomposer(&self) -> &Decomposer {
        &self.decomposer
    }

    fn emit(&self, event: OrchestratorEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.try_send(event);
        }
    }

    /// Run a task, decomposing it into a workflow when it is complex enough.
    ///
    /// Business failures come back as an unsuccessful `TaskResult`.
    ///
    /// # Errors
    /// `MaxConcurrentWorkflowsReached` when a synthesized workflow cannot
    /// start, or a graph error from the synthesized workflow.
    pub async fn execute_task(&self, task: Task) -> Result<TaskResult> {
        Ok(self.run_task(task).await?.result)
    }

    /// Like `execute_task`, but also returns the decomposition with every
    /// subtask's final status.
    ///
    /// Subtasks the walk never reached stay `Pending`. A subtask still in
    /// flight when the workflow timed out or was cancelled is `Failed`.
    ///
    /// # Errors
    /// Same as `execute_task`.
    pub async fn run_task(&self, task: Task) -> Result<TaskRun> {
        let mut decomposition = self.decomposer.decompose(&task);
        if decomposition.is_atomic() {
            wlog_debug!("Dispatching task {} directly", task.id.short());
            let result = self.dispatch_single(&task).await.unwrap_or_else(|e| {
                wlog_warn!("Task {} failed: {}", task.id.short(), e);
                TaskResult::failure(&e.to_string())
            });
            return Ok(TaskRun {
                result,
                decomposition,
                execution: None,
            });
        }

        let timeout = Duration::from_millis(self.config.default_timeout_ms);
        let workflow = workflow_from_decomposition(&task, &decomposition, timeout)?;
        let WorkflowRun {
            execution,
            mut result,
        } = self.execute_workflow(workflow).await?;

        for subtask in &mut decomposition.subtasks {
            settle_subtask(subtask, &execution);
        }

        if !decomposition.unresolved.is_empty() {
            let dropped: Vec<String> = decomposition
                .unresolved
                .iter()
                .filter_map(|id| decomposition.subtask(id))
                .map(|s| s.description.clone())
                .collect();
            wlog_warn!(
                "Task {} ran without {} unresolved subtasks",
                task.id.short(),
                dropped.len()
            );
            result
                .warnings
                .push(format!("unresolved subtasks skipped: {}", dropped.join(", ")));
        }
        Ok(TaskRun {
            result,
            decomposition,
            execution: Some(execution),
        })
    }

    /// Execute `workflow` to completion, failure, timeout or cancellation.
    ///
    /// Step failures, timeouts and cancellation are reported through the
    /// returned run.
    ///
    /// # Errors
    /// - `InvalidWorkflowGraph` if the graph references unknown steps or
    ///   exceeds the step visit limit
    /// - `MaxConcurrentWorkflowsReached` when the running limit is hit
    pub async fn execute_workflow(&self, workflow: Workflow) -> Result<WorkflowRun> {
        workflow.validate()?;

        let execution = WorkflowExecution::new(&workflow);
        let execution_id = execution.id;
        let state = Arc::new(Mutex::new(execution));
        let cancel = CancellationToken::new();

        {
            let mut live = self.live.write().await;
            if live.len() >= self.config.max_concurrent_workflows {
                wlog_warn!(
                    "Rejecting workflow '{}': {} executions running",
                    workflow.name,
                    live.len()
                );
                return Err(Error::MaxConcurrentWorkflowsReached {
                    max: self.config.max_concurrent_workflows,
                });
            }
            live.insert(
                execution_id,
                LiveExecution {
                    state: Arc::clone(&state),
                    cancel: cancel.clone(),
                },
            );
        }

        wlog!(
            "Workflow '{}' started as execution {}",
            workflow.name,
            execution_id.short()
        );
        self.emit(OrchestratorEvent::WorkflowStarted {
            execution_id,
            workflow_id: workflow.id,
        });

        let started = Instant::now();
        let deadline = started
            .checked_add(workflow.timeout())
            .unwrap_or_else(|| started + FAR_FUTURE);
        let walked = tokio::select! {
            biased;
            _ = cancel.cancelled() => Ok(WalkEnd::Cancelled),
            walked = tokio::time::timeout_at(deadline, self.walk(&workflow, execution_id, &state)) => {
                walked.unwrap_or(Ok(WalkEnd::TimedOut(workflow.timeout())))
            }
        };

        match walked {
            Ok(end) => Ok(self.finish(execution_id, &state, end).await),
            Err(e) => {
                wlog_error!("Execution {} aborted: {}", execution_id.short(), e);
                let mut execution = state.lock().await;
                execution.finish(ExecutionStatus::Failed, Some(e.to_string()));
                drop(execution);
                self.retire(execution_id, ExecutionStatus::Failed).await;
                Err(e)
            }
        }
    }

    async fn walk(
        &self,
        workflow: &Workflow,
        execution_id: ExecutionId,
        state: &Mutex<WorkflowExecution>,
    ) -> Result<WalkEnd> {
        let mut current = Some(workflow.entry_point.clone());
        let mut visits = 0usize;

        while let Some(step_id) = current.take() {
            visits += 1;
            if visits > self.config.max_step_visits {
                return Err(Error::InvalidWorkflowGraph(format!(
                    "workflow '{}' exceeded {} step visits",
                    workflow.name, self.config.max_step_visits
                )));
            }
            let step = workflow.step(&step_id).ok_or_else(|| {
                Error::InvalidWorkflowGraph(format!("step '{}' not found", step_id))
            })?;

            {
                let mut execution = state.lock().await;
                execution.current_step = Some(step.id.clone());
                for task_id in step.task_ids() {
                    execution.record_task(task_id, TaskStatus::Running);
                }
            }
            self.emit(OrchestratorEvent::StepStarted {
                execution_id,
                step_id: step.id.clone(),
                step_type: step.step_type,
            });

            let result = self.run_with_retry(step, execution_id, state).await;
            let success = result.success;
            let error = result.errors.last().cloned().unwrap_or_default();
            {
                let mut execution = state.lock().await;
                // branch statuses are recorded as each branch settles
                if !step.has_branches() {
                    execution.record_task(step.task.id, result.status());
                }
                execution.record_step(&step.id, result);
            }

            wlog_debug!(
                "Execution {} step '{}' finished (success={})",
                execution_id.short(),
                step.id,
                success
            );
            self.emit(OrchestratorEvent::StepCompleted {
                execution_id,
                step_id: step.id.clone(),
                success,
            });

            if success {
                if workflow.is_exit(&step.id) {
                    break;
                }
                current = step.on_success.clone();
            } else if let Some(next) = &step.on_failure {
                current = Some(next.clone());
            } else {
                return Ok(WalkEnd::StepFailed {
                    step_id: step.id.clone(),
                    error,
                });
            }
        }

        Ok(WalkEnd::Finished)
    }

    /// Run a step, retrying with linear backoff while its policy allows.
    /// Steps with an `on_failure` route are never retried.
    async fn run_with_retry(
        &self,
        step: &WorkflowStep,
        execution_id: ExecutionId,
        state: &Mutex<WorkflowExecution>,
    ) -> TaskResult {
        let mut attempt = 0u32;
        loop {
            let result = self.run_step(step, execution_id, state).await;
            if result.success || step.on_failure.is_some() {
                return result;
            }
            match step.retry {
                Some(policy) if attempt < policy.max_retries => {
                    let delay = policy.delay(attempt);
                    attempt += 1;
                    wlog_warn!(
                        "Step '{}' failed, retry {}/{} in {:?}",
                        step.id,
                        attempt,
                        policy.max_retries,
                        delay
                    );
                    self.emit(OrchestratorEvent::StepRetrying {
                        execution_id,
                        step_id: step.id.clone(),
                        attempt,
                        delay,
                    });
                    tokio::time::sleep(delay).await;
                }
                _ => return result,
            }
        }
    }

    async fn run_step(
        &self,
        step: &WorkflowStep,
        execution_id: ExecutionId,
        state: &Mutex<WorkflowExecution>,
    ) -> TaskResult {
        match step.step_type {
            StepType::Sequential => self.dispatch_or_fail(&step.task).await,
            StepType::Parallel if step.has_branches() => self.run_branches(step, state).await,
            StepType::Parallel => self.run_parallel(step).await,
            StepType::Conditional => {
                let prior: Vec<TaskResult> = {
                    let execution = state.lock().await;
                    execution.ordered_results().into_iter().cloned().collect()
                };
                let prior: Vec<&TaskResult> = prior.iter().collect();
                if condition::evaluate(step.condition.as_deref(), &prior) {
                    self.dispatch_or_fail(&step.task).await
                } else {
                    wlog_debug!("Step '{}' skipped, condition not met", step.id);
                    TaskResult::success("").with_warning(&format!(
                        "step '{}' skipped: condition '{}' not met",
                        step.id,
                        step.condition.as_deref().unwrap_or_default()
                    ))
                }
            }
            StepType::Vote => self.run_vote(step, execution_id).await,
        }
    }

    async fn dispatch_or_fail(&self, task: &Task) -> TaskResult {
        self.dispatch_single(task)
            .await
            .unwrap_or_else(|e| TaskResult::failure(&e.to_string()))
    }

    /// Try ranked candidates one at a time until one succeeds.
    ///
    /// # Errors
    /// `NoCapableWorker` without candidates, `AllWorkersFailed` once every
    /// candidate was tried.
    pub async fn dispatch_single(&self, task: &Task) -> Result<TaskResult> {
        let candidates = self
            .pool
            .find_candidates(task, self.config.max_candidates)
            .await;
        if candidates.is_empty() {
            return Err(Error::NoCapableWorker {
                task: task.description.clone(),
            });
        }

        let attempted = candidates.len();
        let mut errors = Vec::new();
        for worker in candidates {
            if !self.pool.acquire(&worker.id, task.id).await {
                errors.push(format!("{}: unavailable", worker.id));
                continue;
            }
            let worker_id = worker.id.clone();
            let handle = self.spawn_dispatch(worker, task.clone());
            let result = self.settle(&worker_id, handle).await;
            if result.success {
                return Ok(result);
            }
            wlog_debug!(
                "Worker {} failed task {}, trying next candidate",
                worker_id,
                task.id.short()
            );
            errors.push(format!("{}: {}", worker_id, result.errors.join("; ")));
        }

        Err(Error::AllWorkersFailed { attempted, errors })
    }

    /// Fan the step's task out to several workers and merge on a majority.
    async fn run_parallel(&self, step: &WorkflowStep) -> TaskResult {
        let width = step
            .parallelism
            .unwrap_or(self.config.parallel_workers)
            .max(1);
        let mut handles = Vec::new();
        for worker in self.pool.find_candidates(&step.task, width).await {
            if self.pool.acquire(&worker.id, step.task.id).await {
                let worker_id = worker.id.clone();
                handles.push((worker_id, self.spawn_dispatch(worker, step.task.clone())));
            }
        }

        if handles.is_empty() {
            return TaskResult::failure(
                &Error::NoCapableWorker {
                    task: step.task.description.clone(),
                }
                .to_string(),
            );
        }

        wlog_debug!("Step '{}' dispatched to {} workers", step.id, handles.len());
        let results = join_all(
            handles
                .into_iter()
                .map(|(worker_id, handle)| async move { self.settle(&worker_id, handle).await }),
        )
        .await;

        TaskResult::merge_parallel(&results, majority_of(results.len()))
    }

    /// Run every branch of the step, each on its own worker. The step
    /// succeeds only if every branch does.
    ///
    /// A branch with no free worker waits until one of this step's
    /// dispatches settles and is placed again. It fails with
    /// `NoCapableWorker` only once nothing of this step is left in flight.
    async fn run_branches(
        &self,
        step: &WorkflowStep,
        state: &Mutex<WorkflowExecution>,
    ) -> TaskResult {
        let mut waiting: Vec<(usize, &Task)> = step.branches.iter().enumerate().collect();
        let mut in_flight = FuturesUnordered::new();
        let mut settled: Vec<(usize, TaskResult)> = Vec::with_capacity(waiting.len());

        loop {
            let mut blocked = Vec::new();
            for (index, branch) in waiting {
                match self.place(branch).await {
                    Some(worker) => {
                        let worker_id = worker.id.clone();
                        let handle = self.spawn_dispatch(worker, branch.clone());
                        in_flight.push(async move {
                            (index, branch.id, self.settle(&worker_id, handle).await)
                        });
                    }
                    None => blocked.push((index, branch)),
                }
            }
            waiting = blocked;
            if !waiting.is_empty() {
                wlog_debug!(
                    "Step '{}': {} branches waiting for a worker",
                    step.id,
                    waiting.len()
                );
            }

            let Some((index, task_id, result)) = in_flight.next().await else {
                break;
            };
            state.lock().await.record_task(task_id, result.status());
            settled.push((index, result));
        }

        for (index, branch) in waiting {
            let result = TaskResult::failure(
                &Error::NoCapableWorker {
                    task: branch.description.clone(),
                }
                .to_string(),
            );
            state.lock().await.record_task(branch.id, result.status());
            settled.push((index, result));
        }

        settled.sort_by_key(|(index, _)| *index);
        let results: Vec<TaskResult> = settled.into_iter().map(|(_, result)| result).collect();
        TaskResult::merge_parallel(&results, results.len())
    }

    /// Acquire the best available worker for `task`.
    async fn place(&self, task: &Task) -> Option<WorkerInfo> {
        for worker in self
            .pool
            .find_candidates(task, self.config.max_candidates)
            .await
        {
            if self.pool.acquire(&worker.id, task.id).await {
                return Some(worker);
            }
        }
        None
    }

    /// Ask reviewers to run the task one at a time and tally their votes.
    async fn run_vote(&self, step: &WorkflowStep, execution_id: ExecutionId) -> TaskResult {
        let topic = step.task.description.clone();
        let config = step.vote.unwrap_or(VoteConfig {
            quorum: self.config.vote_quorum,
            required_majority: self.config.vote_required_majority,
        });

        let reviewers = self.pool.get_by_role(REVIEWER_ROLE).await;
        if reviewers.is_empty() {
            return TaskResult::failure(&Error::VotingNoReviewers { topic }.to_string());
        }

        let mut round = VotingRound::new(&topic, config.quorum, config.required_majority);
        let mut ballots = Vec::new();
        let wanted = config.quorum.max(1);
        for reviewer in reviewers {
            if round.votes.len() >= wanted {
                break;
            }
            if !self.pool.acquire(&reviewer.id, step.task.id).await {
                wlog_debug!("Reviewer {} busy, asking the next one", reviewer.id);
                continue;
            }
            let voter_id = reviewer.id.clone();
            let handle = self.spawn_dispatch(reviewer, step.task.clone());
            let result = self.settle(&voter_id, handle).await;

            let vote = if result.success {
                Vote::approve(&voter_id, result.metrics.confidence, &result.output)
            } else {
                Vote::reject(&voter_id, result.metrics.confidence, &result.errors.join("; "))
            };
            self.emit(OrchestratorEvent::VoteCast {
                execution_id,
                step_id: step.id.clone(),
                voter_id,
                decision: vote.decision,
            });
            round.cast(vote);
            ballots.push(result);
        }

        if round.votes.is_empty() {
            return TaskResult::failure(&Error::VotingNoReviewers { topic }.to_string());
        }

        let mut outcome = TaskResult::aggregate(&ballots);
        outcome.errors.clear();
        if !round.has_quorum() {
            outcome.warnings.push(format!(
                "quorum of {} not reached, decided on {} votes",
                round.quorum,
                round.votes.len()
            ));
        }

        let approvals = round.approvals();
        let total = round.votes.len();
        let decision = round.tally();
        outcome.success = decision == Decision::Approve;
        outcome.metrics.confidence = round.mean_confidence();
        outcome.output = format!(
            "{}: {} ({}/{} approvals)",
            topic,
            if outcome.success { "approved" } else { "rejected" },
            approvals,
            total
        );
        if !outcome.success {
            outcome.errors.push(format!(
                "vote rejected: {}/{} approvals below required majority {:.2}",
                approvals, total, round.required_majority
            ));
        }
        wlog!("Vote on '{}' {:?} with {}/{}", topic, decision, approvals, total);
        outcome
    }

    /// Run `task` on an acquired worker in its own tokio task. The spawned
    /// task releases the worker when the executor returns.
    fn spawn_dispatch(&self, worker: WorkerInfo, task: Task) -> JoinHandle<TaskResult> {
        let pool = Arc::clone(&self.pool);
        let executor = Arc::clone(&self.executor);
        tokio::spawn(async move {
            let result = match executor.execute(&worker, &task).await {
                Ok(result) => result,
                Err(e) => TaskResult::failure(&e.to_string()),
            };
            pool.release(&worker.id, result.success).await;
            result
        })
    }

    async fn settle(&self, worker_id: &str, handle: JoinHandle<TaskResult>) -> TaskResult {
        match handle.await {
            Ok(result) => result,
            Err(e) => {
                wlog_error!("Dispatch on worker {} aborted: {}", worker_id, e);
                self.pool.release(worker_id, false).await;
                TaskResult::failure(&Error::ExecutorFailed(e.to_string()).to_string())
            }
        }
    }

    async fn finish(
        &self,
        execution_id: ExecutionId,
        state: &Mutex<WorkflowExecution>,
        end: WalkEnd,
    ) -> WorkflowRun {
        let mut execution = state.lock().await;
        let mut result = TaskResult::aggregate(execution.ordered_results());

        match end {
            WalkEnd::Finished => execution.finish(ExecutionStatus::Completed, None),
            WalkEnd::StepFailed { step_id, error } => {
                let message = format!("step '{}' failed: {}", step_id, error);
                result.errors.push(message.clone());
                execution.finish(ExecutionStatus::Failed, Some(message));
            }
            WalkEnd::TimedOut(timeout) => {
                let message = Error::WorkflowTimeout(timeout).to_string();
                result.errors.push(message.clone());
                execution.finish(ExecutionStatus::Failed, Some(message));
            }
            WalkEnd::Cancelled => {
                result.errors.push("workflow cancelled".to_string());
                execution.finish(ExecutionStatus::Cancelled, Some("cancelled".to_string()));
            }
        }
        if execution.status != ExecutionStatus::Completed {
            result.success = false;
        }

        let status = execution.status;
        let run = WorkflowRun {
            execution: execution.clone(),
            result,
        };
        drop(execution);

        wlog!(
            "Execution {} finished: {} ({} steps)",
            execution_id.short(),
            status,
            run.execution.completed_steps.len()
        );
        self.retire(execution_id, status).await;
        run
    }

    async fn retire(&self, execution_id: ExecutionId, status: ExecutionStatus) {
        self.live.write().await.remove(&execution_id);
        self.emit(OrchestratorEvent::WorkflowFinished {
            execution_id,
            status,
        });
    }

    /// Cancel a running execution.
    ///
    /// Returns `false` if the execution is unknown or no longer running.
    /// Work already dispatched is left to finish on its own.
    pub async fn cancel_execution(&self, execution_id: &ExecutionId) -> bool {
        let Some(live) = self.live.write().await.remove(execution_id) else {
            return false;
        };
        let mut execution = live.state.lock().await;
        if execution.status != ExecutionStatus::Running {
            return false;
        }
        execution.finish(ExecutionStatus::Cancelled, Some("cancelled".to_string()));
        live.cancel.cancel();
        wlog!("Execution {} cancelled", execution_id.short());
        true
    }

    /// Snapshot of a running execution.
    pub async fn get_execution(&self, execution_id: &ExecutionId) -> Option<WorkflowExecution> {
        let state = {
            let live = self.live.read().await;
            Arc::clone(&live.get(execution_id)?.state)
        };
        let execution = state.lock().await;
        Some(execution.clone())
    }

    pub async fn running_executions(&self) -> Vec<WorkflowExecution> {
        let states: Vec<_> = self
            .live
            .read()
            .await
            .values()
            .map(|live| Arc::clone(&live.state))
            .collect();
        let mut executions = Vec::with_capacity(states.len());
        for state in states {
            executions.push(state.lock().await.clone());
        }
        executions
    }

    pub async fn running_count(&self) -> usize {
        self.live.read().await.len()
    }
}

/// Settle a subtask from the statuses an execution recorded for its task.
fn settle_subtask(subtask: &mut SubTask, execution: &WorkflowExecution) {
    subtask.status = match execution.task_statuses.get(&subtask.id) {
        None => TaskStatus::Pending,
        Some(TaskStatus::Running) if execution.status.is_terminal() => TaskStatus::Failed {
            error: execution
                .error
                .clone()
                .unwrap_or_else(|| execution.status.to_string()),
        },
        Some(status) => status.clone(),
    };
}
