//! Test fixtures for integration tests.
//!
//! Provides helpers for:
//! - A scripted executor whose outcome depends on the worker
//! - Building an orchestrator over an in-memory worker pool
//! - Predefined worker sets

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use weft::config::{DecomposerConfig, OrchestratorConfig};
use weft::core::{ExecutionMetrics, Task, TaskResult};
use weft::decompose::Decomposer;
use weft::orchestration::{
    InMemoryWorkerPool, Orchestrator, OrchestratorEvent, TaskExecutor, WorkerInfo,
    ANY_CAPABILITY, REVIEWER_ROLE,
};

/// Executor scripted per worker id.
///
/// Workers listed in `failing` return an unsuccessful result; workers in
/// `flaky` fail their first N calls and then succeed. Every call sleeps for
/// `delay`. The executor also tracks how many calls run at once on each
/// worker so tests can check exclusivity.
pub struct MockExecutor {
    failing: HashSet<String>,
    flaky: Mutex<HashMap<String, usize>>,
    delay: Duration,
    calls: Mutex<Vec<(String, String)>>,
    in_flight: Mutex<HashMap<String, usize>>,
    max_overlap_per_worker: AtomicUsize,
    running: AtomicUsize,
    max_running: AtomicUsize,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self {
            failing: HashSet::new(),
            flaky: Mutex::new(HashMap::new()),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            in_flight: Mutex::new(HashMap::new()),
            max_overlap_per_worker: AtomicUsize::new(0),
            running: AtomicUsize::new(0),
            max_running: AtomicUsize::new(0),
        }
    }

    pub fn failing(mut self, workers: &[&str]) -> Self {
        self.failing.extend(workers.iter().map(|w| w.to_string()));
        self
    }

    pub fn flaky(self, worker: &str, failures: usize) -> Self {
        self.flaky
            .lock()
            .unwrap()
            .insert(worker.to_string(), failures);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// (worker id, task description) in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn max_overlap_per_worker(&self) -> usize {
        self.max_overlap_per_worker.load(Ordering::SeqCst)
    }

    pub fn max_running(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }

    fn should_fail(&self, worker_id: &str) -> bool {
        if self.failing.contains(worker_id) {
            return true;
        }
        let mut flaky = self.flaky.lock().unwrap();
        match flaky.get_mut(worker_id) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl TaskExecutor for MockExecutor {
    async fn execute(&self, worker: &WorkerInfo, task: &Task) -> weft::Result<TaskResult> {
        self.calls
            .lock()
            .unwrap()
            .push((worker.id.clone(), task.description.clone()));
        {
            let mut in_flight = self.in_flight.lock().unwrap();
            let count = in_flight.entry(worker.id.clone()).or_insert(0);
            *count += 1;
            self.max_overlap_per_worker.fetch_max(*count, Ordering::SeqCst);
        }
        let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(running, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let fail = self.should_fail(&worker.id);

        self.running.fetch_sub(1, Ordering::SeqCst);
        if let Some(count) = self.in_flight.lock().unwrap().get_mut(&worker.id) {
            *count -= 1;
        }

        let metrics = ExecutionMetrics {
            duration_ms: self.delay.as_millis() as u64,
            tokens_used: 10,
            cost: 0.01,
            confidence: if fail { 0.2 } else { 0.9 },
        };
        if fail {
            Ok(TaskResult::failure(&format!("{} failed {}", worker.id, task.description))
                .with_metrics(metrics))
        } else {
            Ok(TaskResult::success(&format!("{} [{}]", task.description, worker.id))
                .with_metrics(metrics))
        }
    }
}

/// An orchestrator wired to a mock executor and an in-memory pool.
pub struct Harness {
    pub orchestrator: Arc<Orchestrator>,
    pub pool: Arc<InMemoryWorkerPool>,
    pub executor: Arc<MockExecutor>,
    pub event_rx: mpsc::Receiver<OrchestratorEvent>,
}

impl Harness {
    pub fn new(workers: Vec<WorkerInfo>, executor: MockExecutor) -> Self {
        Self::with_config(workers, executor, OrchestratorConfig::default())
    }

    pub fn with_config(
        workers: Vec<WorkerInfo>,
        executor: MockExecutor,
        config: OrchestratorConfig,
    ) -> Self {
        let pool = Arc::new(InMemoryWorkerPool::with_workers(workers));
        let executor = Arc::new(executor);
        let (tx, event_rx) = mpsc::channel(1024);
        let orchestrator = Orchestrator::new(
            config,
            Decomposer::new(DecomposerConfig::default()),
            pool.clone(),
            executor.clone(),
        )
        .with_events(tx);

        Self {
            orchestrator: Arc::new(orchestrator),
            pool,
            executor,
            event_rx,
        }
    }

    /// Drain every event emitted so far.
    pub fn drain_events(&mut self) -> Vec<OrchestratorEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.event_rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Wait until `count` executions are running.
    pub async fn wait_for_running(&self, count: usize) {
        for _ in 0..200 {
            if self.orchestrator.running_count().await == count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("never reached {} running executions", count);
    }
}

/// A worker that can run anything.
pub fn generalist(id: &str) -> WorkerInfo {
    WorkerInfo::new(id, "generalist").with_capability(ANY_CAPABILITY)
}

/// `n` generalists named w1..wn.
pub fn generalists(n: usize) -> Vec<WorkerInfo> {
    (1..=n).map(|i| generalist(&format!("w{}", i))).collect()
}

/// `n` reviewers named r1..rn.
pub fn reviewers(n: usize) -> Vec<WorkerInfo> {
    (1..=n)
        .map(|i| WorkerInfo::new(&format!("r{}", i), REVIEWER_ROLE))
        .collect()
}
