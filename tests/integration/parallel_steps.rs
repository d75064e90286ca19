//! Parallel step correctness tests.
//!
//! These tests verify majority merging and that a worker never runs two
//! tasks at once, even with several workflows in flight.

use std::time::Duration;

use futures::future::join_all;
use weft::core::Task;
use weft::workflow::{ExecutionStatus, Workflow, WorkflowStep};

use crate::fixtures::{generalists, Harness, MockExecutor};

fn fan_out(width: usize) -> Workflow {
    Workflow::new("fan-out", "review", Duration::from_secs(5))
        .with_step(WorkflowStep::parallel("review", Task::new("audit")).with_parallelism(width))
        .with_exit("review")
}

/// Test: Two of four successes is a majority
/// Given 4 workers of which 2 fail
/// When a parallel step fans out to 4
/// Then the step succeeds with the 2 successful outputs merged
#[tokio::test]
async fn test_two_of_four_succeeds() {
    let harness = Harness::new(generalists(4), MockExecutor::new().failing(&["w3", "w4"]));

    let run = harness.orchestrator.execute_workflow(fan_out(4)).await.unwrap();
    assert_eq!(run.execution.status, ExecutionStatus::Completed);
    assert!(run.result.success);
    assert_eq!(harness.executor.call_count(), 4);

    let step = &run.execution.step_results["review"];
    assert_eq!(step.output, "audit [w1]\n\naudit [w2]");
    assert_eq!(step.metrics.tokens_used, 40);
    assert!((step.metrics.confidence - 0.55).abs() < 1e-9);
}

/// Test: One of four successes is not a majority
/// Given 4 workers of which 3 fail
/// When a parallel step fans out to 4
/// Then the step and the workflow fail
#[tokio::test]
async fn test_one_of_four_fails() {
    let harness = Harness::new(
        generalists(4),
        MockExecutor::new().failing(&["w2", "w3", "w4"]),
    );

    let run = harness.orchestrator.execute_workflow(fan_out(4)).await.unwrap();
    assert_eq!(run.execution.status, ExecutionStatus::Failed);
    assert!(!run.result.success);
    assert!(run
        .result
        .errors
        .iter()
        .any(|e| e.contains("needed 2 successes, got 1 of 4")));
}

/// Test: Parallel dispatch overlaps in time
/// Given 4 workers that each take 50ms
/// When a parallel step fans out to 4
/// Then all 4 run at once and the step takes about 50ms, not 200ms
#[tokio::test(start_paused = true)]
async fn test_parallel_dispatch_overlaps() {
    let harness = Harness::new(
        generalists(4),
        MockExecutor::new().with_delay(Duration::from_millis(50)),
    );

    let started = tokio::time::Instant::now();
    let run = harness.orchestrator.execute_workflow(fan_out(4)).await.unwrap();
    assert!(run.result.success);
    assert_eq!(harness.executor.max_running(), 4);
    assert!(started.elapsed() < Duration::from_millis(100));
    assert_eq!(run.execution.step_results["review"].metrics.duration_ms, 50);
}

/// Test: Fan-out is capped by available workers
/// Given 2 workers and a step asking for 3
/// When it runs
/// Then both workers run and the majority is taken over 2
#[tokio::test]
async fn test_fan_out_limited_by_pool() {
    let harness = Harness::new(generalists(2), MockExecutor::new().failing(&["w2"]));

    let run = harness.orchestrator.execute_workflow(fan_out(3)).await.unwrap();
    assert!(run.result.success);
    assert_eq!(harness.executor.call_count(), 2);
}

/// Test: Workers are exclusive across concurrent workflows
/// Given 3 workers and 4 workflows that each fan out to 3
/// When they all run at once
/// Then no worker ever runs two tasks at the same time
/// And every worker is idle afterwards
#[tokio::test]
async fn test_workers_exclusive_across_workflows() {
    let harness = Harness::new(
        generalists(3),
        MockExecutor::new().with_delay(Duration::from_millis(20)),
    );

    let runs = join_all((0..4).map(|_| {
        let orchestrator = harness.orchestrator.clone();
        tokio::spawn(async move { orchestrator.execute_workflow(fan_out(3)).await })
    }))
    .await;

    for run in runs {
        let run = run.unwrap().unwrap();
        assert!(run.execution.status.is_terminal());
    }
    assert_eq!(harness.executor.max_overlap_per_worker(), 1);
    assert!(harness.executor.max_running() <= 3);
    assert_eq!(harness.pool.busy_count().await, 0);
}
