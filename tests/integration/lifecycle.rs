//! Execution lifecycle tests.
//!
//! These tests cover retry with backoff, failure routing, the global
//! timeout, cancellation and the concurrent workflow limit.

use std::time::Duration;

use tokio::time::Instant;

use weft::config::OrchestratorConfig;
use weft::core::Task;
use weft::orchestration::OrchestratorEvent;
use weft::workflow::{ExecutionStatus, Workflow, WorkflowStep};
use weft::Error;

use crate::fixtures::{generalists, Harness, MockExecutor};

fn slow_workflow(delay_steps: usize) -> Workflow {
    let mut workflow = Workflow::new("slow", "s1", Duration::from_secs(5));
    for i in 1..=delay_steps {
        let mut step = WorkflowStep::sequential(&format!("s{}", i), Task::new(&format!("step {}", i)));
        if i < delay_steps {
            step = step.with_on_success(&format!("s{}", i + 1));
        }
        workflow = workflow.with_step(step);
    }
    workflow.with_exit(&format!("s{}", delay_steps))
}

/// Test: Retry with linear backoff
/// Given a worker that fails twice and a step allowing 2 retries
/// When the workflow runs
/// Then the third attempt succeeds after 10ms and 20ms backoffs
#[tokio::test(start_paused = true)]
async fn test_retry_recovers_with_linear_backoff() {
    let mut harness = Harness::new(generalists(1), MockExecutor::new().flaky("w1", 2));
    let workflow = Workflow::new("retry", "flaky", Duration::from_secs(5))
        .with_step(WorkflowStep::sequential("flaky", Task::new("deploy")).with_retry(2, 10))
        .with_exit("flaky");

    let started = Instant::now();
    let run = harness.orchestrator.execute_workflow(workflow).await.unwrap();
    assert_eq!(run.execution.status, ExecutionStatus::Completed);
    assert!(run.result.success);
    assert_eq!(harness.executor.call_count(), 3);
    assert!(started.elapsed() >= Duration::from_millis(30));

    let delays: Vec<(u32, Duration)> = harness
        .drain_events()
        .into_iter()
        .filter_map(|event| match event {
            OrchestratorEvent::StepRetrying { attempt, delay, .. } => Some((attempt, delay)),
            _ => None,
        })
        .collect();
    assert_eq!(
        delays,
        vec![(1, Duration::from_millis(10)), (2, Duration::from_millis(20))]
    );
}

/// Test: Exhausted retries fail the workflow
#[tokio::test]
async fn test_retries_exhausted() {
    let harness = Harness::new(generalists(1), MockExecutor::new().flaky("w1", 5));
    let workflow = Workflow::new("retry", "flaky", Duration::from_secs(5))
        .with_step(WorkflowStep::sequential("flaky", Task::new("deploy")).with_retry(1, 5))
        .with_exit("flaky");

    let run = harness.orchestrator.execute_workflow(workflow).await.unwrap();
    assert_eq!(run.execution.status, ExecutionStatus::Failed);
    assert_eq!(harness.executor.call_count(), 2);
    assert!(run.execution.error.unwrap().contains("step 'flaky' failed"));
}

/// Test: Failure routing
/// Given a failing step with an on_failure target
/// When it fails
/// Then the walk continues at the target instead of failing
#[tokio::test]
async fn test_on_failure_routes_to_recovery_step() {
    let harness = Harness::new(generalists(1), MockExecutor::new().flaky("w1", 1));
    let workflow = Workflow::new("route", "build", Duration::from_secs(5))
        .with_step(
            WorkflowStep::sequential("build", Task::new("build"))
                .with_on_failure("rollback")
                .with_retry(3, 5),
        )
        .with_step(WorkflowStep::sequential("rollback", Task::new("rollback")))
        .with_exit("rollback");

    let run = harness.orchestrator.execute_workflow(workflow).await.unwrap();
    assert_eq!(run.execution.status, ExecutionStatus::Completed);
    assert_eq!(run.execution.completed_steps, vec!["build", "rollback"]);
    // routing takes precedence over retrying
    assert_eq!(harness.executor.call_count(), 2);
    assert!(run.execution.step_results["rollback"].success);
    assert!(!run.result.success);
}

/// Test: Global timeout
/// Given a workflow with a 10ms timeout and steps taking 50ms each
/// When it runs
/// Then it ends failed with a timeout, never completed
/// And the in-flight worker is still released afterwards
#[tokio::test(start_paused = true)]
async fn test_workflow_timeout() {
    let harness = Harness::new(
        generalists(1),
        MockExecutor::new().with_delay(Duration::from_millis(50)),
    );
    let mut workflow = slow_workflow(3);
    workflow.timeout_ms = 10;

    let run = harness.orchestrator.execute_workflow(workflow).await.unwrap();
    assert_eq!(run.execution.status, ExecutionStatus::Failed);
    assert!(!run.result.success);
    let expected = Error::WorkflowTimeout(Duration::from_millis(10)).to_string();
    assert_eq!(run.execution.error.as_deref(), Some(expected.as_str()));
    assert!(run.execution.completed_steps.is_empty());
    assert_eq!(harness.orchestrator.running_count().await, 0);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(harness.pool.busy_count().await, 0);
    assert_eq!(harness.executor.call_count(), 1);
}

/// Test: Cancellation
/// Given a running workflow
/// When it is cancelled
/// Then it ends cancelled, is dropped from the live table, and a second
/// cancel is a no-op
#[tokio::test]
async fn test_cancel_running_execution() {
    let harness = Harness::new(
        generalists(1),
        MockExecutor::new().with_delay(Duration::from_millis(100)),
    );
    let orchestrator = harness.orchestrator.clone();
    let handle = tokio::spawn(async move { orchestrator.execute_workflow(slow_workflow(3)).await });

    harness.wait_for_running(1).await;
    let running = harness.orchestrator.running_executions().await;
    let id = running[0].id;
    assert_eq!(running[0].status, ExecutionStatus::Running);
    assert!(harness.orchestrator.get_execution(&id).await.is_some());

    assert!(harness.orchestrator.cancel_execution(&id).await);
    assert!(!harness.orchestrator.cancel_execution(&id).await);
    assert!(harness.orchestrator.get_execution(&id).await.is_none());

    let run = handle.await.unwrap().unwrap();
    assert_eq!(run.execution.status, ExecutionStatus::Cancelled);
    assert!(!run.result.success);
    assert!(run.execution.completed_steps.len() < 3);
}

/// Test: Concurrent workflow limit
/// Given a limit of 1 running workflow
/// When a second workflow starts while the first runs
/// Then it is rejected, and accepted again once the first finishes
#[tokio::test]
async fn test_max_concurrent_workflows() {
    let config = OrchestratorConfig {
        max_concurrent_workflows: 1,
        ..OrchestratorConfig::default()
    };
    let harness = Harness::with_config(
        generalists(2),
        MockExecutor::new().with_delay(Duration::from_millis(50)),
        config,
    );

    let orchestrator = harness.orchestrator.clone();
    let first = tokio::spawn(async move { orchestrator.execute_workflow(slow_workflow(1)).await });
    harness.wait_for_running(1).await;

    let rejected = harness.orchestrator.execute_workflow(slow_workflow(1)).await;
    assert!(matches!(
        rejected,
        Err(Error::MaxConcurrentWorkflowsReached { max: 1 })
    ));

    assert!(first.await.unwrap().unwrap().result.success);
    let again = harness
        .orchestrator
        .execute_workflow(slow_workflow(1))
        .await
        .unwrap();
    assert!(again.result.success);
}
