//! End-to-end workflow tests.
//!
//! These tests take a task description all the way through decomposition,
//! workflow synthesis and execution to the aggregated result.

use weft::config::DecomposerConfig;
use weft::core::{Priority, SubTaskType, Task, TaskStatus};
use weft::decompose::Decomposer;
use weft::orchestration::{workflow_from_decomposition, OrchestratorEvent};
use weft::workflow::{ExecutionStatus, StepType};

use crate::fixtures::{generalists, Harness, MockExecutor};

/// Test: Bug fix task runs as a three step chain
/// Given the task "Fix the login timeout bug"
/// When the orchestrator executes it
/// Then investigate, fix and verify run one at a time in that order
/// And the aggregated output concatenates all three outputs in order
#[tokio::test]
async fn test_bug_fix_task_end_to_end() {
    let mut harness = Harness::new(generalists(2), MockExecutor::new());

    let task = Task::new("Fix the login timeout bug");
    let decomposition = harness.orchestrator.decomposer().decompose(&task);
    assert_eq!(decomposition.pattern.as_deref(), Some("bug_fix"));
    assert_eq!(decomposition.subtasks.len(), 3);
    assert_eq!(decomposition.parallel_groups.len(), 3);
    assert!(decomposition.parallel_groups.iter().all(|g| g.len() == 1));

    let result = harness.orchestrator.execute_task(task).await.unwrap();
    assert!(result.success, "errors: {:?}", result.errors);

    let descriptions: Vec<String> = harness
        .executor
        .calls()
        .into_iter()
        .map(|(_, description)| description)
        .collect();
    assert_eq!(
        descriptions,
        vec![
            "Investigate the login timeout bug",
            "Fix the login timeout bug",
            "Verify fix for the login timeout bug",
        ]
    );

    let parts: Vec<&str> = result.output.split("\n\n").collect();
    assert_eq!(parts.len(), 3);
    assert!(parts[0].starts_with("Investigate the login timeout bug"));
    assert!(parts[1].starts_with("Fix the login timeout bug"));
    assert!(parts[2].starts_with("Verify fix for the login timeout bug"));

    assert_eq!(harness.executor.max_running(), 1, "steps must not overlap");
    assert_eq!(result.metrics.tokens_used, 30);

    let step_types: Vec<StepType> = harness
        .drain_events()
        .into_iter()
        .filter_map(|event| match event {
            OrchestratorEvent::StepStarted { step_type, .. } => Some(step_type),
            _ => None,
        })
        .collect();
    assert_eq!(step_types, vec![StepType::Sequential; 3]);
}

/// Test: Feature task fans out its independent subtasks
/// Given a feature task whose test and document subtasks both wait on
/// implementation
/// When the orchestrator executes it
/// Then the last step is parallel and runs both subtasks
#[tokio::test]
async fn test_feature_task_runs_final_group_in_parallel() {
    let harness = Harness::new(generalists(3), MockExecutor::new());
    let task = Task::new("Implement dark mode feature");

    let decomposition = harness.orchestrator.decomposer().decompose(&task);
    let workflow = workflow_from_decomposition(
        &task,
        &decomposition,
        std::time::Duration::from_secs(30),
    )
    .unwrap();
    let types: Vec<StepType> = workflow.steps.iter().map(|s| s.step_type).collect();
    assert_eq!(
        types,
        vec![StepType::Sequential, StepType::Sequential, StepType::Parallel]
    );

    let run = harness.orchestrator.execute_workflow(workflow).await.unwrap();
    assert!(run.result.success);
    assert_eq!(run.execution.completed_steps.len(), 3);
    assert_eq!(harness.executor.call_count(), 4);

    let last = &run.execution.step_results["group-3"];
    assert!(last.output.contains("Test dark mode"));
    assert!(last.output.contains("Document dark mode"));
}

/// Test: Branches of a parallel group share a single worker
/// Given a feature task and a pool of one worker
/// When the orchestrator executes it
/// Then the test and document subtasks both run, one after the other
/// And the final step reports both outputs
#[tokio::test]
async fn test_feature_task_on_one_worker_runs_every_subtask() {
    let harness = Harness::new(generalists(1), MockExecutor::new());

    let run = harness
        .orchestrator
        .run_task(Task::new("Implement dark mode feature"))
        .await
        .unwrap();
    assert!(run.result.success, "errors: {:?}", run.result.errors);
    assert_eq!(harness.executor.call_count(), 4);
    assert_eq!(harness.executor.max_running(), 1);

    let descriptions: Vec<String> = harness
        .executor
        .calls()
        .into_iter()
        .map(|(_, description)| description)
        .collect();
    assert!(descriptions.iter().any(|d| d.starts_with("Test dark mode")));
    assert!(descriptions.iter().any(|d| d.starts_with("Document dark mode")));

    let execution = run.execution.unwrap();
    let last = &execution.step_results["group-3"];
    assert!(last.output.contains("Test dark mode"));
    assert!(last.output.contains("Document dark mode"));
}

/// Test: Subtask statuses follow the run
/// Given a feature task on two workers
/// When it runs to completion
/// Then every subtask is completed
/// And given a bug fix task whose only worker fails
/// Then the first subtask failed and the later ones stayed pending
#[tokio::test]
async fn test_run_task_reports_subtask_statuses() {
    let harness = Harness::new(generalists(2), MockExecutor::new());
    let run = harness
        .orchestrator
        .run_task(Task::new("Implement dark mode feature"))
        .await
        .unwrap();
    assert!(run.result.success);
    assert_eq!(run.decomposition.subtasks.len(), 4);
    assert!(run
        .decomposition
        .subtasks
        .iter()
        .all(|s| s.status == TaskStatus::Completed));

    let harness = Harness::new(generalists(1), MockExecutor::new().failing(&["w1"]));
    let run = harness
        .orchestrator
        .run_task(Task::new("Fix the login timeout bug"))
        .await
        .unwrap();
    assert!(!run.result.success);
    assert_eq!(run.execution.as_ref().map(|e| e.status), Some(ExecutionStatus::Failed));

    let statuses: Vec<(SubTaskType, &TaskStatus)> = run
        .decomposition
        .subtasks
        .iter()
        .map(|s| (s.subtask_type, &s.status))
        .collect();
    assert_eq!(statuses[0].0, SubTaskType::Analysis);
    assert!(matches!(statuses[0].1, TaskStatus::Failed { .. }));
    assert_eq!(statuses[1].1, &TaskStatus::Pending);
    assert_eq!(statuses[2].1, &TaskStatus::Pending);
}

/// Test: Simple tasks skip decomposition
/// Given a task below the complexity threshold
/// When it is executed
/// Then it is dispatched once to a single worker
#[tokio::test]
async fn test_atomic_task_dispatches_directly() {
    let config = DecomposerConfig {
        complexity_threshold: 5.0,
        ..DecomposerConfig::default()
    };
    let decomposer = Decomposer::new(config);
    let task = Task::new("Fix typo").with_priority(Priority::Low);
    assert!(decomposer.decompose(&task).is_atomic());

    let harness = Harness::new(generalists(1), MockExecutor::new());
    let result = harness
        .orchestrator
        .execute_task(Task::new("tidy"))
        .await
        .unwrap();
    assert!(result.success);
    assert_eq!(result.output, "tidy [w1]");
    assert_eq!(harness.orchestrator.running_count().await, 0);
}

/// Test: A failing subtask fails the synthesized workflow
/// Given a bug fix task and a single worker that always fails
/// When it is executed
/// Then the result is unsuccessful and later steps never run
#[tokio::test]
async fn test_failed_subtask_stops_chain() {
    let harness = Harness::new(generalists(1), MockExecutor::new().failing(&["w1"]));
    let result = harness
        .orchestrator
        .execute_task(Task::new("Fix the login timeout bug"))
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(harness.executor.call_count(), 1);
    assert!(result
        .errors
        .iter()
        .any(|e| e.contains("step 'group-1' failed")));
}
