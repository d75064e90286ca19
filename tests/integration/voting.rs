//! Vote step tests.

use std::time::Duration;

use weft::core::{Task, TaskId};
use weft::orchestration::{Decision, OrchestratorEvent, WorkerPool};
use weft::workflow::{ExecutionStatus, Workflow, WorkflowStep};

use crate::fixtures::{generalists, reviewers, Harness, MockExecutor};

fn review_workflow() -> Workflow {
    Workflow::new("review", "vote", Duration::from_secs(5))
        .with_step(WorkflowStep::vote("vote", Task::new("Ship release 1.4")).with_vote(5, 0.6))
        .with_exit("vote")
}

/// Test: Three of five approvals passes a 60% vote
/// Given 5 reviewers of which 2 reject
/// When the vote step runs
/// Then the decision is approved
#[tokio::test]
async fn test_three_of_five_approves() {
    let mut harness = Harness::new(reviewers(5), MockExecutor::new().failing(&["r4", "r5"]));

    let run = harness
        .orchestrator
        .execute_workflow(review_workflow())
        .await
        .unwrap();
    assert_eq!(run.execution.status, ExecutionStatus::Completed);
    assert!(run.result.success);
    assert!(run.result.output.contains("approved (3/5 approvals)"));

    let votes: Vec<Decision> = harness
        .drain_events()
        .into_iter()
        .filter_map(|event| match event {
            OrchestratorEvent::VoteCast { decision, .. } => Some(decision),
            _ => None,
        })
        .collect();
    assert_eq!(votes.len(), 5);
    assert_eq!(votes.iter().filter(|d| **d == Decision::Approve).count(), 3);
}

/// Test: Two of five approvals fails a 60% vote
/// Given 5 reviewers of which 3 reject
/// When the vote step runs
/// Then the decision is rejected and the workflow fails
#[tokio::test]
async fn test_two_of_five_rejects() {
    let harness = Harness::new(
        reviewers(5),
        MockExecutor::new().failing(&["r3", "r4", "r5"]),
    );

    let run = harness
        .orchestrator
        .execute_workflow(review_workflow())
        .await
        .unwrap();
    assert_eq!(run.execution.status, ExecutionStatus::Failed);
    assert!(!run.result.success);
    assert!(run
        .result
        .errors
        .iter()
        .any(|e| e.contains("2/5 approvals below required majority")));
}

/// Test: Vote without reviewers fails
/// Given a pool with no reviewer-role workers
/// When the vote step runs
/// Then it fails with no reviewers
#[tokio::test]
async fn test_vote_without_reviewers() {
    let harness = Harness::new(generalists(3), MockExecutor::new());

    let run = harness
        .orchestrator
        .execute_workflow(review_workflow())
        .await
        .unwrap();
    assert_eq!(run.execution.status, ExecutionStatus::Failed);
    assert!(run
        .result
        .errors
        .iter()
        .any(|e| e.contains("No reviewers available")));
    assert_eq!(harness.executor.call_count(), 0);
}

/// Test: Short of quorum still decides
/// Given 2 reviewers and a quorum of 5
/// When both approve
/// Then the vote passes with a quorum warning
#[tokio::test]
async fn test_vote_below_quorum_warns() {
    let harness = Harness::new(reviewers(2), MockExecutor::new());

    let run = harness
        .orchestrator
        .execute_workflow(review_workflow())
        .await
        .unwrap();
    assert!(run.result.success);
    assert!(run
        .result
        .warnings
        .iter()
        .any(|w| w.contains("quorum of 5 not reached")));
}

/// Test: A busy reviewer is replaced by the next one
/// Given 4 reviewers, a quorum of 3 and r1 busy with other work
/// When the vote step runs
/// Then r2, r3 and r4 vote and quorum is reached without a warning
#[tokio::test]
async fn test_busy_reviewer_does_not_cost_quorum() {
    let mut harness = Harness::new(reviewers(4), MockExecutor::new());
    assert!(harness.pool.acquire("r1", TaskId::new()).await);

    let workflow = Workflow::new("review", "vote", Duration::from_secs(5))
        .with_step(WorkflowStep::vote("vote", Task::new("Ship release 1.5")).with_vote(3, 0.6))
        .with_exit("vote");
    let run = harness.orchestrator.execute_workflow(workflow).await.unwrap();

    assert!(run.result.success);
    assert!(run.result.output.contains("approved (3/3 approvals)"));
    assert!(run.result.warnings.is_empty(), "warnings: {:?}", run.result.warnings);

    let voters: Vec<String> = harness
        .drain_events()
        .into_iter()
        .filter_map(|event| match event {
            OrchestratorEvent::VoteCast { voter_id, .. } => Some(voter_id),
            _ => None,
        })
        .collect();
    assert_eq!(voters, vec!["r2", "r3", "r4"]);
    assert!(harness.pool.current_task("r1").await.is_some());
}
