//! Building workflows from decomposition results.

use crate::core::task::Task;
use crate::decompose::DecompositionResult;
use crate::error::{Error, Result};
use crate::workflow::{Workflow, WorkflowStep};
use std::time::Duration;

/// Build a linear workflow mirroring the parallel groups of `decomposition`.
///
/// A group with several members becomes a parallel step with one branch per
/// subtask; a singleton group becomes a sequential step. Steps chain through
/// `on_success`, the first is the entry point and the last the exit point.
/// Unresolved subtasks are not part of any group and are left out.
///
/// # Errors
/// `InvalidWorkflowGraph` if the decomposition has no groups.
pub fn workflow_from_decomposition(
    task: &Task,
    decomposition: &DecompositionResult,
    timeout: Duration,
) -> Result<Workflow> {
    let groups = decomposition.grouped_subtasks();
    let groups: Vec<_> = groups.into_iter().filter(|g| !g.is_empty()).collect();
    if groups.is_empty() {
        return Err(Error::InvalidWorkflowGraph(format!(
            "decomposition of task {} has no executable groups",
            task.id.short()
        )));
    }

    let step_ids: Vec<String> = (0..groups.len()).map(|i| format!("group-{}", i + 1)).collect();
    let mut workflow = Workflow::new(&task.description, &step_ids[0], timeout);
    workflow.exit_points.insert(step_ids[step_ids.len() - 1].clone());

    for (i, members) in groups.iter().enumerate() {
        let mut step = match members.as_slice() {
            [single] => WorkflowStep::sequential(&step_ids[i], single.to_task()),
            many => WorkflowStep::parallel(&step_ids[i], task.clone())
                .with_branches(many.iter().map(|s| s.to_task()).collect()),
        };
        if let Some(next) = step_ids.get(i + 1) {
            step = step.with_on_success(next);
        }
        workflow.steps.push(step);
    }

    Ok(workflow)
}
