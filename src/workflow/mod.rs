//! Workflow graph definitions and execution state.
//!
//! A workflow is a set of typed steps linked by success and failure
//! transitions. The orchestrator walks it and records progress in a
//! `WorkflowExecution`.

pub mod condition;
mod types;

pub use condition::Condition;
pub use types::{
    ExecutionId, ExecutionStatus, RetryPolicy, StepType, VoteConfig, Workflow, WorkflowExecution,
    WorkflowId, WorkflowStep,
};
