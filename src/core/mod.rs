//! Core domain models for task orchestration.
//!
//! This module contains the task and subtask data model, execution results,
//! and the subtask dependency graph used to plan parallel execution.

pub mod dag;
pub mod result;
pub mod task;

pub use dag::{DependencyGraph, Grouping, ParallelGroup};
pub use result::{majority_of, ExecutionMetrics, TaskResult};
pub use task::{Priority, SubTask, SubTaskType, Task, TaskId, TaskStatus};
