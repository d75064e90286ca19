use thiserror::Error;

use crate::queue::JobId;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("No home directory")]
    NoHomeDir,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Job queue is full (max: {max})")]
    QueueFull { max: usize },

    #[error("Job not found: {id}")]
    JobNotFound { id: JobId },

    #[error("No capable worker for task: {task}")]
    NoCapableWorker { task: String },

    #[error("All {attempted} workers failed: {errors:?}")]
    AllWorkersFailed {
        attempted: usize,
        errors: Vec<String>,
    },

    #[error("Executor failed: {0}")]
    ExecutorFailed(String),

    #[error("Invalid workflow graph: {0}")]
    InvalidWorkflowGraph(String),

    #[error("Workflow timed out after {0:?}")]
    WorkflowTimeout(std::time::Duration),

    #[error("Dependency cycle involving: {0}")]
    DependencyCycle(String),

    #[error("Unresolved dependencies for: {0:?}")]
    UnresolvedDependency(Vec<String>),

    #[error("Maximum concurrent workflows reached (max: {max})")]
    MaxConcurrentWorkflowsReached { max: usize },

    #[error("No reviewers available for vote: {topic}")]
    VotingNoReviewers { topic: String },
}

pub type Result<T> = std::result::Result<T, Error>;
