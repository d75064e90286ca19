//! Task data model shared by the decomposer, the orchestrator and the queue.
//!
//! A `Task` is one unit of requested work. The decomposer breaks a task into
//! `SubTask`s linked by explicit dependency ids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// Unique identifier for a task or subtask.
///
/// Uses UUID v4 for generation and provides a short form display
/// for human-readable output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub Uuid);

impl TaskId {
    /// Create a new unique task identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Return first 8 characters of the UUID for display.
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Ranked priority shared by tasks, subtasks and queued jobs.
///
/// Variants are declared lowest first so the derived `Ord` ranks
/// `Critical` highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Background,
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

impl Priority {
    /// One rank lower; `Background` is the floor.
    pub fn demote(self) -> Self {
        match self {
            Priority::Critical => Priority::High,
            Priority::High => Priority::Normal,
            Priority::Normal => Priority::Low,
            Priority::Low | Priority::Background => Priority::Background,
        }
    }

    /// Scale factor applied to a task's raw complexity score.
    pub fn complexity_multiplier(self) -> f64 {
        match self {
            Priority::Critical => 1.5,
            Priority::High => 1.2,
            Priority::Normal => 1.0,
            Priority::Low | Priority::Background => 0.8,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Background => write!(f, "background"),
            Priority::Low => write!(f, "low"),
            Priority::Normal => write!(f, "normal"),
            Priority::High => write!(f, "high"),
            Priority::Critical => write!(f, "critical"),
        }
    }
}

/// Task status in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum TaskStatus {
    /// Task created but not yet dispatched.
    #[default]
    Pending,
    /// Task is currently being executed by a worker.
    Running,
    /// Task completed successfully.
    Completed,
    /// Task failed with an error.
    Failed {
        /// Error message describing the failure.
        error: String,
    },
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed { error } => write!(f, "failed: {}", error),
        }
    }
}

/// A unit of requested work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier for this task.
    pub id: TaskId,
    /// What the task should accomplish.
    pub description: String,
    pub priority: Priority,
    /// Free-form context. `files` and `requirements` arrays feed the
    /// complexity score.
    #[serde(default)]
    pub context: HashMap<String, Value>,
    /// Capabilities a worker should have to take this task.
    #[serde(default)]
    pub capabilities: Vec<String>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create a pending task with normal priority.
    pub fn new(description: &str) -> Self {
        Self {
            id: TaskId::new(),
            description: description.to_string(),
            priority: Priority::Normal,
            context: HashMap::new(),
            capabilities: Vec::new(),
            status: TaskStatus::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_context(mut self, key: &str, value: Value) -> Self {
        self.context.insert(key.to_string(), value);
        self
    }

    pub fn with_capability(mut self, capability: &str) -> Self {
        self.capabilities.push(capability.to_string());
        self
    }

    /// Number of entries in the `files` context array.
    pub fn file_count(&self) -> usize {
        self.context_array_len("files")
    }

    /// Number of entries in the `requirements` context array.
    pub fn requirement_count(&self) -> usize {
        self.context_array_len("requirements")
    }

    /// String entries of the `files` context array.
    pub fn context_files(&self) -> Vec<String> {
        self.context
            .get("files")
            .and_then(Value::as_array)
            .map(|files| {
                files
                    .iter()
                    .filter_map(|f| f.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn context_array_len(&self, key: &str) -> usize {
        self.context
            .get(key)
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn start(&mut self) {
        self.status = TaskStatus::Running;
    }

    pub fn complete(&mut self) {
        self.status = TaskStatus::Completed;
    }

    pub fn fail(&mut self, error: &str) {
        self.status = TaskStatus::Failed {
            error: error.to_string(),
        };
    }

    /// Check if the task is in a terminal state (Completed or Failed).
    pub fn is_finished(&self) -> bool {
        matches!(
            self.status,
            TaskStatus::Completed | TaskStatus::Failed { .. }
        )
    }
}

/// Kind of work a subtask represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubTaskType {
    Analysis,
    Research,
    Design,
    Planning,
    Implementation,
    Testing,
    Documentation,
    Review,
}

impl SubTaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubTaskType::Analysis => "analysis",
            SubTaskType::Research => "research",
            SubTaskType::Design => "design",
            SubTaskType::Planning => "planning",
            SubTaskType::Implementation => "implementation",
            SubTaskType::Testing => "testing",
            SubTaskType::Documentation => "documentation",
            SubTaskType::Review => "review",
        }
    }
}

impl std::fmt::Display for SubTaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A piece of a decomposed task.
///
/// Created once by the decomposer; only the orchestrator step that owns it
/// mutates its status afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubTask {
    pub id: TaskId,
    pub parent_id: TaskId,
    pub description: String,
    pub subtask_type: SubTaskType,
    /// Inherited from the parent unless overridden.
    pub priority: Priority,
    /// Subtasks that must complete before this one starts.
    pub dependencies: Vec<TaskId>,
    pub status: TaskStatus,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl SubTask {
    /// Create a subtask of `parent` with no dependencies.
    pub fn new(parent: &Task, description: &str, subtask_type: SubTaskType) -> Self {
        Self {
            id: TaskId::new(),
            parent_id: parent.id,
            description: description.to_string(),
            subtask_type,
            priority: parent.priority,
            dependencies: Vec::new(),
            status: TaskStatus::Pending,
            metadata: HashMap::new(),
        }
    }

    /// Add a dependency on `id`. Self references and duplicates are ignored.
    pub fn depends_on(mut self, id: TaskId) -> Self {
        if id != self.id && !self.dependencies.contains(&id) {
            self.dependencies.push(id);
        }
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Build the task a worker receives for this subtask.
    ///
    /// The subtask type becomes the required capability and the parent
    /// id is kept in the context.
    pub fn to_task(&self) -> Task {
        let mut task = Task::new(&self.description)
            .with_priority(self.priority)
            .with_capability(self.subtask_type.as_str())
            .with_context("parent_id", Value::String(self.parent_id.to_string()))
            .with_context("subtask_type", Value::String(self.subtask_type.to_string()));
        task.id = self.id;
        task.context
            .extend(self.metadata.iter().map(|(k, v)| (k.clone(), v.clone())));
        task
    }
}
