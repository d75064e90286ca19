//! Task decomposition into dependency-linked subtasks.
//!
//! The `Decomposer` scores a task, picks the first matching pattern from its
//! strategy table (falling back to a generic chain for very complex tasks),
//! and partitions the resulting subtasks into parallel groups.

pub mod complexity;
pub mod patterns;

pub use patterns::{builtin_patterns, DecompositionPattern};

use crate::config::DecomposerConfig;
use crate::core::dag::{DependencyGraph, ParallelGroup};
use crate::core::task::{SubTask, Task, TaskId};
use crate::{wlog, wlog_debug, wlog_warn};

/// Name reported when the generic fallback chain is used.
pub const GENERIC_PATTERN: &str = "generic";

/// Headroom above the threshold required before the generic fallback applies.
pub const GENERIC_FALLBACK_MARGIN: f64 = 2.0;

/// Outcome of decomposing one task.
#[derive(Debug, Clone)]
pub struct DecompositionResult {
    pub task_id: TaskId,
    pub complexity: f64,
    /// Name of the pattern that produced the subtasks, if any.
    pub pattern: Option<String>,
    pub subtasks: Vec<SubTask>,
    pub dependency_graph: DependencyGraph,
    pub parallel_groups: Vec<ParallelGroup>,
    /// Subtasks left out of every group because their dependencies could
    /// not be satisfied.
    pub unresolved: Vec<TaskId>,
    pub estimated_minutes: u32,
}

impl DecompositionResult {
    fn atomic(task: &Task, complexity: f64) -> Self {
        Self {
            task_id: task.id,
            complexity,
            pattern: None,
            subtasks: Vec::new(),
            dependency_graph: DependencyGraph::new(),
            parallel_groups: Vec::new(),
            unresolved: Vec::new(),
            estimated_minutes: 0,
        }
    }

    /// True when the task should run as a single unit.
    pub fn is_atomic(&self) -> bool {
        self.subtasks.is_empty()
    }

    pub fn subtask(&self, id: &TaskId) -> Option<&SubTask> {
        self.subtasks.iter().find(|s| s.id == *id)
    }

    /// Subtasks of each group, in group order.
    pub fn grouped_subtasks(&self) -> Vec<Vec<&SubTask>> {
        self.parallel_groups
            .iter()
            .map(|group| {
                group
                    .subtask_ids
                    .iter()
                    .filter_map(|id| self.subtask(id))
                    .collect()
            })
            .collect()
    }
}

/// Breaks tasks into subtasks using a priority-ordered strategy table.
pub struct Decomposer {
    config: DecomposerConfig,
    patterns: Vec<DecompositionPattern>,
}

impl Decomposer {
    /// Create a decomposer with the built-in patterns.
    pub fn new(config: DecomposerConfig) -> Self {
        let mut decomposer = Self::without_patterns(config);
        for pattern in builtin_patterns() {
            decomposer.register_pattern(pattern);
        }
        decomposer
    }

    /// Create a decomposer with an empty strategy table.
    pub fn without_patterns(config: DecomposerConfig) -> Self {
        Self {
            config,
            patterns: Vec::new(),
        }
    }

    pub fn config(&self) -> &DecomposerConfig {
        &self.config
    }

    /// Register a pattern. Patterns with equal priority keep registration order.
    pub fn register_pattern(&mut self, pattern: DecompositionPattern) {
        let at = self
            .patterns
            .partition_point(|existing| existing.priority() >= pattern.priority());
        self.patterns.insert(at, pattern);
    }

    /// Pattern names in the order they are tried.
    pub fn pattern_names(&self) -> Vec<&str> {
        self.patterns.iter().map(DecompositionPattern::name).collect()
    }

    /// Score a task on the 0-10 complexity scale.
    pub fn complexity(&self, task: &Task) -> f64 {
        complexity::score(task)
    }

    /// Decompose `task`.
    ///
    /// Returns an atomic result (no subtasks) when the task scores below the
    /// threshold or nothing applies.
    pub fn decompose(&self, task: &Task) -> DecompositionResult {
        let complexity = self.complexity(task);
        let threshold = self.config.complexity_threshold;

        if complexity < threshold {
            wlog_debug!(
                "Task {} complexity {:.2} below threshold {:.2}, running atomically",
                task.id.short(),
                complexity,
                threshold
            );
            return DecompositionResult::atomic(task, complexity);
        }

        let (pattern, mut subtasks) = match self.apply_patterns(task) {
            Some(found) => found,
            None if complexity > threshold + GENERIC_FALLBACK_MARGIN => {
                (GENERIC_PATTERN.to_string(), patterns::generic(task))
            }
            None => {
                wlog_debug!(
                    "No pattern matched task {} (complexity {:.2})",
                    task.id.short(),
                    complexity
                );
                return DecompositionResult::atomic(task, complexity);
            }
        };

        if subtasks.len() > self.config.max_subtasks {
            wlog_debug!(
                "Truncating {} subtasks to {}",
                subtasks.len(),
                self.config.max_subtasks
            );
            subtasks.truncate(self.config.max_subtasks);
        }

        let dependency_graph = DependencyGraph::from_subtasks(&subtasks);
        if let Err(e) = dependency_graph.validate() {
            wlog_warn!("Pattern '{}' produced an invalid graph: {}", pattern, e);
        }
        let grouping = dependency_graph.parallel_groups();
        let estimated_minutes =
            grouping.groups.len() as u32 * self.config.subtask_base_minutes;

        wlog!(
            "Decomposed task {} via '{}': {} subtasks in {} groups (complexity {:.2})",
            task.id.short(),
            pattern,
            subtasks.len(),
            grouping.groups.len(),
            complexity
        );

        DecompositionResult {
            task_id: task.id,
            complexity,
            pattern: Some(pattern),
            subtasks,
            dependency_graph,
            parallel_groups: grouping.groups,
            unresolved: grouping.unresolved,
            estimated_minutes,
        }
    }

    /// First pattern that matches and yields at least one subtask.
    fn apply_patterns(&self, task: &Task) -> Option<(String, Vec<SubTask>)> {
        self.patterns
            .iter()
            .filter(|pattern| pattern.matches(task))
            .find_map(|pattern| {
                let subtasks = pattern.generate(task);
                if subtasks.is_empty() {
                    None
                } else {
                    Some((pattern.name().to_string(), subtasks))
                }
            })
    }
}

impl Default for Decomposer {
    fn default() -> Self {
        Self::new(DecomposerConfig::default())
    }
}
