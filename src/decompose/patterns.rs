//! Decomposition strategy table.
//!
//! A pattern pairs a predicate over the task with a generator producing
//! subtasks whose `dependencies` are already set. The decomposer tries
//! patterns in descending priority and the first one that yields at least
//! one subtask wins.

use crate::core::task::{SubTask, SubTaskType, Task};
use regex::Regex;
use serde_json::json;
use std::collections::HashSet;
use std::sync::LazyLock;

/// File paths with a known source or config extension.
static FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:[\w.-]+/)*[\w-]+\.(?:rs|ts|tsx|js|jsx|py|go|java|rb|c|cc|cpp|h|hpp|cs|swift|kt|md|toml|json|ya?ml|sql|css|html)\b",
    )
    .unwrap()
});

/// Lines of the form `1. do something` or `2) do something`.
static NUMBERED_STEP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*\d+[.)]\s+(.+?)\s*$").unwrap());

static BUG_FIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:fix|debug|resolve)\s+(.+)").unwrap());

/// "implement X" captures X; a bare "feature" mention matches without a subject.
static FEATURE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bimplement\s+(.+)|\bfeature\b").unwrap());

static REFACTOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\brefactor(?:s|ed|ing)?\b").unwrap());

static INTEGRATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bintegrat\w*\b.*?\bwith\s+(.+)").unwrap());

pub type Predicate = Box<dyn Fn(&Task) -> bool + Send + Sync>;
pub type Generator = Box<dyn Fn(&Task) -> Vec<SubTask> + Send + Sync>;

/// A named (predicate, generator, priority) strategy.
pub struct DecompositionPattern {
    name: String,
    priority: u32,
    predicate: Predicate,
    generator: Generator,
}

impl DecompositionPattern {
    pub fn new<P, G>(name: &str, priority: u32, predicate: P, generator: G) -> Self
    where
        P: Fn(&Task) -> bool + Send + Sync + 'static,
        G: Fn(&Task) -> Vec<SubTask> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            priority,
            predicate: Box::new(predicate),
            generator: Box::new(generator),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Higher priorities are tried first.
    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn matches(&self, task: &Task) -> bool {
        (self.predicate)(task)
    }

    pub fn generate(&self, task: &Task) -> Vec<SubTask> {
        (self.generator)(task)
    }
}

impl std::fmt::Debug for DecompositionPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecompositionPattern")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish()
    }
}

/// Build subtasks from `(description, type, dependency indices)` entries.
///
/// Indices refer to earlier entries only, so the result is acyclic.
pub fn plan(parent: &Task, steps: &[(String, SubTaskType, &[usize])]) -> Vec<SubTask> {
    let mut subtasks: Vec<SubTask> = Vec::with_capacity(steps.len());
    for (description, subtask_type, deps) in steps {
        let mut subtask = SubTask::new(parent, description, *subtask_type);
        for &index in deps.iter().filter(|&&i| i < subtasks.len()) {
            subtask = subtask.depends_on(subtasks[index].id);
        }
        subtasks.push(subtask);
    }
    subtasks
}

/// Build a strictly sequential chain: each subtask depends on the previous.
pub fn chain(parent: &Task, steps: &[(String, SubTaskType)]) -> Vec<SubTask> {
    let mut subtasks: Vec<SubTask> = Vec::with_capacity(steps.len());
    for (description, subtask_type) in steps {
        let mut subtask = SubTask::new(parent, description, *subtask_type);
        if let Some(previous) = subtasks.last() {
            subtask = subtask.depends_on(previous.id);
        }
        subtasks.push(subtask);
    }
    subtasks
}

/// Files named in the description or the `files` context, deduplicated.
fn listed_files(task: &Task) -> Vec<String> {
    let mut seen = HashSet::new();
    FILE_RE
        .find_iter(&task.description)
        .map(|m| m.as_str().to_string())
        .chain(task.context_files())
        .filter(|file| seen.insert(file.clone()))
        .collect()
}

fn numbered_steps(task: &Task) -> Vec<String> {
    NUMBERED_STEP_RE
        .captures_iter(&task.description)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Text following the pattern's verb, or the whole description.
fn subject(re: &Regex, task: &Task) -> String {
    re.captures(&task.description)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(&task.description)
        .trim()
        .trim_end_matches('.')
        .to_string()
}

fn multi_file() -> DecompositionPattern {
    DecompositionPattern::new(
        "multi_file",
        100,
        |task| listed_files(task).len() >= 2,
        |task| {
            listed_files(task)
                .into_iter()
                .map(|file| {
                    SubTask::new(task, &format!("Update {}", file), SubTaskType::Implementation)
                        .with_metadata("file", json!(file))
                })
                .collect()
        },
    )
}

fn numbered_list() -> DecompositionPattern {
    DecompositionPattern::new(
        "numbered_steps",
        90,
        |task| numbered_steps(task).len() >= 2,
        |task| {
            let steps: Vec<(String, SubTaskType)> = numbered_steps(task)
                .into_iter()
                .map(|step| (step, SubTaskType::Implementation))
                .collect();
            chain(task, &steps)
                .into_iter()
                .enumerate()
                .map(|(i, sub)| sub.with_metadata("step", json!(i + 1)))
                .collect()
        },
    )
}

fn bug_fix() -> DecompositionPattern {
    DecompositionPattern::new(
        "bug_fix",
        80,
        |task| BUG_FIX_RE.is_match(&task.description),
        |task| {
            let target = subject(&BUG_FIX_RE, task);
            chain(
                task,
                &[
                    (format!("Investigate {}", target), SubTaskType::Analysis),
                    (format!("Fix {}", target), SubTaskType::Implementation),
                    (format!("Verify fix for {}", target), SubTaskType::Testing),
                ],
            )
        },
    )
}

fn feature() -> DecompositionPattern {
    DecompositionPattern::new(
        "feature",
        70,
        |task| FEATURE_RE.is_match(&task.description),
        |task| {
            let target = subject(&FEATURE_RE, task);
            // Testing and documentation both wait on implementation only.
            let steps: [(String, SubTaskType, &[usize]); 4] = [
                (format!("Design {}", target), SubTaskType::Design, &[]),
                (format!("Implement {}", target), SubTaskType::Implementation, &[0]),
                (format!("Test {}", target), SubTaskType::Testing, &[1]),
                (format!("Document {}", target), SubTaskType::Documentation, &[1]),
            ];
            plan(task, &steps)
        },
    )
}

fn refactor() -> DecompositionPattern {
    DecompositionPattern::new(
        "refactor",
        60,
        |task| REFACTOR_RE.is_match(&task.description),
        |task| {
            let target = task.description.trim().trim_end_matches('.').to_string();
            chain(
                task,
                &[
                    (format!("Analyze current structure: {}", target), SubTaskType::Analysis),
                    (format!("Plan refactoring: {}", target), SubTaskType::Planning),
                    (format!("Execute refactoring: {}", target), SubTaskType::Implementation),
                    (format!("Test refactored code: {}", target), SubTaskType::Testing),
                ],
            )
        },
    )
}

fn integration() -> DecompositionPattern {
    DecompositionPattern::new(
        "integration",
        50,
        |task| INTEGRATE_RE.is_match(&task.description),
        |task| {
            let target = subject(&INTEGRATE_RE, task);
            let steps: [(String, SubTaskType, &[usize]); 5] = [
                (format!("Research {} API", target), SubTaskType::Research, &[]),
                (format!("Design {} integration", target), SubTaskType::Design, &[0]),
                (format!("Implement {} client", target), SubTaskType::Implementation, &[1]),
                (format!("Add error handling for {}", target), SubTaskType::Implementation, &[2]),
                (format!("Test {} integration", target), SubTaskType::Testing, &[2]),
            ];
            plan(task, &steps)
        },
    )
}

/// Built-in patterns, highest priority first.
pub fn builtin_patterns() -> Vec<DecompositionPattern> {
    vec![
        multi_file(),
        numbered_list(),
        bug_fix(),
        feature(),
        refactor(),
        integration(),
    ]
}

/// Generic analyze, plan, implement, review chain.
pub fn generic(task: &Task) -> Vec<SubTask> {
    let target = task.description.trim().to_string();
    chain(
        task,
        &[
            (format!("Analyze requirements: {}", target), SubTaskType::Analysis),
            (format!("Plan approach: {}", target), SubTaskType::Planning),
            (format!("Implement: {}", target), SubTaskType::Implementation),
            (format!("Review: {}", target), SubTaskType::Review),
        ],
    )
}
