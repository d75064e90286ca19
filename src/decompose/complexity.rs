//! Complexity scoring for incoming tasks.

use crate::core::task::Task;

/// Keywords that each add to a task's complexity.
pub const COMPLEXITY_KEYWORDS: &[&str] = &[
    "architecture",
    "migration",
    "security",
    "concurrent",
    "distributed",
    "performance",
    "scale",
    "real-time",
    "infrastructure",
    "authentication",
    "optimization",
];

pub const BASE_COMPLEXITY: f64 = 1.0;
pub const MAX_LENGTH_CONTRIBUTION: f64 = 3.0;
pub const FILE_WEIGHT: f64 = 0.5;
pub const REQUIREMENT_WEIGHT: f64 = 0.3;
pub const KEYWORD_WEIGHT: f64 = 0.5;
pub const MAX_COMPLEXITY: f64 = 10.0;

/// Score a task on a 0-10 scale.
///
/// base + min(len/100, 3) + 0.5 per file + 0.3 per requirement
/// + 0.5 per keyword, scaled by the priority multiplier and clamped.
pub fn score(task: &Task) -> f64 {
    let description = task.description.to_lowercase();
    let length = (task.description.chars().count() as f64 / 100.0).min(MAX_LENGTH_CONTRIBUTION);
    let keywords = COMPLEXITY_KEYWORDS
        .iter()
        .filter(|keyword| description.contains(*keyword))
        .count() as f64;

    let raw = BASE_COMPLEXITY
        + length
        + FILE_WEIGHT * task.file_count() as f64
        + REQUIREMENT_WEIGHT * task.requirement_count() as f64
        + KEYWORD_WEIGHT * keywords;

    (raw * task.priority.complexity_multiplier()).clamp(0.0, MAX_COMPLEXITY)
}
