//! Execution results returned by workers and aggregated by the orchestrator.

use crate::core::task::TaskStatus;
use serde::{Deserialize, Serialize};

/// Separator placed between concatenated outputs.
pub const OUTPUT_SEPARATOR: &str = "\n\n";

/// Cost and quality metrics of one execution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ExecutionMetrics {
    pub duration_ms: u64,
    pub tokens_used: u64,
    pub cost: f64,
    /// Worker's self-reported confidence in [0, 1].
    pub confidence: f64,
}

/// Outcome of running a task (or a whole workflow).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TaskResult {
    pub success: bool,
    pub output: String,
    pub metrics: ExecutionMetrics,
    #[serde(default)]
    pub artifacts: Vec<String>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl TaskResult {
    pub fn success(output: &str) -> Self {
        Self {
            success: true,
            output: output.to_string(),
            ..Default::default()
        }
    }

    pub fn failure(error: &str) -> Self {
        Self {
            success: false,
            errors: vec![error.to_string()],
            ..Default::default()
        }
    }

    pub fn with_metrics(mut self, metrics: ExecutionMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_warning(mut self, warning: &str) -> Self {
        self.warnings.push(warning.to_string());
        self
    }

    /// Status of the task this result belongs to.
    pub fn status(&self) -> TaskStatus {
        if self.success {
            TaskStatus::Completed
        } else {
            TaskStatus::Failed {
                error: self.errors.join("; "),
            }
        }
    }

    /// Combine sequentially executed results.
    ///
    /// Succeeds iff every part succeeded (and there is at least one part).
    /// Outputs concatenate in order, durations/tokens/cost sum, confidence
    /// is the mean, and errors/warnings/artifacts concatenate.
    pub fn aggregate<'a, I>(results: I) -> Self
    where
        I: IntoIterator<Item = &'a TaskResult>,
    {
        let mut combined = TaskResult {
            success: true,
            ..Default::default()
        };
        let mut outputs = Vec::new();
        let mut confidence_sum = 0.0;
        let mut count = 0usize;

        for result in results {
            count += 1;
            combined.success &= result.success;
            if !result.output.is_empty() {
                outputs.push(result.output.as_str());
            }
            combined.metrics.duration_ms += result.metrics.duration_ms;
            combined.metrics.tokens_used += result.metrics.tokens_used;
            combined.metrics.cost += result.metrics.cost;
            confidence_sum += result.metrics.confidence;
            combined.artifacts.extend(result.artifacts.iter().cloned());
            combined.errors.extend(result.errors.iter().cloned());
            combined.warnings.extend(result.warnings.iter().cloned());
        }

        if count == 0 {
            combined.success = false;
        } else {
            combined.metrics.confidence = confidence_sum / count as f64;
        }
        combined.output = outputs.join(OUTPUT_SEPARATOR);
        combined
    }

    /// Combine results of workers that ran concurrently.
    ///
    /// Succeeds iff at least `required` parts succeeded. Only successful
    /// outputs are kept, duration is the max, tokens/cost sum, confidence
    /// is the mean over every part.
    pub fn merge_parallel(results: &[TaskResult], required: usize) -> Self {
        let successes = results.iter().filter(|r| r.success).count();
        let mut merged = TaskResult {
            success: !results.is_empty() && successes >= required,
            output: results
                .iter()
                .filter(|r| r.success && !r.output.is_empty())
                .map(|r| r.output.as_str())
                .collect::<Vec<_>>()
                .join(OUTPUT_SEPARATOR),
            ..Default::default()
        };

        for result in results {
            merged.metrics.duration_ms = merged.metrics.duration_ms.max(result.metrics.duration_ms);
            merged.metrics.tokens_used += result.metrics.tokens_used;
            merged.metrics.cost += result.metrics.cost;
            merged.metrics.confidence += result.metrics.confidence;
            merged.artifacts.extend(result.artifacts.iter().cloned());
            merged.errors.extend(result.errors.iter().cloned());
            merged.warnings.extend(result.warnings.iter().cloned());
        }
        if !results.is_empty() {
            merged.metrics.confidence /= results.len() as f64;
        }
        if !merged.success {
            merged.errors.push(format!(
                "parallel step needed {} successes, got {} of {}",
                required,
                successes,
                results.len()
            ));
        }
        merged
    }
}

/// Successes a parallel batch of `n` needs: ceil(n / 2).
pub fn majority_of(n: usize) -> usize {
    n.div_ceil(2)
}
