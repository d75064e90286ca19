use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::{wlog_debug, Error, Result};

pub const DEFAULT_QUEUE_MAX_SIZE: usize = 1000;
pub const DEFAULT_COMPLEXITY_THRESHOLD: f64 = 1.0;
pub const DEFAULT_MAX_SUBTASKS: usize = 10;
pub const DEFAULT_SUBTASK_BASE_MINUTES: u32 = 15;
pub const DEFAULT_MAX_CONCURRENT_WORKFLOWS: usize = 10;
pub const DEFAULT_PARALLEL_WORKERS: usize = 3;
pub const DEFAULT_MAX_CANDIDATES: usize = 5;
pub const DEFAULT_WORKFLOW_TIMEOUT_MS: u64 = 300_000;
pub const DEFAULT_MAX_STEP_VISITS: usize = 256;
pub const DEFAULT_VOTE_QUORUM: usize = 3;
pub const DEFAULT_VOTE_REQUIRED_MAJORITY: f64 = 0.6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub decomposer: DecomposerConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub max_size: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_QUEUE_MAX_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecomposerConfig {
    /// Tasks scoring below this stay atomic.
    pub complexity_threshold: f64,
    pub max_subtasks: usize,
    /// Estimated duration of one parallel group.
    pub subtask_base_minutes: u32,
}

impl Default for DecomposerConfig {
    fn default() -> Self {
        Self {
            complexity_threshold: DEFAULT_COMPLEXITY_THRESHOLD,
            max_subtasks: DEFAULT_MAX_SUBTASKS,
            subtask_base_minutes: DEFAULT_SUBTASK_BASE_MINUTES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub max_concurrent_workflows: usize,
    /// Fan-out width of a parallel step without explicit branches.
    pub parallel_workers: usize,
    /// Candidates ranked for a single-task dispatch.
    pub max_candidates: usize,
    /// Timeout applied to synthesized workflows.
    pub default_timeout_ms: u64,
    /// Upper bound on step transitions in one execution.
    pub max_step_visits: usize,
    pub vote_quorum: usize,
    pub vote_required_majority: f64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_workflows: DEFAULT_MAX_CONCURRENT_WORKFLOWS,
            parallel_workers: DEFAULT_PARALLEL_WORKERS,
            max_candidates: DEFAULT_MAX_CANDIDATES,
            default_timeout_ms: DEFAULT_WORKFLOW_TIMEOUT_MS,
            max_step_visits: DEFAULT_MAX_STEP_VISITS,
            vote_quorum: DEFAULT_VOTE_QUORUM,
            vote_required_majority: DEFAULT_VOTE_REQUIRED_MAJORITY,
        }
    }
}

impl Config {
    pub fn weft_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".weft"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::weft_dir()?.join("weft.toml"))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        wlog_debug!("Config::load path={}", path.display());
        if !path.exists() {
            wlog_debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        let config = Self::from_toml_str(&fs::read_to_string(path)?)?;
        wlog_debug!(
            "Config loaded: queue.max_size={}, threshold={}, max_workflows={}",
            config.queue.max_size,
            config.decomposer.complexity_threshold,
            config.orchestrator.max_concurrent_workflows
        );
        Ok(config)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                wlog_debug!("Creating config directory: {}", dir.display());
                fs::create_dir_all(dir)?;
            }
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        wlog_debug!("Config saved to {}", path.display());
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let majority = self.orchestrator.vote_required_majority;
        if !(0.0..=1.0).contains(&majority) {
            return Err(Error::Validation(format!(
                "vote_required_majority must be within [0, 1], got {}",
                majority
            )));
        }
        if self.orchestrator.parallel_workers == 0 {
            return Err(Error::Validation(
                "parallel_workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
