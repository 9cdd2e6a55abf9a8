use serde::{Deserialize, Serialize};

/// Settings for a [`LoopScheduler`](super::LoopScheduler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Name attached to the scheduler's tracing span
    pub name: String,

    /// Worker threads used by `run_pool`
    pub threads: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            name: "loop".to_string(),
            threads: 1,
        }
    }
}
