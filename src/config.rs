use serde::{Deserialize, Serialize};

/// Default number of idle instances each pool keeps around.
pub const DEFAULT_POOL_CAPACITY: usize = 100;

/// Default number of Lua instructions between stop-flag checks.
pub const DEFAULT_INSTRUCTION_BUDGET: u32 = 1000;

/// Tunables for a script context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MathConfig {
    pub pool_capacity: usize,
    pub instruction_budget: u32,
}

impl Default for MathConfig {
    fn default() -> Self {
        Self {
            pool_capacity: DEFAULT_POOL_CAPACITY,
            instruction_budget: DEFAULT_INSTRUCTION_BUDGET,
        }
    }
}

impl MathConfig {
    pub fn with_pool_capacity(mut self, pool_capacity: usize) -> Self {
        self.pool_capacity = pool_capacity;
        self
    }

    /// Instruction budget clamped so the stop hook always fires.
    pub fn hook_interval(&self) -> u32 {
        self.instruction_budget.max(1)
    }
}
