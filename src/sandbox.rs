//! Execution limits for safe invocation of module callables

use serde::{Deserialize, Serialize};

/// Default execution deadline in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;
/// Default cap on script operations (prevents runaway loops inside a call)
pub const DEFAULT_MAX_OPERATIONS: u64 = 100_000;
/// Default cap on the stringified result, in bytes
pub const DEFAULT_MAX_RESULT_LEN: usize = 100_000;
/// Default cap on strings built inside a callable
pub const DEFAULT_MAX_STRING_SIZE: usize = 10_000_000;
/// Default cap on arrays built inside a callable
pub const DEFAULT_MAX_ARRAY_SIZE: usize = 10_000;
/// Default cap on maps built inside a callable
pub const DEFAULT_MAX_MAP_SIZE: usize = 1_000;

/// Limits applied to every callable invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLimits {
    /// Deadline in milliseconds; exceeding it abandons (does not stop) the call
    pub timeout_ms: u64,
    /// Maximum number of script operations (0 = unlimited)
    pub max_operations: u64,
    /// Maximum length of the stringified result in bytes
    pub max_result_len: usize,
    /// Maximum string size in bytes inside the script engine
    pub max_string_size: usize,
    /// Maximum array size inside the script engine
    pub max_array_size: usize,
    /// Maximum map size inside the script engine
    pub max_map_size: usize,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_operations: DEFAULT_MAX_OPERATIONS,
            max_result_len: DEFAULT_MAX_RESULT_LEN,
            max_string_size: DEFAULT_MAX_STRING_SIZE,
            max_array_size: DEFAULT_MAX_ARRAY_SIZE,
            max_map_size: DEFAULT_MAX_MAP_SIZE,
        }
    }
}

impl ExecutionLimits {
    /// Create new limits with all defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Tight limits for quick calls
    pub fn quick() -> Self {
        Self {
            timeout_ms: 1_000,
            max_operations: 10_000,
            ..Default::default()
        }
    }

    /// Relaxed limits for long-running callables
    pub fn extended() -> Self {
        Self {
            timeout_ms: 30_000,
            max_operations: 500_000,
            ..Default::default()
        }
    }

    /// Builder: set the execution deadline
    pub fn with_timeout_ms(mut self, timeout: u64) -> Self {
        self.timeout_ms = timeout;
        self
    }

    /// Builder: set max operations
    pub fn with_max_operations(mut self, max: u64) -> Self {
        self.max_operations = max;
        self
    }

    /// Builder: set the result size cap
    pub fn with_max_result_len(mut self, len: usize) -> Self {
        self.max_result_len = len;
        self
    }

    /// Builder: set max string size
    pub fn with_max_string_size(mut self, size: usize) -> Self {
        self.max_string_size = size;
        self
    }

    /// Builder: set max array size
    pub fn with_max_array_size(mut self, size: usize) -> Self {
        self.max_array_size = size;
        self
    }

    /// Builder: set max map size
    pub fn with_max_map_size(mut self, size: usize) -> Self {
        self.max_map_size = size;
        self
    }
}
