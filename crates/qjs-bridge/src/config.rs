//! Configuration types for the QuickJS runtime.
//!
//! Limits are applied once, when the runtime is created.

/// Runtime configuration.
///
/// Controls engine resource limits and evaluation defaults.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Heap limit in bytes.
    /// Default: None (unlimited)
    pub memory_limit: Option<usize>,

    /// Maximum native stack usage in bytes.
    /// Default: None (engine default)
    pub max_stack_size: Option<usize>,

    /// Allocation threshold that triggers a GC cycle.
    /// Default: None (engine default)
    pub gc_threshold: Option<usize>,

    /// Synthetic filename reported in stack traces by `eval` and `eval_async`.
    /// Default: "<eval>"
    pub eval_filename: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            memory_limit: None,
            max_stack_size: None,
            gc_threshold: None,
            eval_filename: "<eval>".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Create a new runtime config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create config with a hard heap limit.
    pub fn constrained(memory_limit: usize) -> Self {
        Self {
            memory_limit: Some(memory_limit),
            ..Default::default()
        }
    }

    /// Set the heap limit in bytes.
    pub fn memory_limit(mut self, bytes: usize) -> Self {
        self.memory_limit = Some(bytes);
        self
    }

    /// Set the maximum stack size in bytes.
    pub fn max_stack_size(mut self, bytes: usize) -> Self {
        self.max_stack_size = Some(bytes);
        self
    }

    /// Set the GC threshold in bytes.
    pub fn gc_threshold(mut self, bytes: usize) -> Self {
        self.gc_threshold = Some(bytes);
        self
    }

    /// Set the filename used for anonymous evaluation.
    pub fn eval_filename(mut self, name: impl Into<String>) -> Self {
        self.eval_filename = name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RuntimeConfig::default();
        assert!(config.memory_limit.is_none());
        assert!(config.max_stack_size.is_none());
        assert!(config.gc_threshold.is_none());
        assert_eq!(config.eval_filename, "<eval>");
    }

    #[test]
    fn test_constrained() {
        let config = RuntimeConfig::constrained(4 << 20);
        assert_eq!(config.memory_limit, Some(4 << 20));
        assert!(config.gc_threshold.is_none());
    }

    #[test]
    fn test_builder_pattern() {
        let config = RuntimeConfig::new()
            .max_stack_size(512 * 1024)
            .gc_threshold(1 << 20)
            .eval_filename("main.js");

        assert_eq!(config.max_stack_size, Some(512 * 1024));
        assert_eq!(config.gc_threshold, Some(1 << 20));
        assert_eq!(config.eval_filename, "main.js");
    }
}
