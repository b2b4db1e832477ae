//! Engine runtime ownership

use qjs_bridge_sys as qjs;
use std::marker::PhantomData;
use tracing::debug;

use crate::config::RuntimeConfig;
use crate::context::Context;
use crate::error::{QjsError, QjsResult};

/// One engine instance
///
/// Contexts borrow the runtime, so it cannot be freed while any of them is
/// alive.
///
/// # Thread Safety
///
/// This type is `!Send` and `!Sync`. The engine is single-threaded per
/// runtime.
pub struct Runtime {
    raw: *mut qjs::JSRuntime,
    config: RuntimeConfig,
    _not_send: PhantomData<*mut ()>,
}

impl Runtime {
    /// Create a runtime with default configuration
    pub fn new() -> QjsResult<Self> {
        Self::with_config(RuntimeConfig::default())
    }

    /// Create a runtime and apply the given limits
    pub fn with_config(config: RuntimeConfig) -> QjsResult<Self> {
        // SAFETY: JS_NewRuntime has no preconditions
        let raw = unsafe { qjs::JS_NewRuntime() };
        if raw.is_null() {
            return Err(QjsError::RuntimeCreation {
                message: "JS_NewRuntime returned null".into(),
            });
        }

        // SAFETY: raw is a fresh, valid runtime
        unsafe {
            if let Some(limit) = config.memory_limit {
                qjs::JS_SetMemoryLimit(raw, limit as _);
            }
            if let Some(size) = config.max_stack_size {
                qjs::JS_SetMaxStackSize(raw, size as _);
            }
            if let Some(threshold) = config.gc_threshold {
                qjs::JS_SetGCThreshold(raw, threshold as _);
            }
        }

        debug!(
            memory_limit = ?config.memory_limit,
            max_stack_size = ?config.max_stack_size,
            "runtime created"
        );

        Ok(Self {
            raw,
            config,
            _not_send: PhantomData,
        })
    }

    /// Create a context inside this runtime
    pub fn new_context(&self) -> QjsResult<Context<'_>> {
        Context::new(self)
    }

    /// Run a full garbage collection cycle
    pub fn run_gc(&self) {
        // SAFETY: raw is valid for self's lifetime
        unsafe { qjs::JS_RunGC(self.raw) };
    }

    /// Configuration this runtime was created with
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Get the raw runtime pointer
    pub fn as_raw(&self) -> *mut qjs::JSRuntime {
        self.raw
    }

    /// Release the runtime
    pub fn free(self) {
        drop(self);
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        // SAFETY: every context borrowed self and has already been dropped
        unsafe { qjs::JS_FreeRuntime(self.raw) };
        debug!("runtime freed");
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("raw", &self.raw)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_lifecycle() {
        let rt = Runtime::new().unwrap();
        assert!(!rt.as_raw().is_null());
        rt.run_gc();
        rt.free();
    }

    #[test]
    fn test_memory_limit_applies() {
        let rt = Runtime::with_config(RuntimeConfig::constrained(8 << 20)).unwrap();
        let ctx = rt.new_context().unwrap();

        let err = ctx
            .eval("(() => { const a = []; for (;;) a.push(new Array(100000).fill(1)); })()")
            .unwrap_err();
        assert!(err.is_exception());
    }

    #[test]
    fn test_eval_filename_from_config() {
        let rt = Runtime::with_config(RuntimeConfig::new().eval_filename("boot.js")).unwrap();
        let ctx = rt.new_context().unwrap();

        let err = ctx.eval("throw new Error('where')").unwrap_err();
        assert!(err.stack_trace().unwrap_or_default().contains("boot.js"));
    }
}
