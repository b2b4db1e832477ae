//! Execution context with its global value cache and deferred-release registry

use qjs_bridge_sys as qjs;
use std::cell::RefCell;
use std::ffi::{CString, c_int};
use std::marker::PhantomData;
use std::ptr;
use tracing::debug;

use crate::error::{JsException, QjsError, QjsResult};
use crate::handle::{Deferred, DeferredFrees};
use crate::runtime::Runtime;
use crate::string::nul_terminated;
use crate::typed_array::TypedArrayKind;
use crate::value::{Value, ValueRef};

/// How source text is evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvalMode {
    /// Classic script in the global scope
    #[default]
    Global,
    /// Global script with top-level `await`; evaluates to a promise
    Async,
    /// ES module; evaluates to a promise
    Module,
}

impl EvalMode {
    fn flags(self) -> c_int {
        match self {
            EvalMode::Global => qjs::EVAL_TYPE_GLOBAL,
            EvalMode::Async => qjs::EVAL_TYPE_GLOBAL | qjs::EVAL_FLAG_ASYNC,
            EvalMode::Module => qjs::EVAL_TYPE_MODULE,
        }
    }
}

/// Well-known globals and property keys looked up once per context
///
/// Every entry is also held by the deferred registry, which owns it.
pub(crate) struct ValueCache {
    pub(crate) global: qjs::JSValue,
    pub(crate) array: qjs::JSValue,
    pub(crate) map: qjs::JSValue,
    pub(crate) set: qjs::JSValue,
    pub(crate) weak_map: qjs::JSValue,
    pub(crate) weak_set: qjs::JSValue,
    pub(crate) array_buffer: qjs::JSValue,
    pub(crate) symbol: qjs::JSValue,
    /// Indexed by `TypedArrayKind`; `undefined` when the engine lacks the class
    pub(crate) typed_arrays: [qjs::JSValue; TypedArrayKind::COUNT],
    pub(crate) length: qjs::JSAtom,
    pub(crate) size: qjs::JSAtom,
    pub(crate) byte_length: qjs::JSAtom,
}

impl ValueCache {
    /// # Safety
    /// `raw` must be a live context
    unsafe fn load(raw: *mut qjs::JSContext, deferred: &mut DeferredFrees) -> QjsResult<Self> {
        // SAFETY: raw is live per caller contract
        let global = unsafe { qjs::JS_GetGlobalObject(raw) };
        deferred.push(Deferred::Value(global));

        // SAFETY: raw is live and global belongs to it
        let required = |name: &str, deferred: &mut DeferredFrees| unsafe {
            lookup_global(raw, global, name, deferred)
                .ok_or_else(|| QjsError::MissingGlobal(name.to_string()))
        };

        let array = required("Array", deferred)?;
        let map = required("Map", deferred)?;
        let set = required("Set", deferred)?;
        let weak_map = required("WeakMap", deferred)?;
        let weak_set = required("WeakSet", deferred)?;
        let array_buffer = required("ArrayBuffer", deferred)?;
        let symbol = required("Symbol", deferred)?;

        let mut typed_arrays = [qjs::JS_UNDEFINED; TypedArrayKind::COUNT];
        for kind in TypedArrayKind::ALL {
            let name = kind.constructor_name();
            typed_arrays[kind as usize] = if kind == TypedArrayKind::Float16 {
                // SAFETY: as above
                unsafe { lookup_global(raw, global, name, deferred) }.unwrap_or(qjs::JS_UNDEFINED)
            } else {
                required(name, deferred)?
            };
        }

        // SAFETY: raw is live
        let (length, size, byte_length) = unsafe {
            (
                cached_atom(raw, "length", deferred),
                cached_atom(raw, "size", deferred),
                cached_atom(raw, "byteLength", deferred),
            )
        };

        Ok(Self {
            global,
            array,
            map,
            set,
            weak_map,
            weak_set,
            array_buffer,
            symbol,
            typed_arrays,
            length,
            size,
            byte_length,
        })
    }
}

/// Read an object-valued global and hand its reference to the registry
unsafe fn lookup_global(
    raw: *mut qjs::JSContext,
    global: qjs::JSValue,
    name: &str,
    deferred: &mut DeferredFrees,
) -> Option<qjs::JSValue> {
    let cname = CString::new(name).ok()?;
    // SAFETY: raw and global are live per caller contract
    unsafe {
        let value = qjs::JS_GetPropertyStr(raw, global, cname.as_ptr());
        match qjs::value_tag(value) {
            qjs::TAG_OBJECT => {
                deferred.push(Deferred::Value(value));
                Some(value)
            }
            qjs::TAG_EXCEPTION => {
                qjs::JS_FreeValue(raw, qjs::JS_GetException(raw));
                None
            }
            _ => {
                qjs::JS_FreeValue(raw, value);
                None
            }
        }
    }
}

unsafe fn cached_atom(
    raw: *mut qjs::JSContext,
    name: &str,
    deferred: &mut DeferredFrees,
) -> qjs::JSAtom {
    // SAFETY: raw is live per caller contract
    let atom = unsafe { qjs::JS_NewAtomLen(raw, name.as_ptr() as _, name.len() as _) };
    deferred.push(Deferred::Atom(atom));
    atom
}

/// A JavaScript execution context (realm)
///
/// Values and atoms borrow the context, so it cannot be freed while any of
/// them is alive. Teardown drains the deferred-release registry in insertion
/// order, then releases the engine context. A freed context stays freed.
///
/// # Thread Safety
///
/// This type is `!Send` and `!Sync` because the engine is single-threaded.
/// Cross-thread access causes undefined behavior.
pub struct Context<'rt> {
    raw: *mut qjs::JSContext,
    runtime: &'rt Runtime,
    cache: ValueCache,
    deferred: RefCell<DeferredFrees>,
    /// Marker to make this type !Send + !Sync
    _not_send: PhantomData<*mut ()>,
}

impl<'rt> Context<'rt> {
    /// Create a context with the standard intrinsics
    pub fn new(runtime: &'rt Runtime) -> QjsResult<Self> {
        // SAFETY: the runtime pointer is valid for 'rt
        unsafe {
            let raw = qjs::JS_NewContext(runtime.as_raw());
            Self::from_raw(runtime, raw)
        }
    }

    /// Take ownership of a raw context and build its value cache
    ///
    /// On failure the raw context is released before returning.
    ///
    /// # Safety
    /// `raw` must be null or a context created in `runtime` that nothing else
    /// will free
    pub unsafe fn from_raw(runtime: &'rt Runtime, raw: *mut qjs::JSContext) -> QjsResult<Self> {
        if raw.is_null() {
            return Err(QjsError::ContextCreation {
                message: "JS_NewContext returned null".into(),
            });
        }

        let mut deferred = DeferredFrees::default();
        // SAFETY: raw is live
        match unsafe { ValueCache::load(raw, &mut deferred) } {
            Ok(cache) => {
                debug!(cached = deferred.len(), "context created");
                Ok(Self {
                    raw,
                    runtime,
                    cache,
                    deferred: RefCell::new(deferred),
                    _not_send: PhantomData,
                })
            }
            Err(e) => {
                // SAFETY: every registered entry belongs to raw
                unsafe {
                    deferred.drain(raw);
                    qjs::JS_FreeContext(raw);
                }
                debug!(error = %e, "context creation aborted");
                Err(e)
            }
        }
    }

    /// Get the raw context pointer (null once freed)
    pub fn as_raw(&self) -> *mut qjs::JSContext {
        self.raw
    }

    /// Live context pointer for engine calls
    pub(crate) fn raw(&self) -> *mut qjs::JSContext {
        assert!(!self.raw.is_null(), "context used after free");
        self.raw
    }

    /// The runtime that owns this context
    pub fn runtime(&self) -> &'rt Runtime {
        self.runtime
    }

    pub(crate) fn cache(&self) -> &ValueCache {
        &self.cache
    }

    /// Whether `free` has run
    pub fn is_freed(&self) -> bool {
        self.raw.is_null()
    }

    /// Number of releases waiting for teardown
    pub fn pending_releases(&self) -> usize {
        self.deferred.borrow().len()
    }

    pub(crate) fn defer(&self, entry: Deferred) {
        self.deferred.borrow_mut().push(entry);
    }

    /// Tear down the context. Repeated calls are no-ops.
    pub fn free(&mut self) {
        if self.raw.is_null() {
            return;
        }
        // SAFETY: no handle borrows self, so every registered reference is
        // owned solely by the registry
        let released = unsafe {
            let released = self.deferred.get_mut().drain(self.raw);
            qjs::JS_FreeContext(self.raw);
            released
        };
        self.raw = ptr::null_mut();
        debug!(released, "context freed");
    }

    /// The global object
    pub fn global(&self) -> ValueRef<'_> {
        ValueRef::new(self, self.cache.global)
    }

    /// Evaluate a classic script
    pub fn eval(&self, source: &str) -> QjsResult<Value<'_>> {
        self.eval_with(source, &self.runtime.config().eval_filename, EvalMode::Global)
    }

    /// Evaluate a script with top-level `await`, yielding a promise
    pub fn eval_async(&self, source: &str) -> QjsResult<Value<'_>> {
        self.eval_with(source, &self.runtime.config().eval_filename, EvalMode::Async)
    }

    /// Evaluate source under an explicit filename and mode
    pub fn eval_with(&self, source: &str, filename: &str, mode: EvalMode) -> QjsResult<Value<'_>> {
        if self.is_freed() {
            return Err(QjsError::ContextFreed);
        }
        let code = nul_terminated(source);
        let file = CString::new(filename)
            .map_err(|e| QjsError::StringEncoding(format!("filename contains NUL: {e}")))?;

        // SAFETY: code is NUL-terminated at source.len(), as JS_Eval requires
        let raw = unsafe {
            qjs::JS_Eval(
                self.raw,
                code.as_ptr() as _,
                source.len() as _,
                file.as_ptr(),
                mode.flags(),
            )
        };
        self.check(raw)
    }

    /// Run queued promise jobs until the queue is empty
    ///
    /// Returns the number of jobs executed.
    pub fn run_pending_jobs(&self) -> QjsResult<usize> {
        if self.is_freed() {
            return Err(QjsError::ContextFreed);
        }
        let mut executed = 0;
        loop {
            let mut job_ctx: *mut qjs::JSContext = ptr::null_mut();
            // SAFETY: the runtime outlives self
            let status = unsafe { qjs::JS_ExecutePendingJob(self.runtime.as_raw(), &mut job_ctx) };
            match status {
                0 => return Ok(executed),
                s if s > 0 => executed += 1,
                _ if job_ctx == self.raw => {
                    return Err(QjsError::Exception(self.take_exception()));
                }
                _ => {
                    if !job_ctx.is_null() {
                        // SAFETY: job_ctx is a live context of the same runtime
                        unsafe { qjs::JS_FreeValue(job_ctx, qjs::JS_GetException(job_ctx)) };
                    }
                    return Err(QjsError::internal("pending job failed in another context"));
                }
            }
        }
    }

    /// Take the pending exception off the engine
    pub(crate) fn take_exception(&self) -> JsException {
        // SAFETY: JS_GetException transfers one owned reference
        let raw = unsafe { qjs::JS_GetException(self.raw()) };
        Value::from_raw(self, raw).describe_exception()
    }

    /// Wrap an owned result, converting the exception sentinel
    pub(crate) fn check(&self, raw: qjs::JSValue) -> QjsResult<Value<'_>> {
        if qjs::value_tag(raw) == qjs::TAG_EXCEPTION {
            Err(QjsError::Exception(self.take_exception()))
        } else {
            Ok(Value::from_raw(self, raw))
        }
    }

    /// Map a negative status to a contract violation, consuming the
    /// pending exception
    pub(crate) fn check_status(&self, status: c_int, operation: &'static str) -> QjsResult<c_int> {
        if status < 0 {
            let exception = self.take_exception();
            Err(QjsError::contract_violation(operation, exception.to_string()))
        } else {
            Ok(status)
        }
    }
}

impl Drop for Context<'_> {
    fn drop(&mut self) {
        self.free();
    }
}

impl std::fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("raw", &self.raw)
            .field("pending_releases", &self.pending_releases())
            .finish()
    }
}
