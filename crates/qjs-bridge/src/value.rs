//! Owned and borrowed wrappers around engine values
//!
//! [`Value`] owns exactly one engine reference and releases it on drop.
//! [`ValueRef`] is a non-owning view; every read-only operation lives on it
//! and is reachable from `Value` through `Deref`.

use num_bigint::BigInt;
use qjs_bridge_sys as qjs;
use std::ffi::CStr;
use std::mem::ManuallyDrop;
use std::ops::Deref;

use crate::context::Context;
use crate::error::{JsException, QjsError, QjsResult};
use crate::handle::{Deferred, ForeignRef};

/// A borrowed view of an engine value
///
/// A view never releases its reference. Views handed out by the context
/// (`global`, `free_on_exit`) stay valid until the context is freed; a view
/// reached through a [`Value`] is bounded by that borrow.
///
/// # Thread Safety
///
/// This type is `!Send` and `!Sync` because values are tied to their
/// context's thread.
pub struct ValueRef<'ctx> {
    ctx: &'ctx Context<'ctx>,
    raw: qjs::JSValue,
}

/// An owned reference to an engine value
///
/// Dropping releases the reference; `clone` duplicates it.
pub struct Value<'ctx> {
    inner: ValueRef<'ctx>,
}

impl<'ctx> ValueRef<'ctx> {
    pub(crate) fn new(ctx: &'ctx Context<'ctx>, raw: qjs::JSValue) -> Self {
        Self { ctx, raw }
    }

    /// The owning context
    pub fn context(&self) -> &'ctx Context<'ctx> {
        self.ctx
    }

    /// Get the raw value without transferring ownership
    pub fn as_raw(&self) -> qjs::JSValue {
        self.raw
    }

    pub(crate) fn tag(&self) -> i32 {
        qjs::value_tag(self.raw)
    }

    /// Take a second owned reference
    pub fn dupe(&self) -> Value<'ctx> {
        // SAFETY: raw belongs to ctx, which is live while borrowed
        let raw = unsafe { self.raw.duplicate(self.ctx.raw()) };
        Value::from_raw(self.ctx, raw)
    }

    // Type queries

    pub fn is_number(&self) -> bool {
        matches!(self.tag(), qjs::TAG_INT | qjs::TAG_FLOAT64)
    }

    pub fn is_bigint(&self) -> bool {
        qjs::is_bigint_tag(self.tag())
    }

    pub fn is_bool(&self) -> bool {
        self.tag() == qjs::TAG_BOOL
    }

    pub fn is_null(&self) -> bool {
        self.tag() == qjs::TAG_NULL
    }

    pub fn is_undefined(&self) -> bool {
        self.tag() == qjs::TAG_UNDEFINED
    }

    pub fn is_exception(&self) -> bool {
        self.tag() == qjs::TAG_EXCEPTION
    }

    pub fn is_uninitialized(&self) -> bool {
        self.tag() == qjs::TAG_UNINITIALIZED
    }

    pub fn is_string(&self) -> bool {
        self.tag() == qjs::TAG_STRING
    }

    pub fn is_symbol(&self) -> bool {
        self.tag() == qjs::TAG_SYMBOL
    }

    pub fn is_object(&self) -> bool {
        self.tag() == qjs::TAG_OBJECT
    }

    /// An object of the engine's internal error class
    ///
    /// Objects that merely inherit from `Error.prototype` do not count.
    pub fn is_error(&self) -> bool {
        // SAFETY: ctx is live while borrowed
        self.is_object() && unsafe { qjs::JS_IsError(self.ctx.raw(), self.raw) }
    }

    pub fn is_function(&self) -> bool {
        // SAFETY: ctx is live while borrowed
        self.is_object() && qjs::truthy(unsafe { qjs::JS_IsFunction(self.ctx.raw(), self.raw) })
    }

    pub fn is_constructor(&self) -> bool {
        // SAFETY: ctx is live while borrowed
        self.is_object() && qjs::truthy(unsafe { qjs::JS_IsConstructor(self.ctx.raw(), self.raw) })
    }

    /// `self instanceof ctor`. False when `ctor` is not callable.
    pub fn instance_of(&self, ctor: &ValueRef<'_>) -> bool {
        self.instance_of_cached(ctor.raw)
    }

    pub(crate) fn instance_of_cached(&self, ctor: qjs::JSValue) -> bool {
        if !self.is_object() || qjs::value_tag(ctor) != qjs::TAG_OBJECT {
            return false;
        }
        let ctx = self.ctx.raw();
        // SAFETY: both values belong to ctx
        let result = unsafe { qjs::JS_IsInstanceOf(ctx, self.raw, ctor) };
        if result < 0 {
            // SAFETY: an exception is pending on ctx
            unsafe { qjs::JS_FreeValue(ctx, qjs::JS_GetException(ctx)) };
            return false;
        }
        result > 0
    }

    /// JavaScript `typeof`-style name of the value's variant
    pub fn type_name(&self) -> &'static str {
        match self.tag() {
            qjs::TAG_INT | qjs::TAG_FLOAT64 => "number",
            qjs::TAG_BOOL => "boolean",
            qjs::TAG_NULL => "null",
            qjs::TAG_UNDEFINED => "undefined",
            qjs::TAG_UNINITIALIZED => "uninitialized",
            qjs::TAG_EXCEPTION => "exception",
            qjs::TAG_STRING => "string",
            qjs::TAG_SYMBOL => "symbol",
            qjs::TAG_OBJECT if self.is_function() => "function",
            qjs::TAG_OBJECT => "object",
            t if qjs::is_bigint_tag(t) => "bigint",
            _ => "internal",
        }
    }

    // Conversions

    /// ECMA ToBoolean
    pub fn to_bool(&self) -> bool {
        // SAFETY: ctx is live while borrowed
        unsafe { qjs::JS_ToBool(self.ctx.raw(), self.raw) > 0 }
    }

    /// ECMA ToInt32
    pub fn to_int32(&self) -> QjsResult<i32> {
        let mut out = 0i32;
        // SAFETY: ctx is live while borrowed
        let status = unsafe { qjs::JS_ToInt32(self.ctx.raw(), &mut out, self.raw) };
        self.conversion(status, out)
    }

    /// ECMA ToUint32
    pub fn to_uint32(&self) -> QjsResult<u32> {
        let mut out = 0u32;
        // SAFETY: ctx is live while borrowed
        let status = unsafe { qjs::to_uint32(self.ctx.raw(), &mut out, self.raw) };
        self.conversion(status, out)
    }

    /// Integer conversion truncating toward zero, wrapping modulo 2^64
    ///
    /// NaN, infinities and magnitudes too large to carry any of the low 64
    /// bits convert to zero.
    pub fn to_int64(&self) -> QjsResult<i64> {
        let mut out = 0i64;
        // SAFETY: ctx is live while borrowed
        let status = unsafe { qjs::JS_ToInt64(self.ctx.raw(), &mut out, self.raw) };
        self.conversion(status, out)
    }

    /// ECMA ToNumber
    pub fn to_float64(&self) -> QjsResult<f64> {
        let mut out = 0f64;
        // SAFETY: ctx is live while borrowed
        let status = unsafe { qjs::JS_ToFloat64(self.ctx.raw(), &mut out, self.raw) };
        self.conversion(status, out)
    }

    /// BigInt value truncated to 64 bits
    pub fn to_bigint64(&self) -> QjsResult<i64> {
        let mut out = 0i64;
        // SAFETY: ctx is live while borrowed
        let status = unsafe { qjs::JS_ToBigInt64(self.ctx.raw(), &mut out, self.raw) };
        self.conversion(status, out)
    }

    /// Arbitrary-precision BigInt value, read through its decimal form
    pub fn to_bigint(&self) -> QjsResult<BigInt> {
        if !self.is_bigint() {
            return Err(QjsError::type_error("bigint", self.type_name()));
        }
        let decimal = self.to_string()?;
        decimal
            .parse::<BigInt>()
            .map_err(|e| QjsError::internal(format!("bigint decimal {decimal:?}: {e}")))
    }

    fn conversion<T>(&self, status: i32, out: T) -> QjsResult<T> {
        if status < 0 {
            Err(QjsError::Exception(self.ctx.take_exception()))
        } else {
            Ok(out)
        }
    }

    /// Structured view of an `Error` instance, `None` for anything else
    pub fn to_error(&self) -> Option<JsException> {
        if !self.is_error() {
            return None;
        }
        Some(JsException {
            name: self.string_property_lossy(c"name"),
            message: self.string_property_lossy(c"message"),
            cause: self.string_property_lossy(c"cause"),
            stack: self.string_property_lossy(c"stack"),
        })
    }

    /// Describe a thrown value. Non-errors keep only their string form.
    ///
    /// Never raises: failures while reading the value are swallowed.
    pub(crate) fn describe_exception(&self) -> JsException {
        self.to_error()
            .unwrap_or_else(|| JsException::with_message(self.to_string_lossy()))
    }

    /// String form of a property, empty when absent or unreadable
    fn string_property_lossy(&self, name: &CStr) -> String {
        let ctx = self.ctx.raw();
        // SAFETY: name is NUL-terminated and self belongs to ctx
        let raw = unsafe { qjs::JS_GetPropertyStr(ctx, self.raw, name.as_ptr()) };
        let prop = Value::from_raw(self.ctx, raw);
        if prop.is_exception() {
            // SAFETY: an exception is pending on ctx
            unsafe { qjs::JS_FreeValue(ctx, qjs::JS_GetException(ctx)) };
            return String::new();
        }
        if prop.is_undefined() {
            return String::new();
        }
        prop.to_string_lossy()
    }
}

impl<'ctx> Value<'ctx> {
    /// Wrap an owned reference
    pub(crate) fn from_raw(ctx: &'ctx Context<'ctx>, raw: qjs::JSValue) -> Self {
        Self {
            inner: ValueRef::new(ctx, raw),
        }
    }

    /// Give up ownership of the reference without releasing it
    pub fn into_raw(self) -> qjs::JSValue {
        ManuallyDrop::new(self).inner.raw
    }

    /// Release the reference now
    pub fn free(self) {
        drop(self);
    }

    /// Move release responsibility to the context's teardown
    pub fn free_on_exit(self) -> ValueRef<'ctx> {
        let ctx = self.inner.ctx;
        let raw = self.into_raw();
        ctx.defer(Deferred::Value(raw));
        ValueRef::new(ctx, raw)
    }
}

impl<'ctx> Deref for Value<'ctx> {
    type Target = ValueRef<'ctx>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<'ctx> AsRef<ValueRef<'ctx>> for Value<'ctx> {
    fn as_ref(&self) -> &ValueRef<'ctx> {
        &self.inner
    }
}

impl Clone for Value<'_> {
    fn clone(&self) -> Self {
        self.inner.dupe()
    }
}

impl Drop for Value<'_> {
    fn drop(&mut self) {
        if qjs::has_ref_count(self.inner.raw) {
            // SAFETY: self owns exactly one reference into a live context
            unsafe { self.inner.raw.release(self.inner.ctx.raw()) };
        }
    }
}

impl std::fmt::Debug for ValueRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.tag() {
            qjs::TAG_INT | qjs::TAG_FLOAT64 | qjs::TAG_BOOL | qjs::TAG_STRING => {
                write!(f, "Value({})", self.to_string_lossy())
            }
            _ => write!(f, "Value(<{}>)", self.type_name()),
        }
    }
}

impl std::fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inner.fmt(f)
    }
}

impl<'rt> Context<'rt> {
    pub fn new_null(&self) -> Value<'_> {
        Value::from_raw(self, qjs::JS_NULL)
    }

    pub fn new_undefined(&self) -> Value<'_> {
        Value::from_raw(self, qjs::JS_UNDEFINED)
    }

    pub fn new_uninitialized(&self) -> Value<'_> {
        Value::from_raw(self, qjs::JS_UNINITIALIZED)
    }

    /// The exception sentinel. Holds no reference.
    pub fn new_exception(&self) -> Value<'_> {
        Value::from_raw(self, qjs::JS_EXCEPTION)
    }

    pub fn new_bool(&self, value: bool) -> Value<'_> {
        Value::from_raw(self, if value { qjs::JS_TRUE } else { qjs::JS_FALSE })
    }

    pub fn new_int32(&self, value: i32) -> Value<'_> {
        // SAFETY: context is live
        Value::from_raw(self, unsafe { qjs::JS_MKVAL(qjs::TAG_INT, value) })
    }

    pub fn new_uint32(&self, value: u32) -> Value<'_> {
        // SAFETY: context is live
        Value::from_raw(self, unsafe { qjs::new_uint32(self.raw(), value) })
    }

    /// Number from an `i64`; magnitudes beyond 2^53 lose precision
    pub fn new_int64(&self, value: i64) -> Value<'_> {
        // SAFETY: context is live
        Value::from_raw(self, unsafe { qjs::new_int64(self.raw(), value) })
    }

    pub fn new_float64(&self, value: f64) -> Value<'_> {
        // SAFETY: context is live
        Value::from_raw(self, unsafe { qjs::JS_NewFloat64(value) })
    }

    pub fn new_bigint64(&self, value: i64) -> Value<'_> {
        // SAFETY: context is live
        Value::from_raw(self, unsafe { qjs::JS_NewBigInt64(self.raw(), value) })
    }

    pub fn new_biguint64(&self, value: u64) -> Value<'_> {
        // SAFETY: context is live
        Value::from_raw(self, unsafe { qjs::JS_NewBigUint64(self.raw(), value) })
    }

    /// Arbitrary-precision BigInt, built from its decimal literal
    pub fn new_bigint(&self, value: &BigInt) -> QjsResult<Value<'_>> {
        self.eval(&format!("{value}n"))
    }

    /// New `Symbol`, with an optional description value
    pub fn new_symbol<'a>(&'a self, description: Option<&ValueRef<'a>>) -> QjsResult<Value<'a>> {
        let symbol = ValueRef::new(self, self.cache().symbol);
        match description {
            Some(desc) => symbol.call(None, &[desc]),
            None => symbol.call(None, &[]),
        }
    }

    /// New empty plain object
    pub fn new_object(&self) -> Value<'_> {
        // SAFETY: context is live
        Value::from_raw(self, unsafe { qjs::JS_NewObject(self.raw()) })
    }

    /// New `Error` instance carrying `message`
    pub fn new_error(&self, message: &str) -> QjsResult<Value<'_>> {
        // SAFETY: context is live
        let error = self.check(unsafe { qjs::JS_NewError(self.raw()) })?;
        error.set("message", self.new_string(message))?;
        Ok(error)
    }
}
