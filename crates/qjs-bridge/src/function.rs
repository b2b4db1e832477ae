//! Call marshaling
//!
//! Arguments are gathered into one contiguous buffer of raw values that
//! lives on the stack for up to [`MAX_INLINE_ARGS`] arguments and spills to
//! the heap beyond that. The buffer is borrowed, not owned: the engine only
//! reads it for the duration of the call.

use qjs_bridge_sys as qjs;
use smallvec::SmallVec;
use std::ptr;

use crate::error::QjsResult;
use crate::value::{Value, ValueRef};

/// Argument counts up to this stay in the inline buffer
pub const MAX_INLINE_ARGS: usize = 4;

pub(crate) type ArgBuffer = SmallVec<[qjs::JSValue; MAX_INLINE_ARGS]>;

fn marshal_into(buf: &mut ArgBuffer, args: &[&ValueRef<'_>]) {
    buf.extend(args.iter().map(|arg| arg.as_raw()));
}

fn marshal(args: &[&ValueRef<'_>]) -> ArgBuffer {
    let mut buf = ArgBuffer::with_capacity(args.len());
    marshal_into(&mut buf, args);
    buf
}

/// Pointer for the engine: null for an empty list
fn argv(buf: &mut ArgBuffer) -> *mut qjs::JSValue {
    if buf.is_empty() {
        ptr::null_mut()
    } else {
        buf.as_mut_ptr()
    }
}

impl<'ctx> ValueRef<'ctx> {
    /// Call the value as a function
    ///
    /// `this` defaults to `undefined`.
    pub fn call(
        &self,
        this: Option<&ValueRef<'ctx>>,
        args: &[&ValueRef<'ctx>],
    ) -> QjsResult<Value<'ctx>> {
        let this = this.map_or(qjs::JS_UNDEFINED, |t| t.as_raw());
        let mut buf = marshal(args);
        self.invoke(this, &mut buf)
    }

    /// Call the value with `new`
    pub fn call_constructor(&self, args: &[&ValueRef<'ctx>]) -> QjsResult<Value<'ctx>> {
        let ctx = self.context();
        let mut buf = marshal(args);
        // SAFETY: buf outlives the call and holds borrowed references only
        let raw = unsafe {
            qjs::JS_CallConstructor(ctx.raw(), self.as_raw(), buf.len() as _, argv(&mut buf))
        };
        ctx.check(raw)
    }

    /// Capture a receiver and leading arguments for repeated calls
    pub fn bind(
        &self,
        this: Option<&ValueRef<'ctx>>,
        prefix: &[&ValueRef<'ctx>],
    ) -> BoundFunction<'ctx> {
        let this = match this {
            Some(t) => t.dupe(),
            None => self.context().new_undefined(),
        };
        let prefix: Vec<Value<'ctx>> = prefix.iter().map(|arg| arg.dupe()).collect();
        let raw_prefix = prefix.iter().map(|arg| arg.as_raw()).collect();
        BoundFunction {
            func: self.dupe(),
            this,
            prefix,
            raw_prefix,
        }
    }

    fn invoke(&self, this: qjs::JSValue, buf: &mut ArgBuffer) -> QjsResult<Value<'ctx>> {
        let ctx = self.context();
        // SAFETY: buf outlives the call and holds borrowed references only
        let raw = unsafe {
            qjs::JS_Call(ctx.raw(), self.as_raw(), this, buf.len() as _, argv(buf))
        };
        ctx.check(raw)
    }
}

/// A function with a captured receiver and argument prefix
///
/// Holds its own references to the function, receiver, and prefix, released
/// on drop. The prefix is marshaled once, at bind time.
pub struct BoundFunction<'ctx> {
    func: Value<'ctx>,
    this: Value<'ctx>,
    // keeps the references behind raw_prefix alive
    #[allow(dead_code)]
    prefix: Vec<Value<'ctx>>,
    raw_prefix: ArgBuffer,
}

impl<'ctx> BoundFunction<'ctx> {
    /// Call with the captured prefix followed by `args`
    pub fn call(&self, args: &[&ValueRef<'ctx>]) -> QjsResult<Value<'ctx>> {
        let mut buf = ArgBuffer::with_capacity(self.raw_prefix.len() + args.len());
        buf.extend_from_slice(&self.raw_prefix);
        marshal_into(&mut buf, args);
        self.func.invoke(self.this.as_raw(), &mut buf)
    }

    /// Number of captured leading arguments
    pub fn prefix_len(&self) -> usize {
        self.raw_prefix.len()
    }
}

impl std::fmt::Debug for BoundFunction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundFunction")
            .field("func", &self.func)
            .field("prefix_len", &self.prefix_len())
            .finish()
    }
}
