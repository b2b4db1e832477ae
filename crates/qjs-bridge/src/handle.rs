//! Refcount primitives shared by values and atoms, and the per-context
//! registry of releases deferred to teardown.

use qjs_bridge_sys as qjs;
use tracing::trace;

/// A foreign reference whose lifetime is managed by engine refcounting
pub(crate) trait ForeignRef: Copy {
    /// Increment the refcount and return the second reference
    ///
    /// # Safety
    /// `ctx` must be the live context that owns the reference
    unsafe fn duplicate(self, ctx: *mut qjs::JSContext) -> Self;

    /// Decrement the refcount
    ///
    /// # Safety
    /// `ctx` must be the live context that owns the reference, and the
    /// reference must be owned by the caller
    unsafe fn release(self, ctx: *mut qjs::JSContext);
}

impl ForeignRef for qjs::JSValue {
    unsafe fn duplicate(self, ctx: *mut qjs::JSContext) -> Self {
        // SAFETY: guaranteed by caller
        unsafe { qjs::JS_DupValue(ctx, self) }
    }

    unsafe fn release(self, ctx: *mut qjs::JSContext) {
        // SAFETY: guaranteed by caller
        unsafe { qjs::JS_FreeValue(ctx, self) }
    }
}

impl ForeignRef for qjs::JSAtom {
    unsafe fn duplicate(self, ctx: *mut qjs::JSContext) -> Self {
        // SAFETY: guaranteed by caller
        unsafe { qjs::JS_DupAtom(ctx, self) }
    }

    unsafe fn release(self, ctx: *mut qjs::JSContext) {
        // SAFETY: guaranteed by caller
        unsafe { qjs::JS_FreeAtom(ctx, self) }
    }
}

/// An owned reference whose release waits for context teardown
#[derive(Clone, Copy)]
pub(crate) enum Deferred {
    Value(qjs::JSValue),
    Atom(qjs::JSAtom),
}

impl Deferred {
    unsafe fn release(self, ctx: *mut qjs::JSContext) {
        // SAFETY: guaranteed by caller
        unsafe {
            match self {
                Deferred::Value(v) => v.release(ctx),
                Deferred::Atom(a) => a.release(ctx),
            }
        }
    }
}

/// Append-only list of deferred releases, drained exactly once
#[derive(Default)]
pub(crate) struct DeferredFrees {
    entries: Vec<Deferred>,
    drained: bool,
}

impl DeferredFrees {
    pub(crate) fn push(&mut self, entry: Deferred) {
        assert!(!self.drained, "deferred release registered after teardown");
        self.entries.push(entry);
        trace!(pending = self.entries.len(), "deferred release registered");
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub(crate) fn is_drained(&self) -> bool {
        self.drained
    }

    /// Release every entry in insertion order. Returns the number released;
    /// a second call releases nothing.
    ///
    /// # Safety
    /// `ctx` must be the live context every entry belongs to
    pub(crate) unsafe fn drain(&mut self, ctx: *mut qjs::JSContext) -> usize {
        // SAFETY: each entry is an owned reference into ctx
        self.drain_with(|entry| unsafe { entry.release(ctx) })
    }

    /// Hand every entry to `release` in insertion order, once
    fn drain_with(&mut self, mut release: impl FnMut(Deferred)) -> usize {
        if self.drained {
            return 0;
        }
        self.drained = true;
        let count = self.entries.len();
        for entry in self.entries.drain(..) {
            release(entry);
        }
        trace!(released = count, "deferred releases drained");
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_once() {
        // SAFETY: raw runtime and context are created and torn down here
        unsafe {
            let rt = qjs::JS_NewRuntime();
            let ctx = qjs::JS_NewContext(rt);

            let mut deferred = DeferredFrees::default();
            deferred.push(Deferred::Value(qjs::JS_NewObject(ctx)));
            deferred.push(Deferred::Value(qjs::JS_UNDEFINED));
            let name = "registry";
            deferred.push(Deferred::Atom(qjs::JS_NewAtomLen(
                ctx,
                name.as_ptr() as _,
                name.len() as _,
            )));
            assert_eq!(deferred.len(), 3);

            assert_eq!(deferred.drain(ctx), 3);
            assert!(deferred.is_drained());
            assert_eq!(deferred.drain(ctx), 0);
            assert_eq!(deferred.len(), 0);

            qjs::JS_FreeContext(ctx);
            qjs::JS_FreeRuntime(rt);
        }
    }

    #[derive(Debug, PartialEq)]
    enum Released {
        Value(i32),
        Atom(qjs::JSAtom),
    }

    #[test]
    fn test_drain_in_insertion_order() {
        // SAFETY: raw runtime and context are created and torn down here
        unsafe {
            let rt = qjs::JS_NewRuntime();
            let ctx = qjs::JS_NewContext(rt);

            let first = qjs::JS_NewAtomUInt32(ctx, 7);
            let second = qjs::JS_NewAtomUInt32(ctx, 3);
            let mut deferred = DeferredFrees::default();
            deferred.push(Deferred::Value(qjs::JS_MKVAL(qjs::TAG_INT, 2)));
            deferred.push(Deferred::Atom(first));
            deferred.push(Deferred::Value(qjs::JS_MKVAL(qjs::TAG_INT, 1)));
            deferred.push(Deferred::Atom(second));

            let mut order = Vec::new();
            let released = deferred.drain_with(|entry| {
                match entry {
                    Deferred::Value(v) => {
                        let mut n = 0;
                        assert_eq!(qjs::JS_ToInt32(ctx, &mut n, v), 0);
                        order.push(Released::Value(n));
                    }
                    Deferred::Atom(a) => order.push(Released::Atom(a)),
                }
                entry.release(ctx);
            });

            assert_eq!(released, 4);
            assert_eq!(
                order,
                vec![
                    Released::Value(2),
                    Released::Atom(first),
                    Released::Value(1),
                    Released::Atom(second),
                ]
            );
            assert_eq!(deferred.drain_with(|_| panic!("drained twice")), 0);

            qjs::JS_FreeContext(ctx);
            qjs::JS_FreeRuntime(rt);
        }
    }

    #[test]
    fn test_duplicate_then_release_balances() {
        // SAFETY: raw runtime and context are created and torn down here
        unsafe {
            let rt = qjs::JS_NewRuntime();
            let ctx = qjs::JS_NewContext(rt);

            let obj = qjs::JS_NewObject(ctx);
            let second = obj.duplicate(ctx);
            second.release(ctx);
            obj.release(ctx);

            qjs::JS_FreeContext(ctx);
            qjs::JS_FreeRuntime(rt);
        }
    }

    #[test]
    #[should_panic(expected = "after teardown")]
    fn test_push_after_drain_panics() {
        let mut deferred = DeferredFrees::default();
        // SAFETY: an empty registry never touches the context
        unsafe { deferred.drain(std::ptr::null_mut()) };
        deferred.push(Deferred::Value(qjs::JS_NULL));
    }
}
