//! Interned property keys
//!
//! Atoms are the engine's property-key handles. They are refcounted like
//! values: [`Atom`] owns one reference, [`AtomRef`] only views it. Two atoms
//! created from the same key share one engine entry, but each creation takes
//! its own reference and must be released separately.

use qjs_bridge_sys as qjs;
use std::mem::ManuallyDrop;
use std::ops::Deref;

use crate::context::Context;
use crate::error::{QjsError, QjsResult};
use crate::handle::{Deferred, ForeignRef};
use crate::value::{Value, ValueRef};

/// Tagged-integer atoms carry the index in the low 31 bits
const ATOM_TAG_INT: u32 = 1 << 31;

/// A borrowed view of an atom
pub struct AtomRef<'ctx> {
    ctx: &'ctx Context<'ctx>,
    raw: qjs::JSAtom,
}

/// An owned atom reference, released on drop
pub struct Atom<'ctx> {
    inner: AtomRef<'ctx>,
}

impl<'ctx> AtomRef<'ctx> {
    /// Get the raw atom without transferring ownership
    pub fn as_raw(&self) -> qjs::JSAtom {
        self.raw
    }

    /// Whether the atom encodes an integer index
    pub fn is_index(&self) -> bool {
        self.raw & ATOM_TAG_INT != 0
    }

    /// Take a second owned reference
    pub fn dupe(&self) -> Atom<'ctx> {
        // SAFETY: raw belongs to ctx, which is live while borrowed
        let raw = unsafe { self.raw.duplicate(self.ctx.raw()) };
        Atom::from_raw(self.ctx, raw)
    }

    /// The key as a value: a number for index atoms, otherwise a string or
    /// the symbol the atom was derived from
    pub fn to_value(&self) -> QjsResult<Value<'ctx>> {
        if self.is_index() {
            return Ok(self.ctx.new_uint32(self.raw & !ATOM_TAG_INT));
        }
        // SAFETY: ctx is live while borrowed
        let raw = unsafe { qjs::JS_AtomToValue(self.ctx.raw(), self.raw) };
        self.ctx.check(raw)
    }

    /// The key's string form. Symbols yield their description.
    pub fn to_string(&self) -> QjsResult<String> {
        // SAFETY: ctx is live while borrowed
        let raw = unsafe { qjs::JS_AtomToString(self.ctx.raw(), self.raw) };
        self.ctx.check(raw)?.to_string()
    }
}

impl<'ctx> Atom<'ctx> {
    pub(crate) fn from_raw(ctx: &'ctx Context<'ctx>, raw: qjs::JSAtom) -> Self {
        Self {
            inner: AtomRef { ctx, raw },
        }
    }

    /// Give up ownership of the atom without releasing it
    pub fn into_raw(self) -> qjs::JSAtom {
        ManuallyDrop::new(self).inner.raw
    }

    /// Release the atom now
    pub fn free(self) {
        drop(self);
    }

    /// Move release responsibility to the context's teardown
    pub fn free_on_exit(self) -> AtomRef<'ctx> {
        let ctx = self.inner.ctx;
        let raw = self.into_raw();
        ctx.defer(Deferred::Atom(raw));
        AtomRef { ctx, raw }
    }
}

impl<'ctx> Deref for Atom<'ctx> {
    type Target = AtomRef<'ctx>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<'ctx> AsRef<AtomRef<'ctx>> for Atom<'ctx> {
    fn as_ref(&self) -> &AtomRef<'ctx> {
        &self.inner
    }
}

impl Clone for Atom<'_> {
    fn clone(&self) -> Self {
        self.inner.dupe()
    }
}

impl Drop for Atom<'_> {
    fn drop(&mut self) {
        if self.inner.raw != qjs::ATOM_NULL {
            // SAFETY: self owns one reference into a live context
            unsafe { self.inner.raw.release(self.inner.ctx.raw()) };
        }
    }
}

impl std::fmt::Debug for AtomRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_string() {
            Ok(s) => write!(f, "Atom({:?})", s),
            Err(_) => write!(f, "Atom(#{})", self.raw),
        }
    }
}

impl std::fmt::Debug for Atom<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inner.fmt(f)
    }
}

impl<'rt> Context<'rt> {
    /// Intern a string key
    pub fn new_atom(&self, key: &str) -> Atom<'_> {
        // SAFETY: the pointer/length pair describes key
        let raw = unsafe { qjs::JS_NewAtomLen(self.raw(), key.as_ptr() as _, key.len() as _) };
        Atom::from_raw(self, raw)
    }

    /// Intern an integer index key
    pub fn new_atom_idx(&self, idx: u32) -> Atom<'_> {
        // SAFETY: context is live
        let raw = unsafe { qjs::JS_NewAtomUInt32(self.raw(), idx) };
        Atom::from_raw(self, raw)
    }

    /// View of an atom cached for the context's lifetime
    pub(crate) fn cached_atom(&self, raw: qjs::JSAtom) -> AtomRef<'_> {
        AtomRef { ctx: self, raw }
    }
}

impl<'ctx> ValueRef<'ctx> {
    /// Convert the value to a property key (ECMA ToPropertyKey)
    pub fn to_atom(&self) -> QjsResult<Atom<'ctx>> {
        let ctx = self.context();
        // SAFETY: ctx is live while borrowed
        let raw = unsafe { qjs::JS_ValueToAtom(ctx.raw(), self.as_raw()) };
        if raw == qjs::ATOM_NULL {
            return Err(QjsError::Exception(ctx.take_exception()));
        }
        Ok(Atom::from_raw(ctx, raw))
    }
}
