//! Property access on values
//!
//! The atom-keyed operations are the primitive ones. String- and
//! index-keyed variants intern a temporary atom, delegate, and release it,
//! so both paths always agree. Writes take the value by move: the target
//! object owns it afterwards, whether or not the write succeeded.

use bitflags::bitflags;
use qjs_bridge_sys as qjs;
use std::ffi::c_int;
use std::ptr;

use crate::atom::{Atom, AtomRef};
use crate::error::{QjsError, QjsResult};
use crate::value::{Value, ValueRef};

/// Largest supported numeric property index
pub const MAX_INDEX: i64 = i32::MAX as i64;

bitflags! {
    /// Which own keys `own_property_names` reports
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PropertyFilter: c_int {
        const STRINGS = qjs::GPN_STRING_MASK;
        const SYMBOLS = qjs::GPN_SYMBOL_MASK;
        const PRIVATE = qjs::GPN_PRIVATE_MASK;
        const ENUMERABLE_ONLY = qjs::GPN_ENUM_ONLY;
    }
}

impl<'ctx> ValueRef<'ctx> {
    fn require_object(&self, operation: &'static str) -> QjsResult<()> {
        if self.is_object() {
            Ok(())
        } else {
            Err(QjsError::contract_violation(
                operation,
                format!("target is not an object (got {})", self.type_name()),
            ))
        }
    }

    fn index_atom(&self, idx: i64) -> QjsResult<Atom<'ctx>> {
        if !(0..=MAX_INDEX).contains(&idx) {
            return Err(QjsError::IndexOutOfRange(idx));
        }
        Ok(self.context().new_atom_idx(idx as u32))
    }

    // Atom-keyed

    /// Read a property. Getters run and may raise.
    pub fn get_atom(&self, atom: &AtomRef<'_>) -> QjsResult<Value<'ctx>> {
        let ctx = self.context();
        // SAFETY: ctx is live while borrowed
        let raw = unsafe { qjs::JS_GetProperty(ctx.raw(), self.as_raw(), atom.as_raw()) };
        ctx.check(raw)
    }

    /// Write a property, transferring `value` into the object
    pub fn set_atom(&self, atom: &AtomRef<'_>, value: Value<'ctx>) -> QjsResult<()> {
        self.require_object("set_atom")?;
        let ctx = self.context();
        // SAFETY: JS_SetProperty consumes the value reference on every path
        let status = unsafe {
            qjs::JS_SetProperty(ctx.raw(), self.as_raw(), atom.as_raw(), value.into_raw())
        };
        ctx.check_status(status, "set_atom").map(|_| ())
    }

    /// Whether the key exists on the object or its prototype chain
    pub fn has_atom(&self, atom: &AtomRef<'_>) -> QjsResult<bool> {
        self.require_object("has_atom")?;
        let ctx = self.context();
        // SAFETY: ctx is live while borrowed
        let status = unsafe { qjs::JS_HasProperty(ctx.raw(), self.as_raw(), atom.as_raw()) };
        Ok(ctx.check_status(status, "has_atom")? > 0)
    }

    /// Remove an own property. True only if one existed and is now gone.
    pub fn delete_atom(&self, atom: &AtomRef<'_>) -> QjsResult<bool> {
        self.require_object("delete_atom")?;
        let ctx = self.context();
        // SAFETY: a null descriptor asks only for existence
        let own = unsafe {
            qjs::JS_GetOwnProperty(ctx.raw(), ptr::null_mut(), self.as_raw(), atom.as_raw())
        };
        if ctx.check_status(own, "delete_atom")? == 0 {
            return Ok(false);
        }
        // SAFETY: ctx is live while borrowed
        let status =
            unsafe { qjs::JS_DeleteProperty(ctx.raw(), self.as_raw(), atom.as_raw(), 0) };
        Ok(ctx.check_status(status, "delete_atom")? > 0)
    }

    // String-keyed

    pub fn get(&self, key: &str) -> QjsResult<Value<'ctx>> {
        let atom = self.context().new_atom(key);
        self.get_atom(&atom)
    }

    pub fn set(&self, key: &str, value: Value<'ctx>) -> QjsResult<()> {
        let atom = self.context().new_atom(key);
        self.set_atom(&atom, value)
    }

    pub fn has(&self, key: &str) -> QjsResult<bool> {
        let atom = self.context().new_atom(key);
        self.has_atom(&atom)
    }

    pub fn delete(&self, key: &str) -> QjsResult<bool> {
        let atom = self.context().new_atom(key);
        self.delete_atom(&atom)
    }

    // Index-keyed, limited to [0, MAX_INDEX]

    pub fn get_idx(&self, idx: i64) -> QjsResult<Value<'ctx>> {
        let atom = self.index_atom(idx)?;
        self.get_atom(&atom)
    }

    pub fn set_idx(&self, idx: i64, value: Value<'ctx>) -> QjsResult<()> {
        let atom = self.index_atom(idx)?;
        self.set_atom(&atom, value)
    }

    pub fn has_idx(&self, idx: i64) -> QjsResult<bool> {
        let atom = self.index_atom(idx)?;
        self.has_atom(&atom)
    }

    pub fn delete_idx(&self, idx: i64) -> QjsResult<bool> {
        let atom = self.index_atom(idx)?;
        self.delete_atom(&atom)
    }

    /// Call the method stored under `name` with `self` as the receiver
    pub fn call_method(&self, name: &str, args: &[&ValueRef<'ctx>]) -> QjsResult<Value<'ctx>> {
        let method = self.get(name)?;
        method.call(Some(self), args)
    }

    /// Own property keys matching `filter`, in engine enumeration order
    pub fn own_property_names(&self, filter: PropertyFilter) -> QjsResult<Vec<Atom<'ctx>>> {
        self.require_object("own_property_names")?;
        let ctx = self.context();
        let mut tab: *mut qjs::JSPropertyEnum = ptr::null_mut();
        let mut len: u32 = 0;
        // SAFETY: on success tab holds len owned atoms
        let status = unsafe {
            qjs::JS_GetOwnPropertyNames(ctx.raw(), &mut tab, &mut len, self.as_raw(), filter.bits())
        };
        ctx.check_status(status, "own_property_names")?;

        let mut atoms = Vec::with_capacity(len as usize);
        // SAFETY: every entry is read once, its atom reference moves into an
        // owned Atom, and only the array itself is freed
        unsafe {
            for i in 0..len as usize {
                atoms.push(Atom::from_raw(ctx, (*tab.add(i)).atom));
            }
            qjs::js_free(ctx.raw(), tab as _);
        }
        Ok(atoms)
    }

    /// Enumerable own string keys, like `Object.keys`
    pub fn keys(&self) -> QjsResult<Vec<String>> {
        self.own_property_names(PropertyFilter::STRINGS | PropertyFilter::ENUMERABLE_ONLY)?
            .iter()
            .map(|atom| atom.to_string())
            .collect()
    }
}
