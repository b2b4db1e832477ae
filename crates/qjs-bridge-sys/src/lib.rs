//! Raw FFI surface of the QuickJS-ng engine
//!
//! This crate re-exports the low-level bindings generated by `rquickjs-sys`
//! and adds the constants and inline helpers that QuickJS only defines in
//! its header. Use the safe wrappers in `qjs-bridge` for higher-level access.

#![allow(non_camel_case_types)]
#![allow(non_upper_case_globals)]
#![allow(clippy::missing_safety_doc)]

use std::os::raw::c_int;

pub use rquickjs_sys::*;

// Value tags, normalized to i32 so they can be used as match patterns
pub const TAG_BIG_INT: i32 = JS_TAG_BIG_INT as i32;
pub const TAG_SYMBOL: i32 = JS_TAG_SYMBOL as i32;
pub const TAG_STRING: i32 = JS_TAG_STRING as i32;
pub const TAG_OBJECT: i32 = JS_TAG_OBJECT as i32;
pub const TAG_INT: i32 = JS_TAG_INT as i32;
pub const TAG_BOOL: i32 = JS_TAG_BOOL as i32;
pub const TAG_NULL: i32 = JS_TAG_NULL as i32;
pub const TAG_UNDEFINED: i32 = JS_TAG_UNDEFINED as i32;
pub const TAG_UNINITIALIZED: i32 = JS_TAG_UNINITIALIZED as i32;
pub const TAG_EXCEPTION: i32 = JS_TAG_EXCEPTION as i32;
pub const TAG_FLOAT64: i32 = JS_TAG_FLOAT64 as i32;

// Eval flags (quickjs.h)
pub const EVAL_TYPE_GLOBAL: c_int = 0;
pub const EVAL_TYPE_MODULE: c_int = 1;
pub const EVAL_FLAG_STRICT: c_int = 1 << 3;
pub const EVAL_FLAG_ASYNC: c_int = 1 << 7;

// JS_GetOwnPropertyNames filter flags
pub const GPN_STRING_MASK: c_int = 1 << 0;
pub const GPN_SYMBOL_MASK: c_int = 1 << 1;
pub const GPN_PRIVATE_MASK: c_int = 1 << 2;
pub const GPN_ENUM_ONLY: c_int = 1 << 4;

/// The null atom returned by atom constructors on failure
pub const ATOM_NULL: JSAtom = 0;

// Typed array element kinds, numbered as JSTypedArrayEnum
pub const TYPED_ARRAY_UINT8C: i32 = 0;
pub const TYPED_ARRAY_INT8: i32 = 1;
pub const TYPED_ARRAY_UINT8: i32 = 2;
pub const TYPED_ARRAY_INT16: i32 = 3;
pub const TYPED_ARRAY_UINT16: i32 = 4;
pub const TYPED_ARRAY_INT32: i32 = 5;
pub const TYPED_ARRAY_UINT32: i32 = 6;
pub const TYPED_ARRAY_BIG_INT64: i32 = 7;
pub const TYPED_ARRAY_BIG_UINT64: i32 = 8;
pub const TYPED_ARRAY_FLOAT16: i32 = 9;
pub const TYPED_ARRAY_FLOAT32: i32 = 10;
pub const TYPED_ARRAY_FLOAT64: i32 = 11;

/// Get the normalized tag of a value
#[inline]
pub fn value_tag(v: JSValue) -> i32 {
    // SAFETY: reading the tag never dereferences the payload
    #[allow(unused_unsafe)]
    unsafe {
        JS_VALUE_GET_NORM_TAG(v) as i32
    }
}

/// Whether the value carries a reference-counted payload
///
/// All heap tags (strings, symbols, bigints, objects) are negative.
#[inline]
pub fn has_ref_count(v: JSValue) -> bool {
    value_tag(v) < 0
}

/// Whether the tag denotes a bigint
///
/// Newer engine revisions store small bigints under an immediate tag with no
/// stable number, so any non-negative tag outside the known immediates counts.
#[inline]
pub fn is_bigint_tag(tag: i32) -> bool {
    const TAG_CATCH_OFFSET: i32 = JS_TAG_CATCH_OFFSET as i32;
    match tag {
        TAG_BIG_INT => true,
        TAG_INT | TAG_BOOL | TAG_NULL | TAG_UNDEFINED | TAG_UNINITIALIZED | TAG_EXCEPTION
        | TAG_FLOAT64 | TAG_CATCH_OFFSET => false,
        t => t >= 0,
    }
}

/// Create a number from an `i64`, using the int tag when it fits in 32 bits
///
/// Mirrors the header-only `JS_NewInt64`.
#[inline]
pub unsafe fn new_int64(ctx: *mut JSContext, v: i64) -> JSValue {
    unsafe {
        if v >= i32::MIN as i64 && v <= i32::MAX as i64 {
            JS_MKVAL(TAG_INT, v as i32)
        } else {
            JS_NewFloat64(v as f64)
        }
    }
}

/// Create a number from a `u32`
///
/// Mirrors the header-only `JS_NewUint32`.
#[inline]
pub unsafe fn new_uint32(ctx: *mut JSContext, v: u32) -> JSValue {
    unsafe {
        if v <= i32::MAX as u32 {
            JS_MKVAL(TAG_INT, v as i32)
        } else {
            JS_NewFloat64(v as f64)
        }
    }
}

/// ECMA ToUint32, which shares its bit pattern with ToInt32
///
/// Mirrors the header-only `JS_ToUint32`.
#[inline]
pub unsafe fn to_uint32(ctx: *mut JSContext, pres: *mut u32, v: JSValue) -> c_int {
    unsafe { JS_ToInt32(ctx, pres as *mut i32, v) }
}

/// Interpret an engine predicate result, which is `bool` or `int` depending
/// on the engine revision
#[inline]
pub fn truthy<T: Into<i32>>(result: T) -> bool {
    result.into() > 0
}
