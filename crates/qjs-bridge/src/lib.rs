//! Safe value-ownership bridge for QuickJS.
//!
//! This crate wraps the raw engine bindings in `qjs-bridge-sys` with
//! ownership-typed handles. Every engine reference held by Rust code lives
//! in an owned wrapper ([`Value`], [`Atom`]) that releases it exactly once,
//! or in a borrowed view ([`ValueRef`], [`AtomRef`]) that never does.
//!
//! # Example
//!
//! ```
//! use qjs_bridge::Runtime;
//!
//! let rt = Runtime::new().unwrap();
//! let ctx = rt.new_context().unwrap();
//! let result = ctx.eval("1 + 1").unwrap();
//! assert_eq!(result.to_int32().unwrap(), 2);
//! ```
//!
//! # Ownership
//!
//! Operations that store a value into an object take it by move:
//!
//! ```
//! use qjs_bridge::Runtime;
//!
//! let rt = Runtime::new().unwrap();
//! let ctx = rt.new_context().unwrap();
//! let obj = ctx.new_object();
//! let name = ctx.new_string("widget");
//! obj.set("name", name).unwrap();
//! // `name` is now owned by `obj`
//! ```
//!
//! ```compile_fail
//! use qjs_bridge::Runtime;
//!
//! let rt = Runtime::new().unwrap();
//! let ctx = rt.new_context().unwrap();
//! let obj = ctx.new_object();
//! let name = ctx.new_string("widget");
//! obj.set("name", name).unwrap();
//! name.to_string(); // Error: use of moved value
//! ```
//!
//! Handles borrow their context, so a context cannot be freed under them:
//!
//! ```compile_fail
//! use qjs_bridge::Runtime;
//!
//! let rt = Runtime::new().unwrap();
//! let mut ctx = rt.new_context().unwrap();
//! let value = ctx.new_object();
//! ctx.free(); // Error: ctx is still borrowed by value
//! drop(value);
//! ```
//!
//! # Thread Safety
//!
//! All types in this crate are `!Send` and `!Sync` because the engine is
//! single-threaded per runtime. Attempting to use them from multiple threads
//! causes undefined behavior.
//!
//! ## Example: Wrong (won't compile)
//!
//! ```compile_fail
//! use qjs_bridge::Runtime;
//! use std::thread;
//!
//! let rt = Runtime::new().unwrap();
//! thread::spawn(move || {
//!     rt.run_gc(); // Error: Runtime is !Send
//! });
//! ```
//!
//! ```compile_fail
//! fn assert_send<T: Send>() {}
//! assert_send::<qjs_bridge::Value<'static>>(); // Error: Value is !Send
//! ```
//!
//! The one exception is the shared-buffer pin registry, which the engine's
//! release callback may reach from any thread.

mod atom;
mod collection;
pub mod config;
mod context;
pub mod error;
mod function;
mod handle;
mod json;
mod object;
mod runtime;
pub mod shared;
mod string;
mod typed_array;
mod value;

pub use qjs_bridge_sys as sys;

pub use atom::{Atom, AtomRef};
pub use config::RuntimeConfig;
pub use context::{Context, EvalMode};
pub use error::{JsException, QjsError, QjsResult};
pub use function::{BoundFunction, MAX_INLINE_ARGS};
pub use object::{MAX_INDEX, PropertyFilter};
pub use runtime::Runtime;
pub use shared::live_pinned_regions;
pub use typed_array::{TypedArrayInfo, TypedArrayKind};
pub use value::{Value, ValueRef};

pub use num_bigint::BigInt;
