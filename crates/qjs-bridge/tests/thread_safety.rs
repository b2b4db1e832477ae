//! Compile-fail tests for thread safety
//!
//! These tests verify that runtimes, contexts, values and atoms cannot be
//! sent across threads. The `compile_fail` doc tests ensure that attempting
//! to send these types to another thread results in a compilation error.

/// ```compile_fail
/// use qjs_bridge::Runtime;
/// use std::thread;
///
/// let rt = Runtime::new().unwrap();
/// thread::spawn(move || {
///     // This should fail to compile: Runtime is !Send
///     rt.run_gc();
/// });
/// ```
fn _runtime_not_send() {}

/// ```compile_fail
/// use qjs_bridge::{Context, Runtime};
///
/// fn assert_send<T: Send>() {}
/// assert_send::<Context<'static>>(); // Context is !Send
/// ```
fn _context_not_send() {}

/// ```compile_fail
/// use qjs_bridge::{Context, Runtime};
///
/// fn assert_sync<T: Sync>() {}
/// assert_sync::<Context<'static>>(); // Context is !Sync
/// ```
fn _context_not_sync() {}

/// ```compile_fail
/// use qjs_bridge::Value;
///
/// fn assert_send<T: Send>() {}
/// assert_send::<Value<'static>>(); // Value is !Send
/// ```
fn _value_not_send() {}

/// ```compile_fail
/// use qjs_bridge::ValueRef;
///
/// fn assert_send<T: Send>() {}
/// assert_send::<ValueRef<'static>>(); // ValueRef is !Send
/// ```
fn _value_ref_not_send() {}

/// ```compile_fail
/// use qjs_bridge::Atom;
///
/// fn assert_send<T: Send>() {}
/// assert_send::<Atom<'static>>(); // Atom is !Send
/// ```
fn _atom_not_send() {}

/// ```compile_fail
/// use qjs_bridge::BoundFunction;
///
/// fn assert_send<T: Send>() {}
/// assert_send::<BoundFunction<'static>>(); // BoundFunction is !Send
/// ```
fn _bound_function_not_send() {}

#[test]
fn errors_and_config_are_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<qjs_bridge::QjsError>();
    assert_send_sync::<qjs_bridge::JsException>();
    assert_send_sync::<qjs_bridge::RuntimeConfig>();
    assert_send_sync::<qjs_bridge::TypedArrayKind>();
}
