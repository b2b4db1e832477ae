//! String conversion between Rust and the engine
//!
//! Both directions are length-prefixed, so embedded NUL bytes survive.

use qjs_bridge_sys as qjs;

use crate::context::Context;
use crate::error::{QjsError, QjsResult};
use crate::value::{Value, ValueRef};

impl<'rt> Context<'rt> {
    /// New string value holding `s` verbatim
    pub fn new_string(&self, s: &str) -> Value<'_> {
        // SAFETY: the pointer/length pair describes s
        let raw = unsafe { qjs::JS_NewStringLen(self.raw(), s.as_ptr() as _, s.len() as _) };
        Value::from_raw(self, raw)
    }
}

impl ValueRef<'_> {
    /// ECMA ToString
    ///
    /// Lone surrogates are replaced with U+FFFD.
    pub fn to_string(&self) -> QjsResult<String> {
        // SAFETY: ctx is live while borrowed
        unsafe { engine_string(self.context().raw(), self.as_raw()) }
            .ok_or_else(|| QjsError::Exception(self.context().take_exception()))
    }

    /// ToString that swallows failures, yielding an empty string
    pub(crate) fn to_string_lossy(&self) -> String {
        let ctx = self.context().raw();
        // SAFETY: ctx is live while borrowed
        unsafe {
            engine_string(ctx, self.as_raw()).unwrap_or_else(|| {
                qjs::JS_FreeValue(ctx, qjs::JS_GetException(ctx));
                String::new()
            })
        }
    }
}

/// Source text with the terminating NUL the parser expects. Embedded NUL
/// bytes are kept; the engine is always given `text.len()` explicitly.
pub(crate) fn nul_terminated(text: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(text.len() + 1);
    buf.extend_from_slice(text.as_bytes());
    buf.push(0);
    buf
}

/// Copy the engine's string form of `value`, `None` if conversion raised
unsafe fn engine_string(ctx: *mut qjs::JSContext, value: qjs::JSValue) -> Option<String> {
    let mut len = 0;
    // SAFETY: ctx is live per caller contract
    unsafe {
        let ptr = qjs::JS_ToCStringLen(ctx, &mut len, value);
        if ptr.is_null() {
            return None;
        }
        let bytes = std::slice::from_raw_parts(ptr as *const u8, len as usize);
        let s = String::from_utf8_lossy(bytes).into_owned();
        qjs::JS_FreeCString(ctx, ptr);
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::nul_terminated;
    use crate::Runtime;

    #[test]
    fn test_nul_terminated_keeps_inner_nul() {
        assert_eq!(nul_terminated("a\x00b"), b"a\x00b\x00");
        assert_eq!(nul_terminated(""), b"\x00");
    }

    #[test]
    fn test_string_round_trip() {
        let rt = Runtime::new().unwrap();
        let ctx = rt.new_context().unwrap();

        let s = ctx.new_string("hello world!");
        assert!(s.is_string());
        assert_eq!(s.to_string().unwrap(), "hello world!");
    }

    #[test]
    fn test_embedded_nul() {
        let rt = Runtime::new().unwrap();
        let ctx = rt.new_context().unwrap();

        let s = ctx.new_string("hello \x00 world!");
        assert_eq!(s.to_string().unwrap(), "hello \x00 world!");
        assert_eq!(s.get("length").unwrap().to_int32().unwrap(), 14);
    }

    #[test]
    fn test_non_ascii() {
        let rt = Runtime::new().unwrap();
        let ctx = rt.new_context().unwrap();

        let s = ctx.new_string("żółw 🐢");
        assert_eq!(s.to_string().unwrap(), "żółw 🐢");
        assert_eq!(ctx.eval("'\\u{1F422}'").unwrap().to_string().unwrap(), "🐢");
    }

    #[test]
    fn test_number_to_string() {
        let rt = Runtime::new().unwrap();
        let ctx = rt.new_context().unwrap();

        assert_eq!(ctx.new_float64(1.5).to_string().unwrap(), "1.5");
        assert_eq!(ctx.new_int32(-7).to_string().unwrap(), "-7");
        assert_eq!(ctx.new_null().to_string().unwrap(), "null");
    }
}
