//! JSON bridge between engine values and serde types

use qjs_bridge_sys as qjs;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::context::Context;
use crate::error::{QjsError, QjsResult};
use crate::string::nul_terminated;
use crate::value::{Value, ValueRef};

impl<'rt> Context<'rt> {
    /// Parse JSON text into a value
    pub fn parse_json(&self, text: &str) -> QjsResult<Value<'_>> {
        let source = nul_terminated(text);
        // SAFETY: source is NUL-terminated at text.len(), as JS_ParseJSON requires
        let raw = unsafe {
            qjs::JS_ParseJSON(self.raw(), source.as_ptr() as _, text.len() as _, c"<json>".as_ptr())
        };
        self.check(raw)
    }

    /// Convert a serde value into an engine value
    pub fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> QjsResult<Value<'_>> {
        let json = serde_json::to_string(value)?;
        self.parse_json(&json)
    }
}

impl ValueRef<'_> {
    /// `JSON.stringify`; `None` when the value has no JSON form
    pub fn to_json(&self) -> QjsResult<Option<String>> {
        let ctx = self.context();
        // SAFETY: ctx is live while borrowed
        let raw = unsafe {
            qjs::JS_JSONStringify(ctx.raw(), self.as_raw(), qjs::JS_UNDEFINED, qjs::JS_UNDEFINED)
        };
        let json = ctx.check(raw)?;
        if json.is_undefined() {
            return Ok(None);
        }
        json.to_string().map(Some)
    }

    /// Convert into a serde type through JSON
    pub fn deserialize<T: DeserializeOwned>(&self) -> QjsResult<T> {
        let json = self
            .to_json()?
            .ok_or_else(|| QjsError::type_error("JSON-serializable value", self.type_name()))?;
        Ok(serde_json::from_str(&json)?)
    }
}
