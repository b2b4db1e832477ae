//! Arrays and keyed collections

use qjs_bridge_sys as qjs;

use crate::context::Context;
use crate::error::{QjsError, QjsResult};
use crate::value::{Value, ValueRef};

impl<'rt> Context<'rt> {
    pub fn new_array(&self) -> Value<'_> {
        // SAFETY: context is live
        Value::from_raw(self, unsafe { qjs::JS_NewArray(self.raw()) })
    }

    pub fn new_map(&self) -> QjsResult<Value<'_>> {
        ValueRef::new(self, self.cache().map).call_constructor(&[])
    }

    pub fn new_set(&self) -> QjsResult<Value<'_>> {
        ValueRef::new(self, self.cache().set).call_constructor(&[])
    }

    pub fn new_weak_map(&self) -> QjsResult<Value<'_>> {
        ValueRef::new(self, self.cache().weak_map).call_constructor(&[])
    }

    pub fn new_weak_set(&self) -> QjsResult<Value<'_>> {
        ValueRef::new(self, self.cache().weak_set).call_constructor(&[])
    }
}

impl<'ctx> ValueRef<'ctx> {
    pub fn is_array(&self) -> bool {
        self.instance_of_cached(self.context().cache().array)
    }

    pub fn is_map(&self) -> bool {
        self.instance_of_cached(self.context().cache().map)
    }

    pub fn is_set(&self) -> bool {
        self.instance_of_cached(self.context().cache().set)
    }

    pub fn is_weak_map(&self) -> bool {
        self.instance_of_cached(self.context().cache().weak_map)
    }

    pub fn is_weak_set(&self) -> bool {
        self.instance_of_cached(self.context().cache().weak_set)
    }

    /// Element count of an array or typed array, entry count of a map or
    /// set, or byte length of an array buffer
    pub fn len(&self) -> QjsResult<usize> {
        let ctx = self.context();
        let cache = ctx.cache();
        let key = if self.is_array() || self.identify_typed_array().is_some() {
            cache.length
        } else if self.is_map() || self.is_set() {
            cache.size
        } else if self.is_array_buffer() {
            cache.byte_length
        } else {
            return Err(QjsError::contract_violation(
                "len",
                format!("{} has no length", self.type_name()),
            ));
        };
        let len = self.get_atom(&ctx.cached_atom(key))?.to_int64()?;
        usize::try_from(len).map_err(|_| QjsError::internal(format!("negative length {len}")))
    }

    pub fn is_empty(&self) -> QjsResult<bool> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::Runtime;

    #[test]
    fn test_array() {
        let rt = Runtime::new().unwrap();
        let ctx = rt.new_context().unwrap();

        let arr = ctx.new_array();
        assert!(arr.is_array());
        assert_eq!(arr.len().unwrap(), 0);
        for i in 0..3 {
            arr.set_idx(i, ctx.new_int64(i * 10)).unwrap();
        }
        assert_eq!(arr.len().unwrap(), 3);
        assert!(!ctx.new_object().is_array());
    }

    #[test]
    fn test_map_and_set() {
        let rt = Runtime::new().unwrap();
        let ctx = rt.new_context().unwrap();

        let map = ctx.new_map().unwrap();
        assert!(map.is_map());
        assert!(!map.is_set());
        let (k, v) = (ctx.new_string("k"), ctx.new_int32(1));
        map.call_method("set", &[&k, &v]).unwrap();
        assert_eq!(map.len().unwrap(), 1);

        let set = ctx.new_set().unwrap();
        assert!(set.is_set());
        set.call_method("add", &[&k]).unwrap();
        set.call_method("add", &[&k]).unwrap();
        assert_eq!(set.len().unwrap(), 1);
    }

    #[test]
    fn test_weak_collections() {
        let rt = Runtime::new().unwrap();
        let ctx = rt.new_context().unwrap();

        let weak_map = ctx.new_weak_map().unwrap();
        assert!(weak_map.is_weak_map());
        assert!(!weak_map.is_map());
        let weak_set = ctx.new_weak_set().unwrap();
        assert!(weak_set.is_weak_set());
        assert!(weak_set.len().unwrap_err().is_contract_violation());
    }

    #[test]
    fn test_len_of_buffers() {
        let rt = Runtime::new().unwrap();
        let ctx = rt.new_context().unwrap();

        let buf = ctx.new_array_buffer(&[0; 16]).unwrap();
        assert_eq!(buf.len().unwrap(), 16);
        let view = ctx.eval("new Float64Array(6)").unwrap();
        assert_eq!(view.len().unwrap(), 6);
    }
}
