//! Array buffers over copied or host-owned memory
//!
//! Copy mode hands the engine its own copy of the bytes. Shared mode hands
//! it a pointer into a host allocation that is pinned in a process-wide
//! registry until the engine frees the buffer's backing store. The engine
//! identifies the allocation by an opaque token, and the release callback
//! is the only path that unpins it.

use dashmap::DashMap;
use qjs_bridge_sys as qjs;
use std::ffi::c_void;
use std::ptr::{self, NonNull};
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

use crate::context::Context;
use crate::error::{QjsError, QjsResult};
use crate::value::{Value, ValueRef};

/// A host allocation lent to the engine
struct PinnedRegion {
    ptr: NonNull<u8>,
    len: usize,
}

// SAFETY: the region is plain bytes owned by the registry entry; the engine
// is the only party that touches them while pinned
unsafe impl Send for PinnedRegion {}
unsafe impl Sync for PinnedRegion {}

impl PinnedRegion {
    fn new(bytes: Vec<u8>) -> Self {
        let len = bytes.len();
        let raw = Box::into_raw(bytes.into_boxed_slice());
        // SAFETY: Box::into_raw never returns null
        let ptr = unsafe { NonNull::new_unchecked(raw as *mut u8) };
        Self { ptr, len }
    }
}

impl Drop for PinnedRegion {
    fn drop(&mut self) {
        // SAFETY: ptr/len came from Box::into_raw in `new`
        unsafe {
            drop(Box::from_raw(ptr::slice_from_raw_parts_mut(
                self.ptr.as_ptr(),
                self.len,
            )));
        }
    }
}

static PINNED: LazyLock<DashMap<u64, PinnedRegion>> = LazyLock::new(DashMap::new);

/// Zero is reserved so a null opaque pointer never matches a region
static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Number of host regions currently lent to any engine
pub fn live_pinned_regions() -> usize {
    PINNED.len()
}

/// Engine free callback for shared buffers. Fires at most once per buffer,
/// possibly never; unknown tokens are ignored.
unsafe extern "C" fn release_pinned_region(
    _rt: *mut qjs::JSRuntime,
    opaque: *mut c_void,
    data: *mut c_void,
) {
    let token = opaque as usize as u64;
    if token == 0 {
        return;
    }
    match PINNED.remove(&token) {
        Some((_, region)) => {
            trace!(token, len = region.len, ?data, "pinned region released");
        }
        None => trace!(token, "release for unknown or already released region"),
    }
}

impl<'rt> Context<'rt> {
    /// New `ArrayBuffer` holding a copy of `bytes`
    pub fn new_array_buffer(&self, bytes: &[u8]) -> QjsResult<Value<'_>> {
        // SAFETY: the engine copies len bytes out of the slice
        let raw = unsafe { qjs::JS_NewArrayBufferCopy(self.raw(), bytes.as_ptr(), bytes.len() as _) };
        self.check(raw)
    }

    /// New `ArrayBuffer` backed directly by `bytes`
    ///
    /// The allocation stays pinned until the engine frees the buffer. Empty
    /// input has no address to share and yields an ordinary empty buffer.
    pub fn new_array_buffer_shared(&self, bytes: Vec<u8>) -> QjsResult<Value<'_>> {
        if bytes.is_empty() {
            return self.new_array_buffer(&[]);
        }

        let region = PinnedRegion::new(bytes);
        let (data, len) = (region.ptr.as_ptr(), region.len);
        let token = NEXT_TOKEN.fetch_add(1, Ordering::Relaxed);
        PINNED.insert(token, region);
        trace!(token, len, "pinned region lent to engine");

        // SAFETY: data stays valid until release_pinned_region removes the
        // token's entry
        let raw = unsafe {
            qjs::JS_NewArrayBuffer(
                self.raw(),
                data,
                len as _,
                Some(release_pinned_region),
                token as usize as *mut c_void,
                false as _,
            )
        };
        if qjs::value_tag(raw) == qjs::TAG_EXCEPTION {
            PINNED.remove(&token);
        }
        self.check(raw)
    }
}

impl<'ctx> ValueRef<'ctx> {
    /// Copy out the bytes of an `ArrayBuffer` or a typed array's view
    pub fn to_byte_array(&self) -> QjsResult<Vec<u8>> {
        // SAFETY: the view is copied before self can be released
        unsafe { self.to_byte_array_shared().map(|bytes| bytes.to_vec()) }
    }

    /// Alias the bytes of an `ArrayBuffer` or a typed array's view
    ///
    /// # Safety
    /// The slice aliases engine memory. It must not be used after script
    /// code detaches or resizes the buffer, and no other view of the same
    /// bytes may be held at the same time.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn to_byte_array_shared(&self) -> QjsResult<&mut [u8]> {
        let (buffer, offset, len) = if self.is_array_buffer() {
            (None, 0, None)
        } else if self.identify_typed_array().is_some() {
            let info = self.typed_array_info()?;
            (Some(info.buffer), info.byte_offset, Some(info.byte_length))
        } else {
            return Err(QjsError::type_error("ArrayBuffer or TypedArray", self.type_name()));
        };

        let ctx = self.context();
        let target = buffer.as_deref().map_or(self.as_raw(), |b| b.as_raw());
        let mut size = 0;
        // SAFETY: target is a live array buffer
        let data = unsafe { qjs::JS_GetArrayBuffer(ctx.raw(), &mut size, target) };
        if data.is_null() {
            // detached
            return Err(QjsError::Exception(ctx.take_exception()));
        }
        let len = len.unwrap_or(size as usize);
        // SAFETY: [offset, offset + len) lies within the buffer, which the
        // typed array or self keeps alive
        Ok(unsafe { std::slice::from_raw_parts_mut(data.add(offset), len) })
    }
}
