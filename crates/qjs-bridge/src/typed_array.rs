//! Typed array kinds, construction, and metadata

use qjs_bridge_sys as qjs;

use crate::context::Context;
use crate::error::{QjsError, QjsResult};
use crate::value::{Value, ValueRef};

/// Element kind of a typed array, numbered as the engine numbers them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum TypedArrayKind {
    Uint8Clamped = qjs::TYPED_ARRAY_UINT8C,
    Int8 = qjs::TYPED_ARRAY_INT8,
    Uint8 = qjs::TYPED_ARRAY_UINT8,
    Int16 = qjs::TYPED_ARRAY_INT16,
    Uint16 = qjs::TYPED_ARRAY_UINT16,
    Int32 = qjs::TYPED_ARRAY_INT32,
    Uint32 = qjs::TYPED_ARRAY_UINT32,
    BigInt64 = qjs::TYPED_ARRAY_BIG_INT64,
    BigUint64 = qjs::TYPED_ARRAY_BIG_UINT64,
    Float16 = qjs::TYPED_ARRAY_FLOAT16,
    Float32 = qjs::TYPED_ARRAY_FLOAT32,
    Float64 = qjs::TYPED_ARRAY_FLOAT64,
}

impl TypedArrayKind {
    pub const COUNT: usize = 12;

    /// Every kind, in numbering order
    pub const ALL: [TypedArrayKind; Self::COUNT] = [
        Self::Uint8Clamped,
        Self::Int8,
        Self::Uint8,
        Self::Int16,
        Self::Uint16,
        Self::Int32,
        Self::Uint32,
        Self::BigInt64,
        Self::BigUint64,
        Self::Float16,
        Self::Float32,
        Self::Float64,
    ];

    pub const fn bytes_per_element(self) -> usize {
        match self {
            Self::Uint8Clamped | Self::Int8 | Self::Uint8 => 1,
            Self::Int16 | Self::Uint16 | Self::Float16 => 2,
            Self::Int32 | Self::Uint32 | Self::Float32 => 4,
            Self::BigInt64 | Self::BigUint64 | Self::Float64 => 8,
        }
    }

    /// Name of the global constructor
    pub const fn constructor_name(self) -> &'static str {
        match self {
            Self::Uint8Clamped => "Uint8ClampedArray",
            Self::Int8 => "Int8Array",
            Self::Uint8 => "Uint8Array",
            Self::Int16 => "Int16Array",
            Self::Uint16 => "Uint16Array",
            Self::Int32 => "Int32Array",
            Self::Uint32 => "Uint32Array",
            Self::BigInt64 => "BigInt64Array",
            Self::BigUint64 => "BigUint64Array",
            Self::Float16 => "Float16Array",
            Self::Float32 => "Float32Array",
            Self::Float64 => "Float64Array",
        }
    }
}

impl TryFrom<i32> for TypedArrayKind {
    type Error = QjsError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        usize::try_from(value)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or(QjsError::InvalidTypedArrayKind(value))
    }
}

/// Backing store of an `ArrayBuffer` or typed array
///
/// `buffer` is a separate owned reference, released independently of the
/// value it was read from.
#[derive(Debug)]
pub struct TypedArrayInfo<'ctx> {
    pub buffer: Value<'ctx>,
    pub byte_offset: usize,
    pub byte_length: usize,
    pub bytes_per_element: usize,
}

impl<'ctx> ValueRef<'ctx> {
    pub fn is_array_buffer(&self) -> bool {
        self.instance_of_cached(self.context().cache().array_buffer)
    }

    /// Whether the value is a typed array of exactly this kind
    pub fn is_typed_array(&self, kind: TypedArrayKind) -> bool {
        self.instance_of_cached(self.context().cache().typed_arrays[kind as usize])
    }

    /// Kind of the typed array, `None` for anything else
    pub fn identify_typed_array(&self) -> Option<TypedArrayKind> {
        if !self.is_object() {
            return None;
        }
        TypedArrayKind::ALL
            .into_iter()
            .find(|&kind| self.is_typed_array(kind))
    }

    /// Buffer, offset, length, and element size of a typed array
    ///
    /// An `ArrayBuffer` describes itself with offset 0 and element size 1.
    /// Any other value is a contract violation.
    pub fn typed_array_info(&self) -> QjsResult<TypedArrayInfo<'ctx>> {
        if self.is_array_buffer() {
            let byte_length = self.len()?;
            return Ok(TypedArrayInfo {
                buffer: self.dupe(),
                byte_offset: 0,
                byte_length,
                bytes_per_element: 1,
            });
        }
        if self.identify_typed_array().is_none() {
            return Err(QjsError::contract_violation(
                "typed_array_info",
                format!("expected ArrayBuffer or TypedArray, got {}", self.type_name()),
            ));
        }

        let ctx = self.context();
        let (mut byte_offset, mut byte_length, mut bytes_per_element) = (0, 0, 0);
        // SAFETY: self is a typed array in a live context
        let raw = unsafe {
            qjs::JS_GetTypedArrayBuffer(
                ctx.raw(),
                self.as_raw(),
                &mut byte_offset,
                &mut byte_length,
                &mut bytes_per_element,
            )
        };
        if qjs::value_tag(raw) == qjs::TAG_EXCEPTION {
            let exception = ctx.take_exception();
            return Err(QjsError::contract_violation("typed_array_info", exception.to_string()));
        }
        Ok(TypedArrayInfo {
            buffer: Value::from_raw(ctx, raw),
            byte_offset: byte_offset as usize,
            byte_length: byte_length as usize,
            bytes_per_element: bytes_per_element as usize,
        })
    }
}

impl<'rt> Context<'rt> {
    fn typed_array_constructor(&self, kind: TypedArrayKind) -> QjsResult<ValueRef<'_>> {
        let ctor = ValueRef::new(self, self.cache().typed_arrays[kind as usize]);
        if ctor.is_object() {
            Ok(ctor)
        } else {
            Err(QjsError::MissingGlobal(kind.constructor_name().to_string()))
        }
    }

    /// New zero-filled typed array of `length` elements
    pub fn new_typed_array(&self, kind: TypedArrayKind, length: u32) -> QjsResult<Value<'_>> {
        let ctor = self.typed_array_constructor(kind)?;
        let length = self.new_uint32(length);
        ctor.call_constructor(&[&length])
    }

    /// New typed array over a copy of `bytes`
    ///
    /// The byte count must be a multiple of the element size.
    pub fn new_typed_array_from_bytes(
        &self,
        kind: TypedArrayKind,
        bytes: &[u8],
    ) -> QjsResult<Value<'_>> {
        let buffer = self.new_array_buffer(bytes)?;
        self.new_typed_array_from_array_buffer(kind, &buffer)
    }

    /// New typed array viewing all of `buffer`
    pub fn new_typed_array_from_array_buffer<'a>(
        &'a self,
        kind: TypedArrayKind,
        buffer: &ValueRef<'a>,
    ) -> QjsResult<Value<'a>> {
        let ctor = self.typed_array_constructor(kind)?;
        ctor.call_constructor(&[buffer])
    }
}
