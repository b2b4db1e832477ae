//! Error types for the QuickJS bridge
//!
//! Engine exceptions are carried as a structured [`JsException`] record so
//! the name, message, cause and stack survive the trip to the host. Misuse of
//! a documented precondition is a separate [`QjsError::ContractViolation`]
//! family, so callers can tell script failures from boundary bugs.

use thiserror::Error;

/// Result type alias for bridge operations
pub type QjsResult<T> = Result<T, QjsError>;

/// A JavaScript exception taken off the engine
///
/// Each field is empty when the thrown value did not carry it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsException {
    pub name: String,
    pub message: String,
    pub cause: String,
    pub stack: String,
}

impl JsException {
    /// Exception with only a message
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }
}

impl std::fmt::Display for JsException {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.message)?;
        } else {
            write!(f, "{}: {}", self.name, self.message)?;
        }
        if !self.cause.is_empty() {
            write!(f, " (cause: {})", self.cause)?;
        }
        Ok(())
    }
}

impl std::error::Error for JsException {}

/// Structured error types for bridge operations
#[derive(Debug, Error)]
pub enum QjsError {
    /// The engine refused to allocate a runtime
    #[error("Runtime creation failed: {message}")]
    RuntimeCreation { message: String },

    /// The engine refused to allocate a context
    #[error("Context creation failed: {message}")]
    ContextCreation { message: String },

    /// A global required by the value cache is absent
    #[error("Missing global: {0}")]
    MissingGlobal(String),

    /// The context has already been torn down
    #[error("Context has been freed")]
    ContextFreed,

    /// JavaScript exception thrown during evaluation or a call
    #[error("{0}")]
    Exception(JsException),

    /// API used against a documented precondition
    #[error("Contract violation in {operation}: {detail}")]
    ContractViolation {
        operation: &'static str,
        detail: String,
    },

    /// Type conversion error
    #[error("Type error: expected {expected}, got {actual}")]
    TypeError { expected: String, actual: String },

    /// Numeric property index outside the supported range
    #[error("Property index {0} is outside [0, 2^31-1]")]
    IndexOutOfRange(i64),

    /// Unknown typed array element kind
    #[error("Invalid typed array kind: {0}")]
    InvalidTypedArrayKind(i32),

    /// String encoding error
    #[error("String encoding error: {0}")]
    StringEncoding(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal/unexpected error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl QjsError {
    /// Create an exception error from its parts
    pub fn exception(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Exception(JsException {
            name: name.into(),
            message: message.into(),
            ..Default::default()
        })
    }

    /// Create a contract violation
    pub fn contract_violation(operation: &'static str, detail: impl Into<String>) -> Self {
        Self::ContractViolation {
            operation,
            detail: detail.into(),
        }
    }

    /// Create a type error
    pub fn type_error(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeError {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a JavaScript exception
    pub fn is_exception(&self) -> bool {
        matches!(self, Self::Exception(_))
    }

    /// Check if this is a contract violation
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::ContractViolation { .. }
                | Self::IndexOutOfRange(_)
                | Self::InvalidTypedArrayKind(_)
        )
    }

    /// Get the JavaScript stack trace if available
    pub fn stack_trace(&self) -> Option<&str> {
        match self {
            Self::Exception(e) if !e.stack.is_empty() => Some(&e.stack),
            _ => None,
        }
    }

    /// Get the JavaScript error name if this is an exception
    pub fn error_type(&self) -> Option<&str> {
        match self {
            Self::Exception(e) if !e.name.is_empty() => Some(&e.name),
            _ => None,
        }
    }

    /// Borrow the exception record
    pub fn as_exception(&self) -> Option<&JsException> {
        match self {
            Self::Exception(e) => Some(e),
            _ => None,
        }
    }
}

impl From<JsException> for QjsError {
    fn from(e: JsException) -> Self {
        Self::Exception(e)
    }
}
