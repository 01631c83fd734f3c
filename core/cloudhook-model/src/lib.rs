//! Cloud Code object model for cloudhook.
//!
//! Defines the types a webhook handler sees after a request body is decoded:
//! - [`CloudObject`]: a class-tagged domain object (className, objectId, timestamps, fields)
//! - [`FieldOp`] / [`FieldUpdate`]: a decoded field-level update patch (`__op` encoding)
//! - [`ObjectCodec`]: the narrow "materialize / decode update" interface used by the webhook pipeline
//! - [`JsonCodec`]: the default codec for the SDK's JSON object format
//!
//! Field values stay as `serde_json::Value`; typed accessors cover the common cases.

mod codec;
mod object;
mod op;

pub use codec::{JsonCodec, ObjectCodec};
pub use object::{CloudObject, RESERVED_KEYS, USER_CLASS};
pub use op::{FieldOp, FieldUpdate};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while decoding objects or applying updates.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("object has no className")]
    MissingClassName,

    #[error("unsupported field operation: {0}")]
    UnsupportedOp(String),

    #[error("malformed {op} operation on field '{field}': {reason}")]
    MalformedOp {
        op: String,
        field: String,
        reason: String,
    },

    #[error("cannot apply {op} to field '{field}': {reason}")]
    TypeMismatch {
        op: &'static str,
        field: String,
        reason: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Name of a JSON value's kind, for error messages.
pub(crate) fn kind_of(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
