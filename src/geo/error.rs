//! Faults raised while turning connection metadata into a response.
//!
//! Every variant ends up in the `error_details` field of the
//! unexpected-failure body, so the `Display` text is client visible.

use serde_json::Value;

/// A fault in the geo pipeline. Never propagated past the handler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeoError {
    /// The platform header did not carry decodable JSON.
    #[error("connection metadata is not valid JSON: {0}")]
    MalformedMetadata(String),

    /// Metadata was supplied but is not a JSON object.
    #[error("connection metadata must be an object, found {0}")]
    NotAnObject(&'static str),

    /// A string field held a truthy value of another type.
    #[error("metadata field `{field}` must be a string, found {found}")]
    FieldType {
        field: &'static str,
        found: &'static str,
    },

    /// `asn` was neither a non-negative integer nor a string of digits.
    #[error("metadata field `asn` is not an autonomous system number: {0}")]
    InvalidAsn(String),

    #[error("failed to serialize response body: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for GeoError {
    fn from(err: serde_json::Error) -> Self {
        GeoError::Serialization(err.to_string())
    }
}

/// Name of a JSON value's type, for error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
