//! Connection metadata attached to a request by the edge platform.
//!
//! # Responsibilities
//! - Hold the metadata object exactly as the platform supplied it
//! - Typed, fallible reads of the individual geo fields
//! - Falsy normalization (`null`, `false`, `""`, `0` read as absent)
//!
//! # Design Decisions
//! - Fields are read lazily so a bad value surfaces as a `GeoError` inside
//!   the builder's failure boundary rather than at ingress
//! - A numeric `asn` of `0` reads as absent while the string `"0"` does not

use serde_json::{Map, Value};

use crate::geo::error::{json_kind, GeoError};

pub const COUNTRY: &str = "country";
pub const REGION: &str = "region";
pub const REGION_CODE: &str = "regionCode";
pub const TIMEZONE: &str = "timezone";
pub const AS_ORGANIZATION: &str = "asOrganization";
pub const ASN: &str = "asn";

/// Largest float that still maps to an exact integer.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Per-request connection metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionMetadata {
    inner: Inner,
}

#[derive(Debug, Clone, PartialEq)]
enum Inner {
    Object(Map<String, Value>),
    /// Present but unusable; the fault is raised on first field read.
    Invalid { raw: String, error: GeoError },
}

impl ConnectionMetadata {
    /// Wrap a JSON value. `null` means the platform attached nothing.
    pub fn from_value(value: Value) -> Option<Self> {
        let inner = match value {
            Value::Null => return None,
            Value::Object(map) => Inner::Object(map),
            other => Inner::Invalid {
                raw: other.to_string(),
                error: GeoError::NotAnObject(json_kind(&other)),
            },
        };
        Some(Self { inner })
    }

    /// Decode the header encoding of the metadata (a JSON document).
    pub fn from_header_bytes(bytes: &[u8]) -> Option<Self> {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => Self::from_value(value),
            Err(e) => Some(Self {
                inner: Inner::Invalid {
                    raw: String::from_utf8_lossy(bytes).into_owned(),
                    error: GeoError::MalformedMetadata(e.to_string()),
                },
            }),
        }
    }

    /// Compact serialization of the metadata, for diagnostics.
    pub fn content(&self) -> String {
        match &self.inner {
            Inner::Object(map) => serde_json::to_string(map).unwrap_or_default(),
            Inner::Invalid { raw, .. } => raw.clone(),
        }
    }

    fn object(&self) -> Result<&Map<String, Value>, GeoError> {
        match &self.inner {
            Inner::Object(map) => Ok(map),
            Inner::Invalid { error, .. } => Err(error.clone()),
        }
    }

    /// Read a string field; falsy values come back as `None`.
    pub fn string_field(&self, key: &'static str) -> Result<Option<String>, GeoError> {
        match self.object()?.get(key) {
            None => Ok(None),
            Some(value) if is_falsy(value) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(GeoError::FieldType {
                field: key,
                found: json_kind(other),
            }),
        }
    }

    /// Read the autonomous system number as its decimal text.
    pub fn asn(&self) -> Result<Option<String>, GeoError> {
        let value = match self.object()?.get(ASN) {
            None => return Ok(None),
            Some(value) if is_falsy(value) => return Ok(None),
            Some(value) => value,
        };

        match value {
            Value::Number(n) => {
                if let Some(asn) = n.as_u64() {
                    return Ok(Some(asn.to_string()));
                }
                match n.as_f64() {
                    Some(f) if f > 0.0 && f.fract() == 0.0 && f <= MAX_SAFE_INTEGER => {
                        Ok(Some((f as u64).to_string()))
                    }
                    _ => Err(GeoError::InvalidAsn(n.to_string())),
                }
            }
            Value::String(s) if s.bytes().all(|b| b.is_ascii_digit()) => Ok(Some(s.clone())),
            other => Err(GeoError::InvalidAsn(other.to_string())),
        }
    }
}

impl From<Map<String, Value>> for ConnectionMetadata {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            inner: Inner::Object(map),
        }
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Array(_) | Value::Object(_) => false,
    }
}
