//! Response documents and their HTTP rendering.
//!
//! # Outcomes
//! - `Success` (200): geo fields, CORS origin and allowed methods
//! - `MissingMetadata` (400): fixed message and reason
//! - `UnexpectedFailure` (500): fixed message plus the fault text
//!
//! Field order in each body struct is the key order on the wire.

use axum::{
    body::Body,
    http::{
        header::{ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::geo::error::GeoError;

pub const MISSING_METADATA_MESSAGE: &str =
    "Cloudflare geo-location data (request.cf) was not available for this request.";
pub const MISSING_METADATA_REASON: &str =
    "The 'request.cf' object required for geo-location was missing or undefined.";
pub const UNEXPECTED_FAILURE_MESSAGE: &str =
    "An unexpected server error occurred while processing the request.";
pub const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

/// Rendered when even the failure body cannot be serialized.
const STATIC_FAILURE_BODY: &str = "{\n  \"status\": \"fail\",\n  \"message\": \"An unexpected server error occurred while processing the request.\",\n  \"error_details\": null,\n  \"query\": null\n}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Fail,
}

/// Success body, mirroring the ip-api.com field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoSuccess {
    pub query: Option<String>,
    pub status: Status,
    pub country_code: Option<String>,
    pub timezone: Option<String>,
    pub isp: Option<String>,
    #[serde(rename = "as")]
    pub as_name: Option<String>,
    pub region_name: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingMetadata {
    pub status: Status,
    pub message: &'static str,
    pub query: Option<String>,
    pub reason: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnexpectedFailure {
    pub status: Status,
    pub message: &'static str,
    pub error_details: String,
    pub query: Option<String>,
}

/// Which of the three outcomes a response represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Success,
    MissingMetadata,
    UnexpectedFailure,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Success => "success",
            OutcomeKind::MissingMetadata => "missing_metadata",
            OutcomeKind::UnexpectedFailure => "unexpected_failure",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoOutcome {
    Success(GeoSuccess),
    MissingMetadata(MissingMetadata),
    UnexpectedFailure(UnexpectedFailure),
}

impl GeoOutcome {
    pub fn missing_metadata(query: Option<String>) -> Self {
        GeoOutcome::MissingMetadata(MissingMetadata {
            status: Status::Fail,
            message: MISSING_METADATA_MESSAGE,
            query,
            reason: MISSING_METADATA_REASON,
        })
    }

    pub fn unexpected_failure(query: Option<String>, details: impl Into<String>) -> Self {
        GeoOutcome::UnexpectedFailure(UnexpectedFailure {
            status: Status::Fail,
            message: UNEXPECTED_FAILURE_MESSAGE,
            error_details: details.into(),
            query,
        })
    }

    pub fn kind(&self) -> OutcomeKind {
        match self {
            GeoOutcome::Success(_) => OutcomeKind::Success,
            GeoOutcome::MissingMetadata(_) => OutcomeKind::MissingMetadata,
            GeoOutcome::UnexpectedFailure(_) => OutcomeKind::UnexpectedFailure,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            OutcomeKind::Success => StatusCode::OK,
            OutcomeKind::MissingMetadata => StatusCode::BAD_REQUEST,
            OutcomeKind::UnexpectedFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Headers for this outcome. Only success advertises allowed methods.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        if self.kind() == OutcomeKind::Success {
            headers.insert(
                ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(ALLOWED_METHODS),
            );
        }
        headers
    }

    /// Pretty-printed JSON body, two-space indent.
    pub fn body(&self) -> Result<String, GeoError> {
        let body = match self {
            GeoOutcome::Success(b) => serde_json::to_string_pretty(b)?,
            GeoOutcome::MissingMetadata(b) => serde_json::to_string_pretty(b)?,
            GeoOutcome::UnexpectedFailure(b) => serde_json::to_string_pretty(b)?,
        };
        Ok(body)
    }

    pub fn render(&self) -> Result<GeoResponse, GeoError> {
        Ok(GeoResponse {
            kind: self.kind(),
            status: self.status_code(),
            headers: self.headers(),
            body: self.body()?,
        })
    }
}

/// A fully rendered response, ready to hand to the transport.
#[derive(Debug, Clone)]
pub struct GeoResponse {
    pub kind: OutcomeKind,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl GeoResponse {
    /// Unexpected-failure response for `details`.
    pub fn failure(query: Option<String>, details: impl Into<String>) -> Self {
        let outcome = GeoOutcome::unexpected_failure(query, details);
        outcome.render().unwrap_or_else(|_| GeoResponse {
            kind: OutcomeKind::UnexpectedFailure,
            status: StatusCode::INTERNAL_SERVER_ERROR,
            headers: outcome.headers(),
            body: STATIC_FAILURE_BODY.to_string(),
        })
    }
}

impl IntoResponse for GeoResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}
