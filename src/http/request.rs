//! Request handling and transformation.
//!
//! # Responsibilities
//! - Read the client IP from `CF-Connecting-IP`
//! - Locate the connection metadata the platform attached
//! - Carry the request ID into the builder for error correlation
//!
//! # Design Decisions
//! - Headers are read verbatim; the IP is never parsed or validated
//! - A `ConnectionMetadata` extension wins over the metadata header
//! - Header decoding errors are deferred to the builder's failure boundary

use axum::http::{request::Parts, HeaderMap, HeaderName, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::geo::{ConnectionMetadata, InboundRequest};

/// Header set by the edge to the originating client IP.
pub const CF_CONNECTING_IP: &str = "cf-connecting-ip";

/// Header carrying the request ID, set by the request ID layer.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Assigns a v4 UUID to requests that arrive without an `x-request-id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeGeoRequestId;

impl MakeRequestId for MakeGeoRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().hyphenated().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Client IP as sent by the edge. Non-UTF-8 values read as absent.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CF_CONNECTING_IP)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Request ID assigned to this request, if any.
pub fn request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Build the builder's input from request parts.
pub fn inbound_request(parts: &Parts, metadata_header: &HeaderName) -> InboundRequest {
    let metadata = match parts.extensions.get::<ConnectionMetadata>() {
        Some(metadata) => Some(metadata.clone()),
        None => parts
            .headers
            .get(metadata_header)
            .and_then(|v| ConnectionMetadata::from_header_bytes(v.as_bytes())),
    };

    InboundRequest {
        client_ip: client_ip(&parts.headers),
        metadata,
        request_id: request_id(&parts.headers),
    }
}
