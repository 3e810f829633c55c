//! Geo-location echo endpoint.
//!
//! Returns the geo metadata an edge platform attached to a request (country,
//! region, timezone, ASN, network operator) as an ip-api.com shaped JSON
//! document.

// Core
pub mod geo;
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::GeoConfig;
pub use geo::{build_response, ConnectionMetadata, InboundRequest};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
