//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (client IP, platform metadata, request ID)
//!     → geo::build_response (outcome)
//!     → GeoResponse rendered to the client
//! ```

pub mod request;
pub mod server;

pub use request::{CF_CONNECTING_IP, X_REQUEST_ID};
pub use server::HttpServer;
