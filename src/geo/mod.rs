//! Geo response subsystem.
//!
//! # Data Flow
//! ```text
//! InboundRequest (client IP header + platform metadata)
//!     → metadata.rs (typed, falsy-normalized field reads)
//!     → builder.rs (presence check, `as` synthesis, failure boundary)
//!     → response.rs (outcome body, status, headers, pretty JSON)
//!     → GeoResponse handed to the HTTP layer
//! ```
//!
//! # Design Decisions
//! - Pure: no I/O, no state, no configuration
//! - Identical input yields byte-identical bodies
//! - Faults are values (`GeoError`), converted to a 500 body at one boundary

pub mod builder;
pub mod error;
pub mod metadata;
pub mod response;

pub use builder::{build_response, synthesize_as, InboundRequest};
pub use error::GeoError;
pub use metadata::ConnectionMetadata;
pub use response::{GeoOutcome, GeoResponse, OutcomeKind};
