//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GeoConfig (validated, immutable)
//!     → consumed once at startup by the server
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Only the server around the handler is configurable; the geo builder
//!   itself reads nothing from here

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    GeoConfig, ListenerConfig, LogFormat, MetadataConfig, ObservabilityConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
