//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → environment (PORT, APIDB_*, PUBSUB_CHANNEL)
//!     → command-line overrides
//!     → validation.rs (semantic checks)
//!     → EdgeConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, resolve_config, ConfigError, ConfigOverrides};
pub use schema::{
    DatabaseConfig, EdgeConfig, ListenerConfig, LimitsConfig, LogFormat, ObservabilityConfig,
    PubSubConfig, StaticFilesConfig, TimeoutConfig, WebSocketConfig,
};
pub use validation::{validate_config, ValidationError};
