//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, then environment overrides)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! Config is immutable once loaded. All fields have defaults so a minimal
//! (or empty) file is valid.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::{
    AdminConfig, CacheBackend, CacheConfig, EventsBackend, EventsConfig, ListenerConfig,
    LogFormat, ObservabilityConfig, ResilienceConfig, RetryConfig, ServiceConfig, StoreBackend,
    StoreConfig, TimeoutConfig,
};
