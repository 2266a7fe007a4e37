//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → WayConfig (validated, immutable)
//!     → main.rs builds the logger, the HTTP server and the App from it
//! ```
//!
//! # Design Decisions
//! - Config is only read at startup; the supervisor itself never sees it
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{AppConfig, HttpConfig, LogFormat, LoggingConfig, WayConfig};
pub use validation::{validate_config, ValidationError};
