//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with key/value fields
//!     → spans: App logger span, per-server span, per-request span (with request id)
//!
//! Consumers:
//!     → logging.rs installs the subscriber (JSON or console on stdout)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Library code only emits events; installing a subscriber is the binary's job

pub mod logging;
