//! HTTP transport: the reference server.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (listener, graceful shutdown)
//!     → request.rs (assign/propagate x-request-id, request span)
//!     → request timeout
//!     → user router (e.g. health.rs)
//! ```

pub mod health;
pub mod request;
pub mod server;

pub use health::health_check;
pub use request::X_REQUEST_ID;
pub use server::{HttpError, HttpServer, HttpServerBuilder};
