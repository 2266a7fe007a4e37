//! Transport layer: the contract every supervised server satisfies.
//!
//! # Data Flow
//! ```text
//! App::run
//!     → start task:  Server::start (resolves on clean stop or fatal error)
//!     → stop task:   wait for cancellation → Server::stop
//!
//! Server lifecycle:
//!     Idle → Serving → Draining → Closed
//! ```
//!
//! # Design Decisions
//! - The supervisor never inspects a server; it only calls `start`/`stop`
//! - A normal stop makes `start` return `Ok(())`; only real failures are errors
//! - Each server owns its own shutdown timeout

pub mod http;

use async_trait::async_trait;

use crate::error::BoxError;

/// A long-running component managed by [`App`](crate::lifecycle::App).
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use way::{BoxError, Server};
///
/// struct Ticker {
///     stop: CancellationToken,
/// }
///
/// #[async_trait]
/// impl Server for Ticker {
///     fn name(&self) -> &str { "ticker" }
///
///     async fn start(&self) -> Result<(), BoxError> {
///         self.stop.cancelled().await;
///         Ok(())
///     }
///
///     async fn stop(&self) -> Result<(), BoxError> {
///         self.stop.cancel();
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Server: Send + Sync + 'static {
    /// Stable, human-readable name used in logs and errors.
    fn name(&self) -> &str;

    /// Run the server until it is stopped or fails.
    ///
    /// Must return `Ok(())` when the server was told to stop normally.
    async fn start(&self) -> Result<(), BoxError>;

    /// Ask a running `start` to return.
    ///
    /// Must return within the server's own shutdown budget and must be safe
    /// to call even if `start` failed or never ran.
    async fn stop(&self) -> Result<(), BoxError>;
}
