//! Error types for the supervisor.
//!
//! Server implementations report failures as a [`BoxError`]; the supervisor
//! wraps them in [`AppError`] together with the name of the server that
//! produced them, so the original error stays reachable through
//! [`std::error::Error::source`].

use thiserror::Error;

/// Type-erased error returned by [`Server`](crate::transport::Server) implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced while running the supervisor.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AppError {
    /// A server's `start` returned an error.
    #[error("server {server} failed to start: {source}")]
    Start {
        server: String,
        #[source]
        source: BoxError,
    },

    /// A server's `stop` returned an error.
    #[error("server {server} failed to stop: {source}")]
    Stop {
        server: String,
        #[source]
        source: BoxError,
    },

    /// Installing an OS signal listener failed.
    #[error("failed to install signal handler: {0}")]
    Signal(#[source] std::io::Error),

    /// A supervised task panicked.
    #[error("supervised task panicked: {0}")]
    Panicked(String),

    /// `run` was called on a supervisor that already ran.
    #[error("supervisor has already been started")]
    AlreadyStarted,

    /// The shared context was cancelled. Never surfaced by `App::run`.
    #[error("context cancelled")]
    Canceled,
}

impl AppError {
    /// Returns `true` for the cancellation marker.
    pub fn is_canceled(&self) -> bool {
        matches!(self, AppError::Canceled)
    }

    /// Returns a short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            AppError::Start { .. } => "server_start_failed",
            AppError::Stop { .. } => "server_stop_failed",
            AppError::Signal(_) => "signal_install_failed",
            AppError::Panicked(_) => "task_panicked",
            AppError::AlreadyStarted => "already_started",
            AppError::Canceled => "canceled",
        }
    }

    /// Name of the server this error originated from, if any.
    pub fn server(&self) -> Option<&str> {
        match self {
            AppError::Start { server, .. } | AppError::Stop { server, .. } => Some(server),
            _ => None,
        }
    }

    /// Unwraps the error returned by the server, if this error came from one.
    pub fn into_source(self) -> Option<BoxError> {
        match self {
            AppError::Start { source, .. } | AppError::Stop { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_cancelled() {
            AppError::Canceled
        } else {
            AppError::Panicked(err.to_string())
        }
    }
}
