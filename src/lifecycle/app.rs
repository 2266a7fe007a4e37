//! The lifecycle supervisor.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span};

use crate::error::AppError;
use crate::lifecycle::builder::AppBuilder;
use crate::lifecycle::group::TaskGroup;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::{Signal, SignalListener};
use crate::transport::Server;

pub(super) const PHASE_CREATED: u8 = 0;
const PHASE_RUNNING: u8 = 1;
const PHASE_STOPPED: u8 = 2;

/// Observable lifecycle state of an [`App`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// Built, `run` not called yet.
    Created,
    /// `run` in progress, no stop requested.
    Running,
    /// `run` in progress, cancellation observed; servers are being stopped.
    Stopping,
    /// `run` has returned. Terminal.
    Stopped,
}

/// Runs a set of servers concurrently and stops all of them together.
///
/// An `App` is single-use: [`run`](App::run) may be called once.
pub struct App {
    pub(super) name: String,
    pub(super) version: String,
    pub(super) signals: Vec<Signal>,
    pub(super) logger: Span,
    pub(super) servers: Vec<Arc<dyn Server>>,
    pub(super) shutdown: Shutdown,
    pub(super) phase: AtomicU8,
    /// Token of the running task group, set once by `run`.
    pub(super) group: OnceLock<CancellationToken>,
}

impl App {
    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    /// Run every server until all exit, one fails, or a signal arrives.
    ///
    /// With no servers registered this waits for a stop request or signal.
    /// Returns once every start and stop call has completed. A shutdown
    /// caused only by cancellation (explicit stop or signal) is `Ok(())`;
    /// otherwise the first failure observed is returned.
    pub async fn run(&self) -> Result<(), AppError> {
        if self
            .phase
            .compare_exchange(
                PHASE_CREATED,
                PHASE_RUNNING,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            return Err(AppError::AlreadyStarted);
        }

        let result = self.supervise().instrument(self.logger.clone()).await;
        self.phase.store(PHASE_STOPPED, Ordering::SeqCst);
        result
    }

    async fn supervise(&self) -> Result<(), AppError> {
        tracing::info!(
            service_name = %self.name,
            version = %self.version,
            "app run"
        );

        let mut listener = SignalListener::install(&self.signals).map_err(|e| {
            tracing::error!(error = %e, "Failed to install signal handlers");
            AppError::Signal(e)
        })?;

        let mut group = TaskGroup::new(self.shutdown.token());
        let _ = self.group.set(group.token().clone());
        let remaining = Arc::new(AtomicUsize::new(self.servers.len()));

        for server in &self.servers {
            let token = group.token().clone();
            let srv = Arc::clone(server);
            group.spawn(
                async move {
                    token.cancelled().await;
                    stop_server(&*srv).await
                }
                .in_current_span(),
            );

            let token = group.token().clone();
            let remaining = Arc::clone(&remaining);
            let srv = Arc::clone(server);
            group.spawn(
                async move {
                    let result = start_server(&*srv).await;
                    if remaining.fetch_sub(1, Ordering::SeqCst) == 1 && result.is_ok() {
                        tracing::info!("All servers exited");
                        token.cancel();
                    }
                    result
                }
                .in_current_span(),
            );
        }

        let token = group.token().clone();
        let shutdown = self.shutdown.clone();
        group.spawn(
            async move {
                tokio::select! {
                    _ = token.cancelled() => Err(AppError::Canceled),
                    signal = listener.recv() => {
                        tracing::info!(signal = %signal, "Shutdown signal received");
                        shutdown.trigger();
                        Ok(())
                    }
                }
            }
            .in_current_span(),
        );

        tracing::debug!(tasks = group.len(), "Supervised tasks spawned");

        let result = group.wait().await;
        match &result {
            Ok(()) => tracing::info!("app stopped"),
            Err(err) => tracing::error!(
                error = %err,
                kind = err.as_label(),
                "app stopped with error"
            ),
        }
        result
    }

    /// Request shutdown. Idempotent and never fails.
    pub fn stop(&self) -> Result<(), AppError> {
        self.shutdown.trigger();
        Ok(())
    }

    /// A clonable handle that stops this app when triggered.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    pub fn state(&self) -> AppState {
        match self.phase.load(Ordering::SeqCst) {
            PHASE_CREATED => AppState::Created,
            PHASE_RUNNING if self.is_stopping() => AppState::Stopping,
            PHASE_RUNNING => AppState::Running,
            _ => AppState::Stopped,
        }
    }

    fn is_stopping(&self) -> bool {
        self.shutdown.is_triggered()
            || self.group.get().is_some_and(CancellationToken::is_cancelled)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// The span every supervisor log entry is recorded under.
    pub fn logger(&self) -> &Span {
        &self.logger
    }

    pub fn servers(&self) -> &[Arc<dyn Server>] {
        &self.servers
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }
}

async fn start_server(server: &dyn Server) -> Result<(), AppError> {
    tracing::info!(server = server.name(), "Starting server");
    match server.start().await {
        Ok(()) => {
            tracing::info!(server = server.name(), "Server exited");
            Ok(())
        }
        Err(source) => {
            tracing::error!(server = server.name(), error = %source, "Server failed to start");
            Err(AppError::Start {
                server: server.name().to_string(),
                source,
            })
        }
    }
}

async fn stop_server(server: &dyn Server) -> Result<(), AppError> {
    tracing::info!(server = server.name(), "Stopping server");
    server.stop().await.map_err(|source| {
        tracing::error!(server = server.name(), error = %source, "Server failed to stop");
        AppError::Stop {
            server: server.name().to_string(),
            source,
        }
    })
}
