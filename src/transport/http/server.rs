//! HTTP server setup and lifecycle.
//!
//! # Responsibilities
//! - Bind the TCP listener when started
//! - Wire up middleware (request timeout, request ID, tracing)
//! - Serve the configured Axum router until stopped
//! - Drain in-flight requests within the shutdown budget
//!
//! # Design Decisions
//! - `start` returns `Ok(())` after a requested stop; only bind/accept failures are errors
//! - One drain deadline, armed by `serve` when stop is requested; connections still
//!   open after it are abandoned and `stop` reports `ShutdownTimeout`
//! - Request timeout and shutdown timeout are separate knobs, the latter defaulting
//!   to the former

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{Instrument, Span};

use crate::config::HttpConfig;
use crate::error::BoxError;
use crate::transport::http::request;
use crate::transport::Server;

/// Default per-request timeout, also the default shutdown budget.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bind address: all interfaces, ephemeral port.
pub const DEFAULT_ADDRESS: &str = "0.0.0.0:0";

/// Error type for HTTP server operations.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Failed to bind the listener.
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// The accept loop failed.
    #[error("failed to serve: {0}")]
    Serve(#[source] std::io::Error),

    /// In-flight requests did not finish within the shutdown budget.
    #[error("graceful shutdown did not finish within {0:?}")]
    ShutdownTimeout(Duration),

    /// `start` was called more than once.
    #[error("server has already been started")]
    AlreadyStarted,
}

/// Builder for [`HttpServer`].
pub struct HttpServerBuilder {
    name: String,
    address: String,
    timeout: Duration,
    shutdown_timeout: Option<Duration>,
    router: Router,
    logger: Option<Span>,
}

impl HttpServerBuilder {
    fn new() -> Self {
        Self {
            name: "http".to_string(),
            address: DEFAULT_ADDRESS.to_string(),
            timeout: DEFAULT_TIMEOUT,
            shutdown_timeout: None,
            router: Router::new(),
            logger: None,
        }
    }

    /// Name reported to the supervisor.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Bind address, e.g. `127.0.0.1:8080`.
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Budget for draining in-flight requests on stop.
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = Some(timeout);
        self
    }

    pub fn router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    pub fn logger(mut self, span: Span) -> Self {
        self.logger = Some(span);
        self
    }

    /// Apply the `[http]` section of the configuration file.
    pub fn config(mut self, config: &HttpConfig) -> Self {
        self.address = config.bind_address.clone();
        self.timeout = Duration::from_secs(config.request_timeout_secs);
        self.shutdown_timeout = config.shutdown_timeout_secs.map(Duration::from_secs);
        self
    }

    pub fn build(self) -> HttpServer {
        let logger = self
            .logger
            .unwrap_or_else(|| tracing::info_span!("server", name = %self.name));
        let (bound, _) = watch::channel(None);

        HttpServer {
            shutdown_timeout: self.shutdown_timeout.unwrap_or(self.timeout),
            name: self.name,
            address: self.address,
            timeout: self.timeout,
            router: self.router,
            logger,
            shutdown: CancellationToken::new(),
            stopped: CancellationToken::new(),
            started: AtomicBool::new(false),
            drain_timed_out: AtomicBool::new(false),
            bound,
        }
    }
}

/// Reference [`Server`] implementation serving an Axum router.
pub struct HttpServer {
    name: String,
    address: String,
    timeout: Duration,
    shutdown_timeout: Duration,
    router: Router,
    logger: Span,
    /// Cancelled by `stop`.
    shutdown: CancellationToken,
    /// Cancelled when `start` returns, whatever the outcome.
    stopped: CancellationToken,
    started: AtomicBool,
    /// Set by `serve` before `stopped` fires when the drain deadline hit.
    drain_timed_out: AtomicBool,
    bound: watch::Sender<Option<SocketAddr>>,
}

impl HttpServer {
    pub fn builder() -> HttpServerBuilder {
        HttpServerBuilder::new()
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(&self) -> Router {
        // Outermost first: the id must exist before the trace span reads it.
        self.router.clone().layer(
            ServiceBuilder::new()
                .layer(request::set_request_id_layer())
                .layer(TraceLayer::new_for_http().make_span_with(request::make_request_span))
                .layer(request::propagate_request_id_layer())
                .layer(TimeoutLayer::new(self.timeout)),
        )
    }

    /// Bind and serve until `stop` is called.
    pub async fn serve(&self) -> Result<(), HttpError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(HttpError::AlreadyStarted);
        }
        let _stopped = self.stopped.clone().drop_guard();

        let listener = TcpListener::bind(&self.address)
            .await
            .map_err(|source| HttpError::Bind {
                address: self.address.clone(),
                source,
            })?;
        let addr = listener.local_addr().map_err(HttpError::Serve)?;
        self.bound.send_replace(Some(addr));

        tracing::info!(address = %addr, "[HTTP] server listening on: {}", addr);

        let serve = axum::serve(listener, self.build_router())
            .with_graceful_shutdown(self.shutdown.clone().cancelled_owned())
            .into_future();
        let drain_deadline = async {
            self.shutdown.cancelled().await;
            tokio::time::sleep(self.shutdown_timeout).await;
        };

        tokio::select! {
            result = serve => result.map_err(HttpError::Serve)?,
            _ = drain_deadline => {
                self.drain_timed_out.store(true, Ordering::SeqCst);
                tracing::warn!(
                    timeout = ?self.shutdown_timeout,
                    "[HTTP] drain timed out, abandoning open connections"
                );
            }
        }

        tracing::info!("[HTTP] server stopped");
        Ok(())
    }

    /// Stop accepting connections and wait for `serve` to return.
    ///
    /// `serve` is bounded by the drain deadline, so this returns within the
    /// shutdown budget. Fails with `ShutdownTimeout` if the drain was cut short.
    pub async fn shutdown(&self) -> Result<(), HttpError> {
        tracing::info!("[HTTP] server stopping");
        self.shutdown.cancel();

        if !self.started.load(Ordering::SeqCst) {
            return Ok(());
        }

        self.stopped.cancelled().await;
        if self.drain_timed_out.load(Ordering::SeqCst) {
            return Err(HttpError::ShutdownTimeout(self.shutdown_timeout));
        }
        Ok(())
    }

    /// Address the listener is bound to.
    ///
    /// Waits for `serve` to bind; returns `None` if it exits without binding.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        let mut rx = self.bound.subscribe();
        tokio::select! {
            bound = rx.wait_for(Option::is_some) => bound.ok().and_then(|addr| *addr),
            _ = self.stopped.cancelled() => *self.bound.borrow(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }
}

#[async_trait]
impl Server for HttpServer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> Result<(), BoxError> {
        self.serve().instrument(self.logger.clone()).await?;
        Ok(())
    }

    async fn stop(&self) -> Result<(), BoxError> {
        self.shutdown().instrument(self.logger.clone()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::http::health::health_check;
    use crate::transport::http::request::X_REQUEST_ID;
    use axum::routing::get;
    use std::sync::Arc;

    fn client() -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().unwrap()
    }

    fn local_server(router: Router) -> Arc<HttpServer> {
        Arc::new(
            HttpServer::builder()
                .address("127.0.0.1:0")
                .router(router)
                .timeout(Duration::from_millis(200))
                .shutdown_timeout(Duration::from_secs(2))
                .build(),
        )
    }

    #[test]
    fn shutdown_timeout_defaults_to_request_timeout() {
        let server = HttpServer::builder()
            .timeout(Duration::from_secs(7))
            .build();
        assert_eq!(server.timeout(), Duration::from_secs(7));
        assert_eq!(server.shutdown_timeout(), Duration::from_secs(7));
        assert_eq!(server.address(), DEFAULT_ADDRESS);
        assert_eq!(Server::name(&server), "http");
    }

    #[test]
    fn config_section_applies() {
        let config = HttpConfig {
            bind_address: "127.0.0.1:9000".to_string(),
            request_timeout_secs: 5,
            shutdown_timeout_secs: Some(12),
        };
        let server = HttpServer::builder().config(&config).build();
        assert_eq!(server.address(), "127.0.0.1:9000");
        assert_eq!(server.timeout(), Duration::from_secs(5));
        assert_eq!(server.shutdown_timeout(), Duration::from_secs(12));
    }

    #[tokio::test]
    async fn serves_until_stopped() {
        let server = local_server(Router::new().route("/health", get(health_check)));
        let running = {
            let server = Arc::clone(&server);
            tokio::spawn(async move { server.start().await })
        };

        let addr = server.local_addr().await.expect("server should bind");
        let res = client()
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        assert!(res.headers().contains_key(X_REQUEST_ID));
        assert_eq!(res.text().await.unwrap(), r#"{"alive":true}"#);

        server.stop().await.unwrap();
        running.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn client_request_id_is_echoed() {
        let server = local_server(Router::new().route("/health", get(health_check)));
        let running = {
            let server = Arc::clone(&server);
            tokio::spawn(async move { server.start().await })
        };

        let addr = server.local_addr().await.unwrap();
        let res = client()
            .get(format!("http://{}/health", addr))
            .header(X_REQUEST_ID, "req-42")
            .send()
            .await
            .unwrap();
        assert_eq!(res.headers()[X_REQUEST_ID], "req-42");

        server.stop().await.unwrap();
        running.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn slow_request_times_out() {
        let router = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                "done"
            }),
        );
        let server = local_server(router);
        let running = {
            let server = Arc::clone(&server);
            tokio::spawn(async move { server.start().await })
        };

        let addr = server.local_addr().await.unwrap();
        let res = client()
            .get(format!("http://{}/slow", addr))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 408);

        server.stop().await.unwrap();
        running.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn stop_reports_drain_timeout() {
        let entered = Arc::new(tokio::sync::Notify::new());
        let router = Router::new().route(
            "/slow",
            get({
                let entered = Arc::clone(&entered);
                move || {
                    let entered = Arc::clone(&entered);
                    async move {
                        entered.notify_one();
                        tokio::time::sleep(Duration::from_secs(5)).await;
                        "done"
                    }
                }
            }),
        );
        let server = Arc::new(
            HttpServer::builder()
                .address("127.0.0.1:0")
                .router(router)
                .timeout(Duration::from_secs(10))
                .shutdown_timeout(Duration::from_millis(100))
                .build(),
        );
        let running = {
            let server = Arc::clone(&server);
            tokio::spawn(async move { server.start().await })
        };

        let addr = server.local_addr().await.unwrap();
        let in_flight = tokio::spawn(client().get(format!("http://{}/slow", addr)).send());
        entered.notified().await;

        let err = tokio::time::timeout(Duration::from_secs(2), server.shutdown())
            .await
            .expect("stop should return within the budget")
            .unwrap_err();
        assert!(matches!(err, HttpError::ShutdownTimeout(d) if d == Duration::from_millis(100)));
        running.await.unwrap().unwrap();
        in_flight.abort();
    }

    #[tokio::test]
    async fn stop_before_start_is_ok() {
        let server = local_server(Router::new());
        server.stop().await.unwrap();
        server.stop().await.unwrap();

        tokio::time::timeout(Duration::from_secs(1), server.start())
            .await
            .expect("start should return immediately after stop")
            .unwrap();
    }

    #[tokio::test]
    async fn bind_failure_is_an_error() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();

        let server = HttpServer::builder().address(addr.to_string()).build();
        let err = server.serve().await.unwrap_err();
        assert!(matches!(err, HttpError::Bind { .. }));
        assert_eq!(server.local_addr().await, None);

        // stop after a failed start must not wait for the budget
        tokio::time::timeout(Duration::from_secs(1), server.shutdown())
            .await
            .expect("stop should not hang")
            .unwrap();
    }

    #[tokio::test]
    async fn second_start_is_rejected() {
        let server = local_server(Router::new());
        server.stop().await.unwrap();
        server.serve().await.unwrap();
        assert!(matches!(
            server.serve().await.unwrap_err(),
            HttpError::AlreadyStarted
        ));
    }
}
