//! Shared utilities for supervisor integration tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use way::{BoxError, Server};

/// Error returned by [`MockServer`] when told to fail.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("{0}")]
pub struct MockError(pub String);

/// How [`MockServer::start`] behaves.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum StartBehavior {
    /// Block until stopped, then return `Ok(())`.
    Block,
    /// Return this error immediately.
    Fail(String),
    /// Return `Ok(())` immediately without being stopped.
    Exit,
}

/// A server that records how the supervisor drives it.
pub struct MockServer {
    name: String,
    start: StartBehavior,
    stop_error: Option<String>,
    stop_delay: Duration,
    stop_requested: CancellationToken,
    running: CancellationToken,
    starts: AtomicUsize,
    stops: AtomicUsize,
    start_returned: AtomicBool,
}

#[allow(dead_code)]
impl MockServer {
    pub fn new(name: &str, start: StartBehavior) -> Self {
        Self {
            name: name.to_string(),
            start,
            stop_error: None,
            stop_delay: Duration::ZERO,
            stop_requested: CancellationToken::new(),
            running: CancellationToken::new(),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
            start_returned: AtomicBool::new(false),
        }
    }

    pub fn blocking(name: &str) -> Self {
        Self::new(name, StartBehavior::Block)
    }

    pub fn failing(name: &str, error: &str) -> Self {
        Self::new(name, StartBehavior::Fail(error.to_string()))
    }

    /// Make `stop` return this error (after still signalling `start`).
    pub fn with_stop_error(mut self, error: &str) -> Self {
        self.stop_error = Some(error.to_string());
        self
    }

    /// Make `stop` take this long to complete.
    pub fn with_stop_delay(mut self, delay: Duration) -> Self {
        self.stop_delay = delay;
        self
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn start_returned(&self) -> bool {
        self.start_returned.load(Ordering::SeqCst)
    }

    /// Wait until `start` has been entered.
    pub async fn wait_running(&self) {
        self.running.cancelled().await;
    }
}

#[async_trait]
impl Server for MockServer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> Result<(), BoxError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.running.cancel();

        let result = match &self.start {
            StartBehavior::Block => {
                self.stop_requested.cancelled().await;
                Ok(())
            }
            StartBehavior::Fail(error) => Err(MockError(error.clone()).into()),
            StartBehavior::Exit => Ok(()),
        };

        self.start_returned.store(true, Ordering::SeqCst);
        result
    }

    async fn stop(&self) -> Result<(), BoxError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if !self.stop_delay.is_zero() {
            tokio::time::sleep(self.stop_delay).await;
        }
        self.stop_requested.cancel();

        match &self.stop_error {
            Some(error) => Err(MockError(error.clone()).into()),
            None => Ok(()),
        }
    }
}
