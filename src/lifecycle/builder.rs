use std::sync::atomic::AtomicU8;
use std::sync::{Arc, OnceLock};

use tokio_util::sync::CancellationToken;
use tracing::Span;

use crate::lifecycle::app::{App, PHASE_CREATED};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::Signal;
use crate::transport::Server;

/// Builder for [`App`].
///
/// Every setter replaces one field; nothing can change once [`build`](AppBuilder::build)
/// has returned.
///
/// # Example
/// ```
/// use way::App;
///
/// let app = App::builder()
///     .name("orders")
///     .version("1.4.2")
///     .build();
/// assert_eq!(app.name(), "orders");
/// ```
pub struct AppBuilder {
    name: String,
    version: String,
    context: CancellationToken,
    signals: Vec<Signal>,
    logger: Option<Span>,
    servers: Vec<Arc<dyn Server>>,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            name: String::new(),
            version: String::new(),
            context: CancellationToken::new(),
            signals: Signal::DEFAULTS.to_vec(),
            logger: None,
            servers: Vec::new(),
        }
    }

    /// Logical service name, logged when the app starts.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Parent context. Cancelling it stops the app.
    pub fn context(mut self, parent: CancellationToken) -> Self {
        self.context = parent;
        self
    }

    /// Signals that trigger shutdown. An empty set disables signal handling.
    pub fn signals(mut self, signals: impl IntoIterator<Item = Signal>) -> Self {
        self.signals = signals.into_iter().collect();
        self
    }

    /// Span that every supervisor log entry is recorded under.
    pub fn logger(mut self, span: Span) -> Self {
        self.logger = Some(span);
        self
    }

    /// Register one more server.
    pub fn server<S: Server>(mut self, server: Arc<S>) -> Self {
        self.servers.push(server);
        self
    }

    /// Replace the registered servers.
    pub fn servers(mut self, servers: impl IntoIterator<Item = Arc<dyn Server>>) -> Self {
        self.servers = servers.into_iter().collect();
        self
    }

    pub fn build(self) -> App {
        let logger = self.logger.unwrap_or_else(|| {
            tracing::info_span!(
                "app",
                service_name = %self.name,
                version = %self.version
            )
        });

        App {
            shutdown: Shutdown::child_of(&self.context),
            name: self.name,
            version: self.version,
            signals: self.signals,
            logger,
            servers: self.servers,
            phase: AtomicU8::new(PHASE_CREATED),
            group: OnceLock::new(),
        }
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}
