//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (app.rs):
//!     App::run → install signal listeners → spawn 2 tasks per server + 1 signal watcher
//!
//! Shutdown (app.rs, group.rs, shutdown.rs):
//!     App::stop / signal / any task error
//!         → cancel shared token
//!         → every stop task calls Server::stop
//!         → every start task returns
//!         → TaskGroup::wait joins all → App::run returns
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGQUIT/SIGINT (configurable) → same path as App::stop
//! ```
//!
//! # Design Decisions
//! - One cancellation token per app; cancelling it twice is a no-op
//! - A failing server is fatal: every other server is stopped, no retries
//! - `run` waits for every stop call; a server that ignores stop hangs shutdown

pub mod app;
pub mod builder;
pub mod group;
pub mod shutdown;
pub mod signals;

pub use app::{App, AppState};
pub use builder::AppBuilder;
pub use group::TaskGroup;
pub use shutdown::Shutdown;
pub use signals::{Signal, SignalListener};
