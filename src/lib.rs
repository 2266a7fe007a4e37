//! Process-level lifecycle supervisor for long-running network services.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                        App                           │
//!                 │                                                      │
//!   SIGTERM ─────▶│  signal watcher ──┐                                  │
//!   App::stop ───▶│                   ▼                                  │
//!   parent ──────▶│        shared CancellationToken ◀── any task error   │
//!                 │                   │                                  │
//!                 │        ┌──────────┼───────────┐                      │
//!                 │        ▼          ▼           ▼                      │
//!                 │   stop task   stop task   stop task   (wait, stop)   │
//!                 │   start task  start task  start task  (serve)        │
//!                 │        │          │           │                      │
//!                 │        └──────────┴───────────┘                      │
//!                 │             TaskGroup::wait → first error            │
//!                 └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use way::{App, HttpServer};
//!
//! # async fn demo() -> Result<(), way::AppError> {
//! let http = Arc::new(HttpServer::builder().address("127.0.0.1:8080").build());
//! let app = App::builder()
//!     .name("orders")
//!     .version("1.0.0")
//!     .server(http)
//!     .build();
//! app.run().await
//! # }
//! ```

// Core
pub mod error;
pub mod lifecycle;
pub mod transport;

// Cross-cutting concerns
pub mod config;
pub mod observability;

pub use config::WayConfig;
pub use error::{AppError, BoxError};
pub use lifecycle::{App, AppBuilder, AppState, Shutdown, Signal};
pub use transport::http::HttpServer;
pub use transport::Server;
