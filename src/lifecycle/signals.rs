//! OS signal handling.
//!
//! [`SignalListener`] registers every requested signal up front, so a
//! registration failure is reported before any server starts, and then
//! resolves [`SignalListener::recv`] with whichever signal arrives first.
//!
//! On non-Unix platforms only [`Signal::Interrupt`] is supported and is
//! backed by [`tokio::signal::ctrl_c`]; other signals are ignored.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A termination signal the supervisor can watch for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    #[serde(rename = "SIGINT", alias = "INT")]
    Interrupt,
    #[serde(rename = "SIGTERM", alias = "TERM")]
    Terminate,
    #[serde(rename = "SIGQUIT", alias = "QUIT")]
    Quit,
    #[serde(rename = "SIGHUP", alias = "HUP")]
    Hangup,
    #[serde(rename = "SIGUSR1", alias = "USR1")]
    User1,
    #[serde(rename = "SIGUSR2", alias = "USR2")]
    User2,
}

impl Signal {
    /// Signals watched when none are configured.
    pub const DEFAULTS: [Signal; 3] = [Signal::Terminate, Signal::Quit, Signal::Interrupt];

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Interrupt => "SIGINT",
            Signal::Terminate => "SIGTERM",
            Signal::Quit => "SIGQUIT",
            Signal::Hangup => "SIGHUP",
            Signal::User1 => "SIGUSR1",
            Signal::User2 => "SIGUSR2",
        }
    }

    #[cfg(unix)]
    fn kind(self) -> tokio::signal::unix::SignalKind {
        use tokio::signal::unix::SignalKind;

        match self {
            Signal::Interrupt => SignalKind::interrupt(),
            Signal::Terminate => SignalKind::terminate(),
            Signal::Quit => SignalKind::quit(),
            Signal::Hangup => SignalKind::hangup(),
            Signal::User1 => SignalKind::user_defined1(),
            Signal::User2 => SignalKind::user_defined2(),
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a signal name is not recognised.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown signal: {0}")]
pub struct ParseSignalError(String);

impl FromStr for Signal {
    type Err = ParseSignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let name = upper.strip_prefix("SIG").unwrap_or(&upper);
        match name {
            "INT" => Ok(Signal::Interrupt),
            "TERM" => Ok(Signal::Terminate),
            "QUIT" => Ok(Signal::Quit),
            "HUP" => Ok(Signal::Hangup),
            "USR1" => Ok(Signal::User1),
            "USR2" => Ok(Signal::User2),
            _ => Err(ParseSignalError(s.to_string())),
        }
    }
}

/// Registered listeners for a set of signals.
pub struct SignalListener {
    #[cfg(unix)]
    streams: Vec<(Signal, tokio::signal::unix::Signal)>,
    #[cfg(not(unix))]
    ctrl_c: bool,
}

impl SignalListener {
    /// Register listeners for every signal in `signals`.
    #[cfg(unix)]
    pub fn install(signals: &[Signal]) -> std::io::Result<Self> {
        let streams = signals
            .iter()
            .map(|&signal| {
                tokio::signal::unix::signal(signal.kind()).map(|stream| (signal, stream))
            })
            .collect::<std::io::Result<Vec<_>>>()?;

        tracing::debug!(signals = ?signals, "Signal handlers installed");
        Ok(Self { streams })
    }

    #[cfg(not(unix))]
    pub fn install(signals: &[Signal]) -> std::io::Result<Self> {
        Ok(Self {
            ctrl_c: signals.contains(&Signal::Interrupt),
        })
    }

    /// Wait for the next signal. Never resolves for an empty set.
    #[cfg(unix)]
    pub async fn recv(&mut self) -> Signal {
        if self.streams.is_empty() {
            return std::future::pending().await;
        }

        let waits = self.streams.iter_mut().map(|(signal, stream)| {
            Box::pin(async move {
                stream.recv().await;
                *signal
            })
        });
        let (signal, _, _) = futures_util::future::select_all(waits).await;
        signal
    }

    #[cfg(not(unix))]
    pub async fn recv(&mut self) -> Signal {
        if self.ctrl_c && tokio::signal::ctrl_c().await.is_ok() {
            return Signal::Interrupt;
        }
        std::future::pending().await
    }
}
