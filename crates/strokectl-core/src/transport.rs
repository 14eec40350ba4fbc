//! One-shot exchange with the daemon's control socket.
//!
//! One message per connection: connect, write the used bytes, then relay
//! the daemon's textual response line by line until it closes its end.
//! There is no retry and no queueing; a transport failure is the caller's
//! to report.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tracing::{debug, info, warn};

use strokectl_config::ClientConfig;

use crate::proto::StrokeMsg;

/// Default path of the daemon's control socket.
pub const DEFAULT_SOCKET_PATH: &str = "/var/run/charon.ctl";

/// Errors from the daemon transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("daemon is not running (socket not found at {0})")]
    NotRunning(PathBuf),

    #[error("failed to connect to daemon socket at {path}: {source}")]
    Connect {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write stroke message: {0}")]
    Write(std::io::Error),

    #[error("daemon did not respond within {0:?}")]
    Timeout(Duration),
}

/// Client for delivering stroke messages over the daemon's Unix socket.
///
/// Without a timeout the exchange blocks for as long as the daemon holds
/// the connection open; set one via [`with_timeout`](Self::with_timeout)
/// when that is not acceptable.
pub struct StrokeTransport {
    socket_path: PathBuf,
    verbosity: i32,
    timeout: Option<Duration>,
}

impl StrokeTransport {
    /// Create a transport targeting the given socket path. Daemon-side
    /// output stays silent (verbosity `-1`) unless overridden.
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            verbosity: -1,
            timeout: None,
        }
    }

    /// Build a transport from the loaded client configuration.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            socket_path: PathBuf::from(&config.daemon.socket_path),
            verbosity: config.daemon.verbosity,
            timeout: config.daemon.io_timeout_secs.map(Duration::from_secs),
        }
    }

    /// Point the transport at a different socket, keeping the other
    /// settings.
    pub fn with_socket_path(mut self, socket_path: impl Into<PathBuf>) -> Self {
        self.socket_path = socket_path.into();
        self
    }

    /// Set the verbosity stamped into each outgoing message.
    pub fn with_verbosity(mut self, verbosity: i32) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Bound connect and each I/O step by the given duration.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The socket path this transport talks to.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Check if the daemon socket exists (daemon is likely running).
    pub fn daemon_available(&self) -> bool {
        self.socket_path.exists()
    }

    /// Send a message and relay the daemon's response through `tracing`.
    pub async fn send(&self, msg: &mut StrokeMsg) -> Result<(), TransportError> {
        self.send_with(msg, |line| info!(target: "strokectl::daemon", "{line}"))
            .await
    }

    /// Send a message, forwarding each response line to `sink` as it
    /// arrives. Returns once the daemon closes the connection.
    ///
    /// The result reflects delivery only: a read-side error after a
    /// successful write is logged, not returned, since the daemon has the
    /// message either way.
    pub async fn send_with(
        &self,
        msg: &mut StrokeMsg,
        mut sink: impl FnMut(&str),
    ) -> Result<(), TransportError> {
        if !self.daemon_available() {
            return Err(TransportError::NotRunning(self.socket_path.clone()));
        }

        msg.set_verbosity(self.verbosity);

        let mut stream = self
            .bounded(UnixStream::connect(&self.socket_path))
            .await?
            .map_err(|source| TransportError::Connect {
                path: self.socket_path.clone(),
                source,
            })?;

        debug!(
            kind = ?msg.kind(),
            len = msg.len(),
            path = %self.socket_path.display(),
            "sending stroke message"
        );
        self.bounded(stream.write_all(msg.wire_bytes()))
            .await?
            .map_err(TransportError::Write)?;

        // Live relay: lines reach the sink as chunks arrive, not after the
        // daemon finishes. A partial trailing line is flushed at EOF.
        let mut pending = String::new();
        let mut buf = [0u8; 1024];
        loop {
            let read = match self.bounded(stream.read(&mut buf)).await {
                Ok(Ok(0)) => break,
                Ok(Ok(n)) => n,
                Ok(Err(e)) => {
                    warn!(error = %e, "error reading daemon response");
                    break;
                }
                Err(TransportError::Timeout(t)) => {
                    warn!(timeout = ?t, "daemon response timed out");
                    break;
                }
                Err(e) => return Err(e),
            };
            pending.push_str(&String::from_utf8_lossy(&buf[..read]));
            while let Some(nl) = pending.find('\n') {
                sink(pending[..nl].trim_end_matches('\r'));
                pending.drain(..=nl);
            }
        }
        if !pending.is_empty() {
            sink(&pending);
        }

        Ok(())
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = std::io::Result<T>>,
    ) -> Result<std::io::Result<T>, TransportError> {
        match self.timeout {
            Some(t) => tokio::time::timeout(t, fut)
                .await
                .map_err(|_| TransportError::Timeout(t)),
            None => Ok(fut.await),
        }
    }
}
