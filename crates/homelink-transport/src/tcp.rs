//! TCP link to a serial-to-IP bridge.
//!
//! A Global Caché iTach IP2SL exposes its RS-232 port on TCP port 4999.
//! Bytes written to the socket go out on the serial line unchanged and
//! whatever the device answers comes back on the socket, so
//! [`TcpTransport`] is a thin [`Transport`] over one `TcpStream`.
//!
//! ```no_run
//! use homelink_transport::TcpTransport;
//! use homelink_core::transport::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> homelink_core::Result<()> {
//! let mut link = TcpTransport::connect("192.168.1.50:4999").await?;
//! link.send(b"*Z1STATUS?\r").await?;
//!
//! let mut buf = [0u8; 256];
//! let n = link.receive(&mut buf, Duration::from_secs(1)).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use homelink_core::error::{Error, Result};
use homelink_core::transport::Transport;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::map_io_error;

/// How long `connect` waits for the bridge to accept.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// One TCP connection to a bridge's serial port.
#[derive(Debug)]
pub struct TcpTransport {
    stream: Option<TcpStream>,
    peer: String,
}

impl TcpTransport {
    pub async fn connect(peer: &str) -> Result<Self> {
        Self::connect_with_timeout(peer, DEFAULT_CONNECT_TIMEOUT).await
    }

    /// Connect to `host:port`, failing with [`Error::Timeout`] when the
    /// bridge does not accept within `timeout`.
    pub async fn connect_with_timeout(peer: &str, timeout: Duration) -> Result<Self> {
        let stream = match tokio::time::timeout(timeout, TcpStream::connect(peer)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                tracing::error!(peer = %peer, error = %e, "Bridge connection failed");
                return Err(match e.kind() {
                    std::io::ErrorKind::ConnectionRefused => {
                        Error::Transport(format!("connection refused: {peer}"))
                    }
                    _ => Error::Io(e),
                });
            }
            Err(_) => {
                tracing::error!(
                    peer = %peer,
                    timeout_ms = timeout.as_millis(),
                    "Bridge did not accept"
                );
                return Err(Error::Timeout);
            }
        };

        // Commands are a few bytes each; do not let Nagle hold them back.
        if let Err(e) = stream.set_nodelay(true) {
            tracing::warn!(peer = %peer, error = %e, "Could not set TCP_NODELAY");
        }
        tracing::info!(peer = %peer, "Bridge connected");

        Ok(Self {
            stream: Some(stream),
            peer: peer.to_string(),
        })
    }

    /// The `host:port` this transport was opened with.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    fn stream(&mut self) -> Result<&mut TcpStream> {
        self.stream.as_mut().ok_or(Error::NotConnected)
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        tracing::trace!(peer = %self.peer, data = ?data, "Bridge write");
        let stream = self.stream()?;
        let written = match stream.write_all(data).await {
            Ok(()) => stream.flush().await,
            Err(e) => Err(e),
        };
        written.map_err(|e| {
            tracing::error!(peer = %self.peer, error = %e, "Bridge write failed");
            map_io_error(e)
        })
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let stream = self.stream()?;
        let read = tokio::time::timeout(timeout, stream.read(buf)).await;

        match read {
            Err(_) => Err(Error::Timeout),
            Ok(Ok(0)) => {
                tracing::warn!(peer = %self.peer, "Bridge closed the connection");
                Err(Error::ConnectionLost)
            }
            Ok(Ok(n)) => {
                tracing::trace!(peer = %self.peer, data = ?&buf[..n], "Bridge read");
                Ok(n)
            }
            Ok(Err(e)) => {
                tracing::error!(peer = %self.peer, error = %e, "Bridge read failed");
                Err(map_io_error(e))
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                tracing::debug!(peer = %self.peer, error = %e, "Shutdown failed");
            }
            tracing::info!(peer = %self.peer, "Bridge disconnected");
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}
