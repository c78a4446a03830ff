//! Mock TCP server for bridge-level testing.
//!
//! [`MockTcpServer`] stands in for a serial-to-IP bridge: a local TCP
//! listener with scripted replies. A reply can be written in one piece or
//! dribbled out in chunks, the way a real serial line delivers it.
//!
//! # Example
//!
//! ```
//! use homelink_test_harness::MockTcpServer;
//!
//! # async fn example() -> homelink_core::Result<()> {
//! let mut server = MockTcpServer::new().await?;
//!
//! // When the client sends the power query, answer "on".
//! server.expect(b"\r*pow=?#\r", b"\r\r\n*POW=ON#\r\n");
//! server.start();
//!
//! let addr = server.addr().to_string();
//! // ... connect a TcpTransport to `addr` and test ...
//! # Ok(())
//! # }
//! ```

use homelink_core::error::{Error, Result};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
struct TcpExpectation {
    request: Vec<u8>,
    chunks: Vec<Vec<u8>>,
    gap: Duration,
}

/// A mock TCP server for testing transports and bridges.
///
/// The server binds a random localhost port on construction. Once
/// [`start`](MockTcpServer::start) is called it accepts a single connection
/// and processes expectations in order: it reads exactly the expected
/// request, compares it, then writes the scripted reply.
///
/// A mismatch ends the server task with an error that
/// [`wait`](MockTcpServer::wait) reports.
pub struct MockTcpServer {
    addr: String,
    listener: Option<TcpListener>,
    expectations: VecDeque<TcpExpectation>,
    server_handle: Option<JoinHandle<std::result::Result<(), String>>>,
}

impl MockTcpServer {
    /// Create a new mock server listening on a random port.
    ///
    /// The listener is bound immediately, so clients may connect before
    /// [`start`](MockTcpServer::start); the connection is accepted once
    /// the server runs.
    pub async fn new() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| Error::Transport(format!("failed to bind mock TCP server: {e}")))?;
        let addr = listener.local_addr()?.to_string();

        Ok(Self {
            addr,
            listener: Some(listener),
            expectations: VecDeque::new(),
            server_handle: None,
        })
    }

    /// Add an expected request and the reply to write in one piece.
    pub fn expect(&mut self, request: &[u8], response: &[u8]) {
        self.expectations.push_back(TcpExpectation {
            request: request.to_vec(),
            chunks: vec![response.to_vec()],
            gap: Duration::ZERO,
        });
    }

    /// Add an expected request whose reply is written as separate chunks
    /// with `gap` between them.
    pub fn expect_chunked(&mut self, request: &[u8], chunks: Vec<Vec<u8>>, gap: Duration) {
        self.expectations.push_back(TcpExpectation {
            request: request.to_vec(),
            chunks,
            gap,
        });
    }

    /// Get the `host:port` address the server is listening on.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Start serving: accept one client and process all expectations.
    ///
    /// After the last expectation the connection is held open until the
    /// client closes it. Calling `start` twice has no effect.
    pub fn start(&mut self) {
        let Some(listener) = self.listener.take() else {
            return;
        };
        let expectations: Vec<TcpExpectation> = self.expectations.drain(..).collect();

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener
                .accept()
                .await
                .map_err(|e| format!("failed to accept connection: {e}"))?;

            for (i, expectation) in expectations.iter().enumerate() {
                serve_one(&mut stream, i, expectation).await?;
            }

            // Hold the line open like a real bridge until the client leaves.
            let mut sink = [0u8; 64];
            while let Ok(n) = stream.read(&mut sink).await {
                if n == 0 {
                    break;
                }
            }

            Ok(())
        });

        self.server_handle = Some(handle);
    }

    /// Wait for the server task to finish and return any mismatch.
    ///
    /// Close the client side first; the server keeps the connection open
    /// until then.
    pub async fn wait(self) -> std::result::Result<(), String> {
        match self.server_handle {
            Some(handle) => handle
                .await
                .map_err(|e| format!("server task panicked: {e}"))?,
            None => Ok(()),
        }
    }
}

async fn serve_one(
    stream: &mut TcpStream,
    i: usize,
    expectation: &TcpExpectation,
) -> std::result::Result<(), String> {
    let mut buf = vec![0u8; expectation.request.len()];
    let mut total_read = 0;

    while total_read < buf.len() {
        let n = stream
            .read(&mut buf[total_read..])
            .await
            .map_err(|e| format!("expectation {i}: read error: {e}"))?;
        if n == 0 {
            return Err(format!(
                "expectation {i}: client disconnected after {total_read} bytes (expected {})",
                buf.len()
            ));
        }
        total_read += n;
    }

    if buf != expectation.request {
        return Err(format!(
            "expectation {i}: request mismatch: expected {:02X?}, got {:02X?}",
            expectation.request, buf
        ));
    }

    for (n, chunk) in expectation.chunks.iter().enumerate() {
        if n > 0 && !expectation.gap.is_zero() {
            tokio::time::sleep(expectation.gap).await;
        }
        stream
            .write_all(chunk)
            .await
            .map_err(|e| format!("expectation {i}: write error: {e}"))?;
        stream
            .flush()
            .await
            .map_err(|e| format!("expectation {i}: flush error: {e}"))?;
    }

    tracing::trace!(expectation = i, "Mock TCP server answered");
    Ok(())
}
