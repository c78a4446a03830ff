//! Hex-framed command bridge.
//!
//! Serial-to-IP adapters are driven with commands given as hex strings.
//! [`HexBridge`] takes such a string, decodes it back to the raw command
//! bytes, writes them through its [`Transport`] and then reads whatever the
//! device sends back until the line goes quiet.
//!
//! The first chunk of the reply is awaited for up to the response timeout.
//! After that, chunks are collected until no further data arrives within
//! the (much shorter) idle timeout. No data at all is [`Error::Timeout`].
//!
//! Bytes already waiting on the line when a command is issued belong to an
//! earlier exchange (typically a reply that arrived after its timeout) and
//! are discarded before the command is written.

use async_trait::async_trait;
use homelink_core::error::{Error, Result};
use homelink_core::transport::{Bridge, Transport};
use std::time::Duration;

use crate::tcp::TcpTransport;

/// Default time to wait for the first byte of a reply.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Default gap after which a partial reply is considered complete.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(100);

/// Upper bound on a single reply. Device replies are a few dozen bytes.
const MAX_REPLY_LEN: usize = 4096;

/// Read timeout used while discarding stale bytes before a command.
const STALE_DRAIN_TIMEOUT: Duration = Duration::from_millis(1);

/// A [`Bridge`] over any byte-level [`Transport`].
#[derive(Debug)]
pub struct HexBridge<T> {
    transport: T,
    response_timeout: Duration,
    idle_timeout: Duration,
}

impl<T: Transport> HexBridge<T> {
    /// Wrap a transport using the default timeouts.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    /// Set how long to wait for the first byte of a reply.
    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Set the quiet gap that ends a reply.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Borrow the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Unwrap the bridge and return the transport.
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Mutably borrow the underlying transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Read and drop whatever is already buffered on the line.
    async fn discard_stale(&mut self) -> Result<()> {
        let mut stale = Vec::new();
        let mut buf = [0u8; 256];

        loop {
            match self.transport.receive(&mut buf, STALE_DRAIN_TIMEOUT).await {
                Ok(n) if n > 0 => {
                    stale.extend_from_slice(&buf[..n]);
                    if stale.len() >= MAX_REPLY_LEN {
                        tracing::warn!(
                            bytes = stale.len(),
                            "Stale data keeps arriving, giving up drain"
                        );
                        break;
                    }
                }
                Ok(_) | Err(Error::Timeout) => break,
                Err(e) => return Err(e),
            }
        }

        if !stale.is_empty() {
            tracing::debug!(
                bytes = stale.len(),
                stale = ?String::from_utf8_lossy(&stale),
                "Discarding stale bridge data"
            );
        }
        Ok(())
    }

    async fn collect_reply(&mut self) -> Result<Vec<u8>> {
        let mut reply = Vec::new();
        let mut buf = [0u8; 256];
        let mut timeout = self.response_timeout;

        loop {
            match self.transport.receive(&mut buf, timeout).await {
                Ok(n) => {
                    reply.extend_from_slice(&buf[..n]);
                    if reply.len() >= MAX_REPLY_LEN {
                        tracing::warn!(bytes = reply.len(), "Reply too long, truncating");
                        break;
                    }
                    timeout = self.idle_timeout;
                }
                Err(Error::Timeout) if !reply.is_empty() => break,
                Err(e) => return Err(e),
            }
        }

        Ok(reply)
    }
}

impl HexBridge<TcpTransport> {
    /// Connect to a bridge at `host:port` and use `response_timeout` for
    /// replies.
    pub async fn connect(addr: &str, response_timeout: Duration) -> Result<Self> {
        let transport = TcpTransport::connect(addr).await?;
        Ok(Self::new(transport).response_timeout(response_timeout))
    }
}

#[async_trait]
impl<T: Transport> Bridge for HexBridge<T> {
    async fn send_and_receive(&mut self, hex_command: &str) -> Result<String> {
        let command = hex::decode(hex_command).map_err(|e| {
            Error::InvalidParameter(format!("command is not valid hex ({e}): {hex_command}"))
        })?;

        self.discard_stale().await?;

        tracing::debug!(command = %hex_command, "Bridge request");
        self.transport.send(&command).await?;

        let reply = self.collect_reply().await.map_err(|e| {
            tracing::debug!(command = %hex_command, error = %e, "No reply from bridge");
            e
        })?;

        let text = String::from_utf8_lossy(&reply).into_owned();
        tracing::debug!(bytes = reply.len(), reply = ?text, "Bridge reply");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homelink_test_harness::{MockTcpServer, MockTransport};

    #[tokio::test]
    async fn decodes_hex_and_returns_reply_text() {
        let mut mock = MockTransport::new();
        mock.expect(b"*Z1STATUS?\r", b"#Z1,ON,SRC2,VOL40\r\n");

        let mut bridge = HexBridge::new(mock);
        let reply = bridge
            .send_and_receive("2a5a315354415455533f0d")
            .await
            .unwrap();

        assert_eq!(reply, "#Z1,ON,SRC2,VOL40\r\n");
        assert_eq!(bridge.transport().sent_data(), &[b"*Z1STATUS?\r".to_vec()]);
    }

    #[tokio::test]
    async fn invalid_hex_is_rejected_before_sending() {
        let mut bridge = HexBridge::new(MockTransport::new());

        let result = bridge.send_and_receive("zz").await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
        assert!(bridge.transport().sent_data().is_empty());
    }

    #[tokio::test]
    async fn no_reply_is_timeout() {
        let mut mock = MockTransport::new();
        mock.expect_silence(b"*Z1ON\r");

        let mut bridge = HexBridge::new(mock);
        let result = bridge.send_and_receive("2a5a314f4e0d").await;
        assert!(matches!(result, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn chunks_are_collected_until_quiet() {
        let mut mock = MockTransport::new();
        mock.expect_chunks(b"\r*ltim=?#\r", &[b"\r\r\n*LTIM=", b"1234#\r\n"]);

        let mut bridge = HexBridge::new(mock);
        let reply = bridge
            .send_and_receive(&hex::encode(b"\r*ltim=?#\r"))
            .await
            .unwrap();
        assert_eq!(reply, "\r\r\n*LTIM=1234#\r\n");
    }

    #[tokio::test]
    async fn send_failure_propagates() {
        let mut mock = MockTransport::new();
        mock.set_connected(false);

        let mut bridge = HexBridge::new(mock);
        let result = bridge.send_and_receive("2a5a314f4e0d").await;
        assert!(matches!(result, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn stale_bytes_are_discarded_before_send() {
        let mut mock = MockTransport::new();
        mock.deliver(b"#Z1,ON\r\n");
        mock.expect(b"*Z1STATUS?\r", b"#Z1,OFF\r\n");

        let mut bridge = HexBridge::new(mock);
        let reply = bridge
            .send_and_receive(&hex::encode(b"*Z1STATUS?\r"))
            .await
            .unwrap();
        assert_eq!(reply, "#Z1,OFF\r\n");
    }

    #[tokio::test]
    async fn timed_out_reply_does_not_answer_next_command() {
        let mut mock = MockTransport::new();
        mock.expect_silence(b"*Z1STATUS?\r");
        mock.expect(b"*Z1STATUS?\r", b"#Z1,OFF\r\n");

        let mut bridge = HexBridge::new(mock);
        let query = hex::encode(b"*Z1STATUS?\r");
        let first = bridge.send_and_receive(&query).await;
        assert!(matches!(first, Err(Error::Timeout)));

        // The answer to the first query shows up after it was given up on.
        bridge.transport_mut().deliver(b"#Z1,ON\r\n");

        let second = bridge.send_and_receive(&query).await.unwrap();
        assert_eq!(second, "#Z1,OFF\r\n");
        assert_eq!(bridge.transport().remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn late_reply_over_tcp_is_discarded() {
        let mut server = MockTcpServer::new().await.unwrap();
        // Nothing at first, then the reply 300 ms later.
        server.expect_chunked(
            b"*Z1STATUS?\r",
            vec![Vec::new(), b"#Z1,ON\r\n".to_vec()],
            Duration::from_millis(300),
        );
        server.expect(b"*Z1STATUS?\r", b"#Z1,OFF\r\n");
        server.start();

        let mut bridge = HexBridge::connect(server.addr(), Duration::from_millis(200))
            .await
            .unwrap();
        let query = hex::encode(b"*Z1STATUS?\r");

        let first = bridge.send_and_receive(&query).await;
        assert!(matches!(first, Err(Error::Timeout)));

        // Let the late reply land in the socket buffer.
        tokio::time::sleep(Duration::from_millis(300)).await;

        let second = bridge.send_and_receive(&query).await.unwrap();
        assert_eq!(second, "#Z1,OFF\r\n");

        bridge.into_inner().close().await.unwrap();
        server.wait().await.unwrap();
    }

    #[tokio::test]
    async fn reply_in_several_chunks_is_joined() {
        let mut server = MockTcpServer::new().await.unwrap();
        server.expect_chunked(
            b"\r*pow=?#\r",
            vec![b"\r\r\n".to_vec(), b"*POW=ON#".to_vec(), b"\r\n".to_vec()],
            Duration::from_millis(10),
        );
        server.start();

        let mut bridge = HexBridge::connect(server.addr(), Duration::from_secs(2))
            .await
            .unwrap()
            .idle_timeout(Duration::from_millis(200));

        let reply = bridge
            .send_and_receive(&hex::encode(b"\r*pow=?#\r"))
            .await
            .unwrap();
        assert_eq!(reply, "\r\r\n*POW=ON#\r\n");

        bridge.into_inner().close().await.unwrap();
        server.wait().await.unwrap();
    }
}
