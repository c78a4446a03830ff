//! Byte-level mock transport.
//!
//! [`MockTransport`] answers each scripted write with a scripted reply,
//! optionally split into several reads, so `HexBridge` reply collection
//! can be tested without an amplifier or projector on the line.
//!
//! # Example
//!
//! ```
//! use homelink_test_harness::MockTransport;
//!
//! let mut mock = MockTransport::new();
//! // When the bridge writes the status query, answer with an "on" status.
//! mock.expect(b"*Z2STATUS?\r", b"#Z2,ON,SRC1,VOL35\r\n");
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;

use homelink_core::error::{Error, Result};
use homelink_core::transport::Transport;

#[derive(Debug)]
struct Exchange {
    request: Vec<u8>,
    /// Each entry is delivered by one `receive()`. Empty means silence.
    reply: Vec<Vec<u8>>,
}

/// Scripted [`Transport`].
///
/// Writes must arrive in script order; a write that does not match the
/// next exchange, or arrives after the script ends, is an
/// [`Error::Protocol`]. Once a reply is drained, `receive()` reports
/// [`Error::Timeout`] the way a quiet line does. Unread bytes stay on the
/// line across writes, as they would in a socket buffer.
#[derive(Debug)]
pub struct MockTransport {
    script: VecDeque<Exchange>,
    unread: VecDeque<Vec<u8>>,
    open: bool,
    written: Vec<Vec<u8>>,
}

impl MockTransport {
    pub fn new() -> Self {
        MockTransport {
            script: VecDeque::new(),
            unread: VecDeque::new(),
            open: true,
            written: Vec::new(),
        }
    }

    /// Reply to `request` with `response` in one read.
    pub fn expect(&mut self, request: &[u8], response: &[u8]) {
        let reply = if response.is_empty() {
            Vec::new()
        } else {
            vec![response.to_vec()]
        };
        self.push(request, reply);
    }

    /// Reply to `request` with one read per chunk.
    pub fn expect_chunks(&mut self, request: &[u8], chunks: &[&[u8]]) {
        let reply = chunks.iter().map(|c| c.to_vec()).collect();
        self.push(request, reply);
    }

    /// Accept `request` and never answer it.
    pub fn expect_silence(&mut self, request: &[u8]) {
        self.push(request, Vec::new());
    }

    /// Put bytes on the line without a preceding write, like a reply that
    /// arrives after its requester stopped waiting.
    pub fn deliver(&mut self, data: &[u8]) {
        self.unread.push_back(data.to_vec());
    }

    fn push(&mut self, request: &[u8], reply: Vec<Vec<u8>>) {
        self.script.push_back(Exchange {
            request: request.to_vec(),
            reply,
        });
    }

    /// Every write so far, one entry per `send()`.
    pub fn sent_data(&self) -> &[Vec<u8>] {
        &self.written
    }

    pub fn remaining_expectations(&self) -> usize {
        self.script.len()
    }

    /// Simulate the line dropping (`false`) or coming back (`true`).
    pub fn set_connected(&mut self, connected: bool) {
        self.open = connected;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.open {
            return Err(Error::NotConnected);
        }
        self.written.push(data.to_vec());

        let Some(exchange) = self.script.pop_front() else {
            return Err(Error::Protocol(format!(
                "mock transport script exhausted, got {:?}",
                String::from_utf8_lossy(data)
            )));
        };
        if exchange.request != data {
            return Err(Error::Protocol(format!(
                "mock transport expected {:?}, got {:?}",
                String::from_utf8_lossy(&exchange.request),
                String::from_utf8_lossy(data)
            )));
        }

        self.unread.extend(exchange.reply);
        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        if !self.open {
            return Err(Error::NotConnected);
        }

        let Some(mut chunk) = self.unread.pop_front() else {
            return Err(Error::Timeout);
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            self.unread.push_front(chunk.split_off(n));
        }
        Ok(n)
    }

    async fn close(&mut self) -> Result<()> {
        self.open = false;
        self.unread.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.open
    }
}
