//! Transport and bridge traits for device communication.
//!
//! The [`Transport`] trait abstracts over the physical link to a device or
//! to a serial-to-IP bridge. Implementations exist for TCP sockets, serial
//! ports, and mock transports for testing.
//!
//! The [`Bridge`] trait sits one level above: it is the channel the device
//! codecs talk to. A bridge takes a command already framed as lowercase hex
//! (the format serial-to-IP adapters such as the iTach IP2SL are driven
//! with) and returns the device's raw text reply.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::error::Result;

/// Asynchronous byte-level transport to a device.
///
/// Implementations handle buffering and error recovery at the physical
/// layer. Command framing is handled by the codecs that consume this trait.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send raw bytes to the device.
    ///
    /// Implementations should block until all bytes have been written to
    /// the underlying transport (serial TX buffer, TCP socket, etc.).
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive bytes from the device into the provided buffer.
    ///
    /// Returns the number of bytes actually read. Will wait up to `timeout`
    /// for data to arrive; returns [`Error::Timeout`](crate::error::Error::Timeout)
    /// if no data is received within the deadline.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Close the transport connection.
    ///
    /// After calling `close()`, subsequent `send()` and `receive()` calls
    /// should return [`Error::NotConnected`](crate::error::Error::NotConnected).
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently connected.
    fn is_connected(&self) -> bool;
}

/// Command/response channel to a device behind a serial-to-IP bridge.
///
/// One call is one exchange: the hex-encoded command goes out, the raw
/// reply comes back. An `Err` means no usable reply arrived; callers must
/// treat that as "status unavailable", never as a device state.
#[async_trait]
pub trait Bridge: Send + Sync {
    /// Send a lowercase-hex encoded command and return the raw text reply.
    async fn send_and_receive(&mut self, hex_command: &str) -> Result<String>;
}

/// A bridge shared by every entity behind the same physical adapter.
///
/// The host drives at most one call at a time, so the lock is never
/// contended in practice; it only makes the sharing explicit.
pub type SharedBridge = Arc<Mutex<Box<dyn Bridge>>>;

/// Wrap a bridge so it can be shared between entities.
pub fn share_bridge(bridge: Box<dyn Bridge>) -> SharedBridge {
    Arc::new(Mutex::new(bridge))
}
