//! Direct RS-232 link for a device wired to the host.
//!
//! Without an iTach bridge, the amplifier or projector hangs off a USB
//! serial adapter. [`SerialTransport`] carries the same command bytes over
//! that port, so a [`HexBridge`](crate::HexBridge) can sit on either link.
//!
//! Factory settings are 8N1 without flow control, at 9600 baud for the
//! Nuvo Essentia and 115200 baud for BenQ projectors.
//!
//! ```no_run
//! use homelink_transport::{HexBridge, SerialConfig, SerialTransport};
//!
//! # async fn example() -> homelink_core::Result<()> {
//! let link =
//!     SerialTransport::open_with_config("/dev/ttyUSB0", SerialConfig::nuvo_essentia()).await?;
//! let bridge = HexBridge::new(link);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use homelink_core::error::{Error, Result};
use homelink_core::transport::Transport;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, SerialStream, StopBits};

use crate::map_io_error;

/// Line settings for [`SerialTransport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialConfig {
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
}

impl SerialConfig {
    /// 8N1, no flow control.
    pub fn eight_n_one(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
        }
    }

    pub fn nuvo_essentia() -> Self {
        Self::eight_n_one(9600)
    }

    pub fn benq_projector() -> Self {
        Self::eight_n_one(115_200)
    }
}

/// An open serial port.
pub struct SerialTransport {
    port: Option<SerialStream>,
    path: String,
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("path", &self.path)
            .field("open", &self.port.is_some())
            .finish()
    }
}

impl SerialTransport {
    pub async fn open(path: &str, baud_rate: u32) -> Result<Self> {
        Self::open_with_config(path, SerialConfig::eight_n_one(baud_rate)).await
    }

    pub async fn open_with_config(path: &str, config: SerialConfig) -> Result<Self> {
        tracing::debug!(path = %path, ?config, "Opening serial port");

        let port = tokio_serial::new(path, config.baud_rate)
            .data_bits(config.data_bits)
            .parity(config.parity)
            .stop_bits(config.stop_bits)
            .flow_control(config.flow_control)
            .open_native_async()
            .map_err(|e| {
                tracing::error!(path = %path, error = %e, "Serial port open failed");
                Error::Transport(format!("failed to open serial port {path}: {e}"))
            })?;

        tracing::info!(path = %path, baud_rate = config.baud_rate, "Serial port open");
        Ok(Self {
            port: Some(port),
            path: path.to_string(),
        })
    }

    /// Device path, e.g. `/dev/ttyUSB0`.
    pub fn path(&self) -> &str {
        &self.path
    }

    fn port(&mut self) -> Result<&mut SerialStream> {
        self.port.as_mut().ok_or(Error::NotConnected)
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        tracing::trace!(path = %self.path, data = ?data, "Serial write");
        let port = self.port()?;
        let written = match port.write_all(data).await {
            Ok(()) => port.flush().await,
            Err(e) => Err(e),
        };
        written.map_err(|e| {
            tracing::error!(path = %self.path, error = %e, "Serial write failed");
            map_io_error(e)
        })
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let port = self.port()?;
        match tokio::time::timeout(timeout, port.read(buf)).await {
            Err(_) => Err(Error::Timeout),
            Ok(Ok(n)) => {
                tracing::trace!(path = %self.path, data = ?&buf[..n], "Serial read");
                Ok(n)
            }
            Ok(Err(e)) => {
                tracing::error!(path = %self.path, error = %e, "Serial read failed");
                Err(map_io_error(e))
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        if self.port.take().is_some() {
            tracing::info!(path = %self.path, "Serial port closed");
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_presets() {
        let nuvo = SerialConfig::nuvo_essentia();
        assert_eq!(nuvo.baud_rate, 9600);
        assert_eq!(nuvo.data_bits, DataBits::Eight);
        assert_eq!(nuvo.parity, Parity::None);
        assert_eq!(nuvo.stop_bits, StopBits::One);
        assert_eq!(nuvo.flow_control, FlowControl::None);

        assert_eq!(SerialConfig::benq_projector().baud_rate, 115_200);
    }

    #[tokio::test]
    async fn missing_device_is_transport_error() {
        let result = SerialTransport::open("/dev/homelink-no-such-port", 9600).await;
        match result {
            Err(Error::Transport(msg)) => assert!(msg.contains("/dev/homelink-no-such-port")),
            other => panic!("expected Transport error, got: {other:?}"),
        }
    }
}
