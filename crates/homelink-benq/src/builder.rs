//! BenqBuilder -- fluent builder for a [`BenqProjector`].
//!
//! # Example
//!
//! ```no_run
//! use homelink_benq::BenqBuilder;
//!
//! # async fn example() -> homelink_core::Result<()> {
//! let projector = BenqBuilder::new("192.168.1.51")
//!     .name("Theater Projector")
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use homelink_core::error::{Error, Result};
use homelink_core::transport::{share_bridge, Bridge};
use homelink_transport::{HexBridge, SerialConfig, SerialTransport, TcpTransport};

use crate::projector::BenqProjector;

/// Default iTach IP2SL serial port.
pub const DEFAULT_PORT: u16 = 4999;

pub const DEFAULT_NAME: &str = "BenQ Projector";

/// Default wait for a reply.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Default bound on reaching the bridge before a command can be written.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(4);

/// Default pause between attribute queries.
pub const DEFAULT_ATTRIBUTE_DELAY: Duration = Duration::from_secs(2);

/// Fluent builder for [`BenqProjector`].
#[derive(Debug, Clone)]
pub struct BenqBuilder {
    host: String,
    port: u16,
    name: String,
    timeout: Duration,
    write_timeout: Duration,
    attribute_delay: Duration,
}

impl BenqBuilder {
    pub fn new(host: &str) -> Self {
        BenqBuilder {
            host: host.to_string(),
            port: DEFAULT_PORT,
            name: DEFAULT_NAME.to_string(),
            timeout: DEFAULT_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            attribute_delay: DEFAULT_ATTRIBUTE_DELAY,
        }
    }

    /// Set the bridge TCP port (default: 4999).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the display name (default: "BenQ Projector").
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Set how long to wait for the projector's reply (default: 3s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set how long connecting to the bridge may take (default: 4s).
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set the pause between attribute queries during an update
    /// (default: 2s). The projector drops commands sent back to back.
    pub fn attribute_delay(mut self, delay: Duration) -> Self {
        self.attribute_delay = delay;
        self
    }

    /// `host:port` of the bridge.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Build on a caller-provided bridge.
    pub fn build_with_bridge(self, bridge: Box<dyn Bridge>) -> Result<BenqProjector> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidParameter("projector name is empty".into()));
        }
        Ok(BenqProjector::new(
            self.name,
            share_bridge(bridge),
            self.attribute_delay,
        ))
    }

    /// Connect to the bridge over TCP and build the projector.
    pub async fn build(self) -> Result<BenqProjector> {
        let addr = self.addr();
        tracing::info!(addr = %addr, name = %self.name, "Connecting to BenQ projector");

        let transport = TcpTransport::connect_with_timeout(&addr, self.write_timeout).await?;
        let bridge = HexBridge::new(transport).response_timeout(self.timeout);
        self.build_with_bridge(Box::new(bridge))
    }

    /// Open the projector's RS-232 port directly (115200 8N1) and build the
    /// projector.
    pub async fn build_serial(self, port: &str) -> Result<BenqProjector> {
        tracing::info!(port = %port, name = %self.name, "Opening BenQ projector serial port");

        let transport =
            SerialTransport::open_with_config(port, SerialConfig::benq_projector()).await?;
        let bridge = HexBridge::new(transport).response_timeout(self.timeout);
        self.build_with_bridge(Box::new(bridge))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homelink_core::{Entity, EntityState, Switch};
    use homelink_test_harness::{MockBridge, MockTcpServer};

    #[test]
    fn defaults() {
        let b = BenqBuilder::new("10.0.0.9");
        assert_eq!(b.addr(), "10.0.0.9:4999");
        assert_eq!(b.name, "BenQ Projector");
        assert_eq!(b.timeout, Duration::from_secs(3));
        assert_eq!(b.write_timeout, Duration::from_secs(4));
        assert_eq!(b.attribute_delay, Duration::from_secs(2));
    }

    #[test]
    fn custom_name() {
        let p = BenqBuilder::new("h")
            .name("Den")
            .build_with_bridge(Box::new(MockBridge::new()))
            .unwrap();
        assert_eq!(p.info().name, "Den");
    }

    #[test]
    fn empty_name_rejected() {
        let result = BenqBuilder::new("h")
            .name("  ")
            .build_with_bridge(Box::new(MockBridge::new()));
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn serial_build_reports_missing_port() {
        let result = BenqBuilder::new("")
            .build_serial("/dev/homelink-no-such-port")
            .await;
        assert!(matches!(result, Err(Error::Transport(_))));
    }

    #[tokio::test]
    async fn build_over_tcp() {
        let mut server = MockTcpServer::new().await.unwrap();
        server.expect(b"\r*pow=on#\r", b">*pow=on#\r\r\n*POW=ON#\r\n");
        server.start();

        let (host, port) = server.addr().rsplit_once(':').unwrap();
        let mut p = BenqBuilder::new(host)
            .port(port.parse().unwrap())
            .timeout(Duration::from_secs(1))
            .build()
            .await
            .unwrap();

        p.turn_on().await.unwrap();
        assert_eq!(p.state(), EntityState::On);
    }
}
