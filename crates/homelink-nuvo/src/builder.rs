//! NuvoBuilder -- fluent builder for the zones of one amplifier.
//!
//! Separates configuration (bridge address, zone and source names) from
//! construction so ids are validated before any connection is opened.
//!
//! # Example
//!
//! ```no_run
//! use homelink_nuvo::NuvoBuilder;
//! use std::time::Duration;
//!
//! # async fn example() -> homelink_core::Result<()> {
//! let zones = NuvoBuilder::new("192.168.1.50")
//!     .response_timeout(Duration::from_millis(800))
//!     .zone(1, "Kitchen")
//!     .zone(2, "Patio")
//!     .source(1, "Sonos")
//!     .source(2, "TV")
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use homelink_core::error::{Error, Result};
use homelink_core::transport::{share_bridge, Bridge};
use homelink_transport::{HexBridge, SerialConfig, SerialTransport};

use crate::ids::{SourceId, ZoneId};
use crate::sources::SourceTable;
use crate::zone::NuvoZone;

/// Default iTach IP2SL serial port.
pub const DEFAULT_PORT: u16 = 4999;

/// Default wait for the first byte of a reply.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Fluent builder producing one [`NuvoZone`] per configured zone.
#[derive(Debug, Clone)]
pub struct NuvoBuilder {
    host: String,
    port: u16,
    response_timeout: Duration,
    zones: Vec<(u8, String)>,
    sources: Vec<(u8, String)>,
}

impl NuvoBuilder {
    /// Create a builder for the bridge at `host`.
    pub fn new(host: &str) -> Self {
        NuvoBuilder {
            host: host.to_string(),
            port: DEFAULT_PORT,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            zones: Vec::new(),
            sources: Vec::new(),
        }
    }

    /// Set the bridge TCP port (default: 4999).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set how long to wait for a reply (default: 1s).
    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Add a zone (1..=6) with its display name.
    pub fn zone(mut self, id: u8, name: &str) -> Self {
        self.zones.push((id, name.to_string()));
        self
    }

    /// Name a source input (1..=6).
    pub fn source(mut self, id: u8, name: &str) -> Self {
        self.sources.push((id, name.to_string()));
        self
    }

    /// `host:port` of the bridge.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Build the zones on a caller-provided bridge.
    ///
    /// This is the entry point for tests (pass a `MockBridge` from
    /// `homelink-test-harness`) and for callers that manage the bridge
    /// themselves.
    pub fn build_with_bridge(self, bridge: Box<dyn Bridge>) -> Result<Vec<NuvoZone>> {
        let (zones, sources) = self.validate()?;
        let bridge = share_bridge(bridge);
        let sources = Arc::new(sources);

        Ok(zones
            .into_iter()
            .map(|(id, name)| NuvoZone::new(id, name, bridge.clone(), Arc::clone(&sources)))
            .collect())
    }

    /// Connect to the bridge over TCP and build the zones.
    pub async fn build(self) -> Result<Vec<NuvoZone>> {
        self.validate()?;
        let addr = self.addr();
        tracing::info!(addr = %addr, zones = self.zones.len(), "Connecting to Nuvo amplifier");

        let bridge = HexBridge::connect(&addr, self.response_timeout).await?;
        self.build_with_bridge(Box::new(bridge))
    }

    /// Open the amplifier's RS-232 port directly (9600 8N1) and build the
    /// zones. The host and port settings are ignored.
    pub async fn build_serial(self, port: &str) -> Result<Vec<NuvoZone>> {
        self.validate()?;
        tracing::info!(
            port = %port,
            zones = self.zones.len(),
            "Opening Nuvo amplifier serial port"
        );

        let transport =
            SerialTransport::open_with_config(port, SerialConfig::nuvo_essentia()).await?;
        let bridge = HexBridge::new(transport).response_timeout(self.response_timeout);
        self.build_with_bridge(Box::new(bridge))
    }

    fn validate(&self) -> Result<(Vec<(ZoneId, String)>, SourceTable)> {
        if self.zones.is_empty() {
            return Err(Error::InvalidParameter(
                "at least one zone must be configured".into(),
            ));
        }

        let mut zones = BTreeMap::new();
        for (id, name) in &self.zones {
            let id = ZoneId::new(*id)?;
            if zones.insert(id, name.clone()).is_some() {
                return Err(Error::InvalidParameter(format!(
                    "zone {id} configured more than once"
                )));
            }
        }

        let mut sources = Vec::with_capacity(self.sources.len());
        for (id, name) in &self.sources {
            sources.push((SourceId::new(*id)?, name.clone()));
        }

        Ok((zones.into_iter().collect(), SourceTable::new(sources)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homelink_core::{Entity, EntityState, MediaPlayer};
    use homelink_test_harness::{MockBridge, MockTcpServer};

    #[test]
    fn defaults() {
        let builder = NuvoBuilder::new("10.0.0.5");
        assert_eq!(builder.addr(), "10.0.0.5:4999");
        assert_eq!(builder.response_timeout, Duration::from_secs(1));
    }

    #[test]
    fn zones_come_out_in_id_order_sharing_sources() {
        let zones = NuvoBuilder::new("h")
            .zone(3, "Den")
            .zone(1, "Kitchen")
            .source(2, "TV")
            .source(1, "Sonos")
            .build_with_bridge(Box::new(MockBridge::new()))
            .unwrap();

        let names: Vec<&str> = zones.iter().map(|z| z.name()).collect();
        assert_eq!(names, vec!["Kitchen", "Den"]);
        assert_eq!(zones[1].zone_id().get(), 3);
        assert_eq!(zones[0].source_list(), &["Sonos", "TV"]);
    }

    #[test]
    fn invalid_ids_rejected() {
        let result = NuvoBuilder::new("h")
            .zone(7, "Nowhere")
            .build_with_bridge(Box::new(MockBridge::new()));
        assert!(matches!(result, Err(Error::InvalidParameter(_))));

        let result = NuvoBuilder::new("h")
            .zone(1, "Kitchen")
            .source(0, "Bad")
            .build_with_bridge(Box::new(MockBridge::new()));
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn duplicate_zone_rejected() {
        let result = NuvoBuilder::new("h")
            .zone(2, "A")
            .zone(2, "B")
            .build_with_bridge(Box::new(MockBridge::new()));
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn at_least_one_zone_required() {
        let result = NuvoBuilder::new("127.0.0.1").build().await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn serial_build_validates_before_opening() {
        let result = NuvoBuilder::new("")
            .build_serial("/dev/homelink-no-such-port")
            .await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));

        let result = NuvoBuilder::new("")
            .zone(1, "Kitchen")
            .build_serial("/dev/homelink-no-such-port")
            .await;
        assert!(matches!(result, Err(Error::Transport(_))));
    }

    #[tokio::test]
    async fn build_over_tcp_and_poll() {
        let mut server = MockTcpServer::new().await.unwrap();
        server.expect(b"*Z2STATUS?\r", b"#Z2,ON,SRC1,VOL0\r\n");
        server.start();

        let (host, port) = server.addr().rsplit_once(':').unwrap();
        let mut zones = NuvoBuilder::new(host)
            .port(port.parse().unwrap())
            .zone(2, "Patio")
            .source(1, "Sonos")
            .build()
            .await
            .unwrap();

        let zone = &mut zones[0];
        zone.update().await.unwrap();
        assert_eq!(zone.state(), EntityState::On);
        assert_eq!(zone.volume_level(), Some(1.0));
        assert_eq!(zone.source(), Some("Sonos"));
    }
}
