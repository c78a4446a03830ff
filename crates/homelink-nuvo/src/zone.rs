//! NuvoZone -- one amplifier zone as a media player entity.
//!
//! Each zone polls its own status through the bridge shared by every zone
//! of the amplifier. Commands are fire-and-forget: the amplifier's echo is
//! logged and the cached state catches up on the next [`update`](Entity::update).

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use homelink_core::entity::{Entity, MediaPlayer, EVENT_CHANNEL_CAPACITY};
use homelink_core::error::{Error, Result};
use homelink_core::events::EntityEvent;
use homelink_core::transport::SharedBridge;
use homelink_core::types::{EntityInfo, EntityKind, EntityState};

use crate::commands::{self, Direction};
use crate::ids::{SourceId, ZoneId};
use crate::protocol;
use crate::sources::SourceTable;
use crate::status::{parse_zone_status, ZoneStatus};
use crate::volume;

/// Platform name reported in [`EntityInfo`].
pub const PLATFORM: &str = "nuvo";

/// A single Nuvo Essentia zone.
///
/// Constructed via [`NuvoBuilder`](crate::builder::NuvoBuilder) or
/// [`NuvoZone::new`] with a bridge shared between zones.
pub struct NuvoZone {
    zone: ZoneId,
    info: EntityInfo,
    bridge: SharedBridge,
    sources: Arc<SourceTable>,
    state: EntityState,
    available: bool,
    /// Normalized loudness.
    volume: Option<f64>,
    muted: Option<bool>,
    source: Option<String>,
    snapshot: Option<ZoneStatus>,
    event_tx: broadcast::Sender<EntityEvent>,
}

impl NuvoZone {
    pub fn new(
        zone: ZoneId,
        name: impl Into<String>,
        bridge: SharedBridge,
        sources: Arc<SourceTable>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        NuvoZone {
            zone,
            info: EntityInfo::new(name, EntityKind::MediaPlayer, PLATFORM),
            bridge,
            sources,
            state: EntityState::Unknown,
            available: true,
            volume: None,
            muted: None,
            source: None,
            snapshot: None,
            event_tx,
        }
    }

    pub fn zone_id(&self) -> ZoneId {
        self.zone
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Status stored by the last [`snapshot`](NuvoZone::snapshot).
    pub fn snapshot_status(&self) -> Option<&ZoneStatus> {
        self.snapshot.as_ref()
    }

    /// Poll the zone and remember its status for a later
    /// [`restore`](NuvoZone::restore).
    ///
    /// The entity's cached state is not changed.
    pub async fn snapshot(&mut self) -> Result<()> {
        let status = self.poll().await?;
        debug!(zone = %self.zone, ?status, "Nuvo zone snapshot taken");
        self.snapshot = Some(status);
        Ok(())
    }

    /// Re-issue the commands that bring the zone back to the snapshot.
    ///
    /// An "off" snapshot only powers the zone off. An "on" snapshot powers
    /// on, selects the source, sets the volume when the zone was not muted,
    /// and toggles mute if the snapshot's mute differs from the current one.
    /// Without a snapshot this does nothing.
    pub async fn restore(&mut self) -> Result<()> {
        let Some(snapshot) = self.snapshot else {
            debug!(zone = %self.zone, "No snapshot to restore");
            return Ok(());
        };

        if !snapshot.power {
            self.send(commands::cmd_power_off(self.zone)).await?;
            return self.update().await;
        }

        self.send(commands::cmd_power_on(self.zone)).await?;

        let source = snapshot
            .source
            .and_then(|raw| u8::try_from(raw).ok())
            .and_then(|raw| SourceId::new(raw).ok());
        if let Some(source) = source {
            self.send(commands::cmd_select_source(self.zone, source))
                .await?;
        }

        // A muted zone reports no real volume.
        if let (Some(level), Some(false)) = (snapshot.volume, snapshot.mute) {
            self.send(commands::cmd_set_volume(self.zone, level)).await?;
        }

        if let (Some(wanted), Some(current)) = (snapshot.mute, self.muted) {
            if wanted != current {
                self.send(commands::cmd_mute(self.zone)).await?;
            }
        }

        self.update().await
    }

    /// Send a command and return the bridge's reply text.
    async fn exchange(&self, command: Vec<u8>) -> Result<String> {
        let hex_command = protocol::to_hex(&command);
        let mut bridge = self.bridge.lock().await;
        bridge.send_and_receive(&hex_command).await
    }

    /// Send a command whose reply is only logged.
    async fn send(&self, command: Vec<u8>) -> Result<()> {
        let reply = self.exchange(command).await?;
        trace!(zone = %self.zone, reply = ?reply, "Nuvo command acknowledged");
        Ok(())
    }

    /// Query and parse the zone's status.
    async fn poll(&self) -> Result<ZoneStatus> {
        let reply = self
            .exchange(commands::cmd_status_query(self.zone))
            .await
            .map_err(|e| {
                warn!(zone = %self.zone, error = %e, "Nuvo status query failed");
                e
            })?;

        parse_zone_status(self.zone, Some(&reply))
            .into_status()?
            .ok_or_else(|| {
                warn!(zone = %self.zone, reply = ?reply, "Unrecognized Nuvo status reply");
                Error::Unavailable(format!("no status for zone {}", self.zone))
            })
    }

    fn apply(&mut self, status: ZoneStatus) {
        let state = EntityState::from_power(status.power);
        if state != self.state {
            self.state = state;
            self.emit(EntityEvent::StateChanged {
                entity: self.info.name.clone(),
                state,
            });
        }

        // While off the amplifier reports nothing else; keep the last values.
        if !status.power {
            return;
        }

        let level = status.volume.map(volume::to_normalized);
        if level != self.volume {
            self.volume = level;
            if let Some(level) = level {
                self.emit(EntityEvent::VolumeChanged {
                    entity: self.info.name.clone(),
                    level,
                });
            }
        }

        if status.mute != self.muted {
            self.muted = status.mute;
            if let Some(muted) = status.mute {
                self.emit(EntityEvent::MuteChanged {
                    entity: self.info.name.clone(),
                    muted,
                });
            }
        }

        let source = status
            .source
            .and_then(|raw| self.sources.name_for_raw(raw))
            .map(str::to_string);
        if source != self.source {
            self.source = source.clone();
            self.emit(EntityEvent::SourceChanged {
                entity: self.info.name.clone(),
                source,
            });
        }
    }

    fn set_available(&mut self, available: bool) {
        if available != self.available {
            self.available = available;
            self.emit(EntityEvent::AvailabilityChanged {
                entity: self.info.name.clone(),
                available,
            });
        }
    }

    fn emit(&self, event: EntityEvent) {
        let _ = self.event_tx.send(event);
    }
}

impl std::fmt::Debug for NuvoZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NuvoZone")
            .field("zone", &self.zone)
            .field("name", &self.info.name)
            .field("state", &self.state)
            .field("available", &self.available)
            .field("volume", &self.volume)
            .field("muted", &self.muted)
            .field("source", &self.source)
            .finish()
    }
}

#[async_trait]
impl Entity for NuvoZone {
    fn info(&self) -> &EntityInfo {
        &self.info
    }

    fn state(&self) -> EntityState {
        self.state
    }

    fn available(&self) -> bool {
        self.available
    }

    async fn update(&mut self) -> Result<()> {
        match self.poll().await {
            Ok(status) => {
                debug!(zone = %self.zone, ?status, "Nuvo zone updated");
                self.apply(status);
                self.set_available(true);
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    zone = %self.zone,
                    error = %e,
                    "Unable to update state for Nuvo zone"
                );
                self.set_available(false);
                Err(e)
            }
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<EntityEvent> {
        self.event_tx.subscribe()
    }
}

#[async_trait]
impl MediaPlayer for NuvoZone {
    async fn turn_on(&mut self) -> Result<()> {
        self.send(commands::cmd_power_on(self.zone)).await
    }

    async fn turn_off(&mut self) -> Result<()> {
        self.send(commands::cmd_power_off(self.zone)).await
    }

    async fn select_source(&mut self, source: &str) -> Result<()> {
        let Some(id) = self.sources.id_for(source) else {
            debug!(zone = %self.zone, source, "Ignoring unknown source");
            return Ok(());
        };
        self.send(commands::cmd_select_source(self.zone, id)).await
    }

    async fn set_volume_level(&mut self, level: f64) -> Result<()> {
        let device_level = volume::to_device(level)?;
        self.send(commands::cmd_set_volume(self.zone, device_level))
            .await
    }

    async fn mute_volume(&mut self, mute: bool) -> Result<()> {
        // The amplifier only has a toggle.
        debug!(zone = %self.zone, mute, "Sending Nuvo mute toggle");
        self.send(commands::cmd_mute(self.zone)).await
    }

    async fn volume_up(&mut self) -> Result<()> {
        if self.volume.is_none() {
            return Ok(());
        }
        self.send(commands::cmd_volume_step(self.zone, Direction::Up))
            .await
    }

    async fn volume_down(&mut self) -> Result<()> {
        if self.volume.is_none() {
            return Ok(());
        }
        self.send(commands::cmd_volume_step(self.zone, Direction::Down))
            .await
    }

    fn volume_level(&self) -> Option<f64> {
        self.volume
    }

    fn is_volume_muted(&self) -> Option<bool> {
        self.muted
    }

    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn source_list(&self) -> &[String] {
        self.sources.ordered_names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homelink_test_harness::MockBridge;

    fn sources() -> Arc<SourceTable> {
        Arc::new(SourceTable::new([
            (SourceId::new(1).unwrap(), "Sonos"),
            (SourceId::new(2).unwrap(), "TV"),
        ]))
    }

    fn make_zone(id: u8, bridge: &MockBridge) -> NuvoZone {
        NuvoZone::new(ZoneId::new(id).unwrap(), "Kitchen", bridge.shared(), sources())
    }

    #[tokio::test]
    async fn properties_before_first_update() {
        let bridge = MockBridge::new();
        let zone = make_zone(1, &bridge);

        assert_eq!(zone.state(), EntityState::Unknown);
        assert!(zone.available());
        assert_eq!(zone.volume_level(), None);
        assert_eq!(zone.is_volume_muted(), None);
        assert_eq!(zone.source(), None);
        assert_eq!(zone.media_title(), None);
        assert_eq!(zone.source_list(), &["Sonos", "TV"]);
        assert_eq!(zone.info().kind, EntityKind::MediaPlayer);
    }

    #[tokio::test]
    async fn update_on_reads_volume_source_and_mute() {
        let bridge = MockBridge::new();
        bridge.expect_command("*Z3STATUS?\r", "#Z3,ON,SRC2,VOL40,DND0,LOCK0\r\n");
        let mut zone = make_zone(3, &bridge);

        zone.update().await.unwrap();

        assert_eq!(zone.state(), EntityState::On);
        assert_eq!(zone.volume_level(), Some(0.5));
        assert_eq!(zone.is_volume_muted(), Some(false));
        assert_eq!(zone.source(), Some("TV"));
        assert_eq!(zone.media_title(), Some("TV"));
        assert!(zone.available());
    }

    #[tokio::test]
    async fn update_muted_zone() {
        let bridge = MockBridge::new();
        bridge.expect_command("*Z1STATUS?\r", "#Z1,ON,SRC1,MUTE\r\n");
        let mut zone = make_zone(1, &bridge);

        zone.update().await.unwrap();

        assert_eq!(zone.is_volume_muted(), Some(true));
        assert_eq!(zone.volume_level(), Some(1.0));
        assert_eq!(zone.source(), Some("Sonos"));
    }

    #[tokio::test]
    async fn unconfigured_source_reads_as_none() {
        let bridge = MockBridge::new();
        bridge.expect_command("*Z1STATUS?\r", "#Z1,ON,SRC6,VOL10\r\n");
        let mut zone = make_zone(1, &bridge);

        zone.update().await.unwrap();
        assert_eq!(zone.state(), EntityState::On);
        assert_eq!(zone.source(), None);
    }

    #[tokio::test]
    async fn off_keeps_last_known_details() {
        let bridge = MockBridge::new();
        bridge.expect_command("*Z2STATUS?\r", "#Z2,ON,SRC1,VOL0\r\n");
        bridge.expect_command("*Z2STATUS?\r", "#Z2,OFF\r\n");
        let mut zone = make_zone(2, &bridge);

        zone.update().await.unwrap();
        zone.update().await.unwrap();

        assert_eq!(zone.state(), EntityState::Off);
        assert_eq!(zone.volume_level(), Some(1.0));
        assert_eq!(zone.source(), Some("Sonos"));
    }

    #[tokio::test]
    async fn transport_failure_marks_unavailable_and_keeps_state() {
        let bridge = MockBridge::new();
        bridge.expect_command("*Z1STATUS?\r", "#Z1,ON,SRC1,VOL20\r\n");
        bridge.expect_timeout_for("*Z1STATUS?\r");
        let mut zone = make_zone(1, &bridge);

        zone.update().await.unwrap();
        let result = zone.update().await;

        assert!(matches!(result, Err(Error::Timeout)));
        assert!(!zone.available());
        assert_eq!(zone.state(), EntityState::On);
        assert_eq!(zone.volume_level(), Some(0.75));
    }

    #[tokio::test]
    async fn garbage_reply_is_unavailable_not_off() {
        let bridge = MockBridge::new();
        bridge.expect_command("*Z1STATUS?\r", "garbage");
        let mut zone = make_zone(1, &bridge);

        let result = zone.update().await;
        assert!(matches!(result, Err(Error::Unavailable(_))));
        assert!(!zone.available());
        assert_eq!(zone.state(), EntityState::Unknown);
    }

    #[tokio::test]
    async fn missing_source_is_protocol_error() {
        let bridge = MockBridge::new();
        bridge.expect_command("*Z1STATUS?\r", "#Z1,ON,VOL20\r\n");
        let mut zone = make_zone(1, &bridge);

        let result = zone.update().await;
        assert!(matches!(result, Err(Error::Protocol(_))));
        assert!(!zone.available());
    }

    #[tokio::test]
    async fn recovers_availability() {
        let bridge = MockBridge::new();
        bridge.expect_failure_for("*Z1STATUS?\r", "connection refused");
        bridge.expect_command("*Z1STATUS?\r", "#Z1,OFF\r\n");
        let mut zone = make_zone(1, &bridge);
        let mut events = zone.subscribe();

        assert!(zone.update().await.is_err());
        zone.update().await.unwrap();
        assert!(zone.available());

        assert_eq!(
            events.try_recv().unwrap(),
            EntityEvent::AvailabilityChanged {
                entity: "Kitchen".into(),
                available: false
            }
        );
        assert_eq!(
            events.try_recv().unwrap(),
            EntityEvent::StateChanged {
                entity: "Kitchen".into(),
                state: EntityState::Off
            }
        );
        assert_eq!(
            events.try_recv().unwrap(),
            EntityEvent::AvailabilityChanged {
                entity: "Kitchen".into(),
                available: true
            }
        );
    }

    #[tokio::test]
    async fn commands_send_expected_bytes() {
        let bridge = MockBridge::new();
        bridge.expect_command("*Z4ON\r", "#Z4,ON\r\n");
        bridge.expect_command("*Z4SRC2\r", "#Z4,ON,SRC2\r\n");
        bridge.expect_command("*Z4VOL20\r", "#Z4,ON,VOL20\r\n");
        bridge.expect_command("*Z4OFF\r", "#Z4,OFF\r\n");
        let mut zone = make_zone(4, &bridge);

        zone.turn_on().await.unwrap();
        zone.select_source("TV").await.unwrap();
        zone.set_volume_level(0.75).await.unwrap();
        zone.turn_off().await.unwrap();

        assert_eq!(
            bridge.sent_commands(),
            vec!["*Z4ON\r", "*Z4SRC2\r", "*Z4VOL20\r", "*Z4OFF\r"]
        );
        assert_eq!(bridge.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn unknown_source_sends_nothing() {
        let bridge = MockBridge::new();
        let mut zone = make_zone(1, &bridge);

        zone.select_source("Turntable").await.unwrap();
        assert!(bridge.sent_hex().is_empty());
    }

    #[tokio::test]
    async fn non_finite_volume_rejected_without_sending() {
        let bridge = MockBridge::new();
        let mut zone = make_zone(1, &bridge);

        let result = zone.set_volume_level(f64::NAN).await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
        assert!(bridge.sent_hex().is_empty());
    }

    #[tokio::test]
    async fn mute_and_unmute_both_toggle() {
        let bridge = MockBridge::new();
        bridge.expect_command("*Z2MUTE\r", "");
        bridge.expect_command("*Z2MUTE\r", "");
        let mut zone = make_zone(2, &bridge);

        zone.mute_volume(true).await.unwrap();
        zone.mute_volume(false).await.unwrap();

        assert_eq!(bridge.sent_commands(), vec!["*Z2MUTE\r", "*Z2MUTE\r"]);
    }

    #[tokio::test]
    async fn volume_steps_need_known_volume() {
        let bridge = MockBridge::new();
        let mut zone = make_zone(1, &bridge);

        zone.volume_up().await.unwrap();
        zone.volume_down().await.unwrap();
        assert!(bridge.sent_hex().is_empty());

        bridge.expect_command("*Z1STATUS?\r", "#Z1,ON,SRC1,VOL30\r\n");
        bridge.expect_command("*Z1VOL+\r", "");
        bridge.expect_command("*Z1VOL-\r", "");
        zone.update().await.unwrap();
        zone.volume_up().await.unwrap();
        zone.volume_down().await.unwrap();

        assert_eq!(
            bridge.sent_commands(),
            vec!["*Z1STATUS?\r", "*Z1VOL+\r", "*Z1VOL-\r"]
        );
    }

    #[tokio::test]
    async fn command_failure_propagates() {
        let bridge = MockBridge::new();
        bridge.expect_timeout_for("*Z1ON\r");
        let mut zone = make_zone(1, &bridge);

        assert!(matches!(zone.turn_on().await, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn snapshot_and_restore_on_state() {
        let bridge = MockBridge::new();
        bridge.expect_command("*Z1STATUS?\r", "#Z1,ON,SRC2,VOL30\r\n");
        let mut zone = make_zone(1, &bridge);

        zone.snapshot().await.unwrap();
        assert_eq!(
            zone.snapshot_status(),
            Some(&ZoneStatus {
                power: true,
                volume: Some(30),
                source: Some(2),
                mute: Some(false),
            })
        );
        // Snapshot leaves the cached state alone.
        assert_eq!(zone.state(), EntityState::Unknown);

        bridge.expect_command("*Z1STATUS?\r", "#Z1,ON,SRC1,MUTE\r\n");
        zone.update().await.unwrap();

        bridge.expect_command("*Z1ON\r", "");
        bridge.expect_command("*Z1SRC2\r", "");
        bridge.expect_command("*Z1VOL30\r", "");
        bridge.expect_command("*Z1MUTE\r", "");
        bridge.expect_command("*Z1STATUS?\r", "#Z1,ON,SRC2,VOL30\r\n");
        zone.restore().await.unwrap();

        assert_eq!(bridge.remaining_expectations(), 0);
        assert_eq!(zone.source(), Some("TV"));
        assert_eq!(zone.is_volume_muted(), Some(false));
    }

    #[tokio::test]
    async fn restore_off_snapshot_only_powers_off() {
        let bridge = MockBridge::new();
        bridge.expect_command("*Z5STATUS?\r", "#Z5,OFF\r\n");
        bridge.expect_command("*Z5OFF\r", "");
        bridge.expect_command("*Z5STATUS?\r", "#Z5,OFF\r\n");
        let mut zone = make_zone(5, &bridge);

        zone.snapshot().await.unwrap();
        zone.restore().await.unwrap();

        assert_eq!(
            bridge.sent_commands(),
            vec!["*Z5STATUS?\r", "*Z5OFF\r", "*Z5STATUS?\r"]
        );
        assert_eq!(zone.state(), EntityState::Off);
    }

    #[tokio::test]
    async fn restore_without_snapshot_is_noop() {
        let bridge = MockBridge::new();
        let mut zone = make_zone(1, &bridge);

        zone.restore().await.unwrap();
        assert!(bridge.sent_hex().is_empty());
    }

    #[tokio::test]
    async fn failed_snapshot_keeps_previous() {
        let bridge = MockBridge::new();
        bridge.expect_command("*Z1STATUS?\r", "#Z1,OFF\r\n");
        bridge.expect_timeout_for("*Z1STATUS?\r");
        let mut zone = make_zone(1, &bridge);

        zone.snapshot().await.unwrap();
        assert!(zone.snapshot().await.is_err());
        assert_eq!(zone.snapshot_status(), Some(&ZoneStatus::off()));
    }

    #[tokio::test]
    async fn zones_share_one_bridge() {
        let bridge = MockBridge::new();
        bridge.expect_command("*Z1STATUS?\r", "#Z1,OFF\r\n");
        bridge.expect_command("*Z2STATUS?\r", "#Z2,ON,SRC1,VOL80\r\n");

        let shared = bridge.shared();
        let mut one = NuvoZone::new(ZoneId::new(1).unwrap(), "One", shared.clone(), sources());
        let mut two = NuvoZone::new(ZoneId::new(2).unwrap(), "Two", shared, sources());

        one.update().await.unwrap();
        two.update().await.unwrap();

        assert_eq!(one.state(), EntityState::Off);
        assert_eq!(two.volume_level(), Some(0.0));
    }
}
