//! HaiLight -- a dimmable HAI light.
//!
//! The panel reports dim levels offset by 100 (`101..=200` for 1..=100 %),
//! `1` for full brightness and `0` for off. Commands take a plain
//! percentage.

use async_trait::async_trait;
use reqwest::StatusCode;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use homelink_core::entity::{Entity, Light, Switch};
use homelink_core::error::{Error, Result};
use homelink_core::events::EntityEvent;
use homelink_core::types::{EntityInfo, EntityKind, EntityState};

use crate::base::EntityBase;
use crate::client::{HaiClient, LightCommand};

/// Host brightness for a reported panel level, or `None` when the level
/// carries no brightness information.
pub fn brightness_from_level(level: i64) -> Option<u8> {
    match level {
        l if l > 100 => Some(((l.min(200) - 100) * 255 / 100) as u8),
        1 => Some(255),
        0 => Some(0),
        _ => None,
    }
}

/// Panel percentage for a host brightness (0 ..= 255), truncated.
pub fn level_from_brightness(brightness: u8) -> u8 {
    (u16::from(brightness) * 100 / 255) as u8
}

/// A dimmable light on an HAI panel.
#[derive(Debug)]
pub struct HaiLight {
    base: EntityBase,
    client: HaiClient,
    brightness: u8,
}

impl HaiLight {
    pub fn new(client: HaiClient, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            base: EntityBase::new(id, name, EntityKind::Light),
            client,
            brightness: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.base.id
    }

    async fn send(&self, command: LightCommand) -> Result<()> {
        let status = self.client.put_light(&self.base.id, &command).await?;
        if status != StatusCode::ACCEPTED {
            warn!(light = %self.base.info.name, %status, "HAI light command rejected");
            return Err(Error::Transport(format!(
                "light {} command rejected with {status}",
                self.base.id
            )));
        }
        Ok(())
    }

    fn set_brightness(&mut self, brightness: u8) {
        if brightness != self.brightness {
            self.brightness = brightness;
            self.base.emit(EntityEvent::BrightnessChanged {
                entity: self.base.info.name.clone(),
                brightness,
            });
        }
    }
}

#[async_trait]
impl Entity for HaiLight {
    fn info(&self) -> &EntityInfo {
        &self.base.info
    }

    fn state(&self) -> EntityState {
        self.base.state
    }

    fn available(&self) -> bool {
        self.base.available
    }

    async fn update(&mut self) -> Result<()> {
        let report = match self.client.get_light(&self.base.id).await {
            Ok(report) => report,
            Err(e) => {
                warn!(light = %self.base.info.name, error = %e, "HAI light update failed");
                self.base.set_available(false);
                return Err(e);
            }
        };
        debug!(light = %self.base.info.name, ?report, "HAI light report");

        self.base.set_state(EntityState::from_power(report.is_on));
        if let Some(brightness) = report.level().and_then(brightness_from_level) {
            self.set_brightness(brightness);
        }
        self.base.set_available(true);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<EntityEvent> {
        self.base.subscribe()
    }
}

#[async_trait]
impl Switch for HaiLight {
    async fn turn_on(&mut self) -> Result<()> {
        self.send(LightCommand {
            is_on: true,
            brightness_level: None,
        })
        .await?;
        self.base.set_state(EntityState::On);
        Ok(())
    }

    async fn turn_off(&mut self) -> Result<()> {
        self.send(LightCommand {
            is_on: false,
            brightness_level: None,
        })
        .await?;
        self.base.set_state(EntityState::Off);
        Ok(())
    }
}

#[async_trait]
impl Light for HaiLight {
    async fn turn_on_with_brightness(&mut self, brightness: u8) -> Result<()> {
        self.send(LightCommand {
            is_on: true,
            brightness_level: Some(level_from_brightness(brightness)),
        })
        .await?;
        self.set_brightness(brightness);
        self.base.set_state(EntityState::On);
        Ok(())
    }

    fn brightness(&self) -> u8 {
        self.brightness
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HaiConfig;
    use homelink_test_harness::MockHttpServer;

    async fn panel(responses: &[(u16, &str)]) -> (MockHttpServer, HaiClient) {
        let mut server = MockHttpServer::new().await.unwrap();
        for (status, body) in responses {
            server.respond(*status, body);
        }
        server.start();
        let client = HaiClient::new(HaiConfig::new(server.addr()).with_scheme("http")).unwrap();
        (server, client)
    }

    #[test]
    fn level_mapping() {
        assert_eq!(brightness_from_level(150), Some(127));
        assert_eq!(brightness_from_level(200), Some(255));
        assert_eq!(brightness_from_level(101), Some(2));
        assert_eq!(brightness_from_level(1), Some(255));
        assert_eq!(brightness_from_level(0), Some(0));
        assert_eq!(brightness_from_level(50), None);
        assert_eq!(brightness_from_level(100), None);
        assert_eq!(brightness_from_level(900), Some(255));
    }

    #[test]
    fn out_of_range_levels_saturate() {
        assert_eq!(brightness_from_level(i64::MAX), Some(255));
        assert_eq!(brightness_from_level(i64::MAX / 255 + 101), Some(255));
        assert_eq!(brightness_from_level(i64::MIN), None);
    }

    #[test]
    fn brightness_to_percent() {
        assert_eq!(level_from_brightness(255), 100);
        assert_eq!(level_from_brightness(128), 50);
        assert_eq!(level_from_brightness(0), 0);
    }

    #[tokio::test]
    async fn update_reads_state_and_brightness() {
        let (_server, client) = panel(&[
            (200, r#"{"is_on":true,"brightness_level":150}"#),
            (200, r#"{"is_on":true,"brightness_level":"001"}"#),
            (200, r#"{"is_on":true,"brightness_level":42}"#),
        ])
        .await;
        let mut light = HaiLight::new(client, "12", "Porch");

        light.update().await.unwrap();
        assert_eq!(light.is_on(), Some(true));
        assert_eq!(light.brightness(), 127);

        light.update().await.unwrap();
        assert_eq!(light.brightness(), 255);

        // Unrecognized level keeps the last brightness.
        light.update().await.unwrap();
        assert_eq!(light.brightness(), 255);
    }

    #[tokio::test]
    async fn turn_on_with_brightness_sends_percentage() {
        let (server, client) = panel(&[(202, "")]).await;
        let mut light = HaiLight::new(client, "12", "Porch");

        light.turn_on_with_brightness(128).await.unwrap();

        assert_eq!(light.state(), EntityState::On);
        assert_eq!(light.brightness(), 128);
        let requests = server.requests();
        assert_eq!(requests[0].method, "PUT");
        assert_eq!(requests[0].path, "/api/light/12");
        assert_eq!(requests[0].body, r#"{"is_on":true,"brightness_level":50}"#);
    }

    #[tokio::test]
    async fn rejected_command_keeps_state_and_brightness() {
        let (_server, client) = panel(&[(500, ""), (500, "")]).await;
        let mut light = HaiLight::new(client, "12", "Porch");

        assert!(light.turn_on_with_brightness(200).await.is_err());
        assert_eq!(light.brightness(), 0);
        assert_eq!(light.state(), EntityState::Unknown);

        assert!(light.turn_off().await.is_err());
        assert_eq!(light.state(), EntityState::Unknown);
    }

    #[tokio::test]
    async fn turn_on_and_off_plain() {
        let (server, client) = panel(&[(202, ""), (202, "")]).await;
        let mut light = HaiLight::new(client, "7", "Hall");

        light.turn_on().await.unwrap();
        assert_eq!(light.state(), EntityState::On);
        light.turn_off().await.unwrap();
        assert_eq!(light.state(), EntityState::Off);

        let bodies: Vec<String> = server.requests().into_iter().map(|r| r.body).collect();
        assert_eq!(bodies, vec![r#"{"is_on":true}"#, r#"{"is_on":false}"#]);
    }

    #[tokio::test]
    async fn failed_update_is_unavailable() {
        let (_server, client) = panel(&[(200, r#"{"is_on":false}"#), (200, "not json")]).await;
        let mut light = HaiLight::new(client, "12", "Porch");

        light.update().await.unwrap();
        assert!(matches!(light.update().await, Err(Error::Protocol(_))));
        assert!(!light.available());
        assert_eq!(light.state(), EntityState::Off);
    }
}
