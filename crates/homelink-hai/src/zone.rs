//! HaiZone -- a security zone as a binary sensor.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use homelink_core::entity::{BinarySensor, Entity};
use homelink_core::error::Result;
use homelink_core::events::EntityEvent;
use homelink_core::types::{EntityInfo, EntityKind, EntityState};

use crate::base::EntityBase;
use crate::client::HaiClient;

/// Zone status meaning "closed / not triggered".
pub const STATUS_SECURE: &str = "Secure";

/// Zone status meaning "open / triggered".
pub const STATUS_NOT_READY: &str = "Not ready";

/// Sensor state for a reported zone status. Other statuses (bypassed,
/// trouble, ...) carry no open/closed reading.
pub fn state_for_status(status: &str) -> Option<EntityState> {
    match status {
        STATUS_SECURE => Some(EntityState::Off),
        STATUS_NOT_READY => Some(EntityState::On),
        _ => None,
    }
}

#[derive(Debug)]
pub struct HaiZone {
    base: EntityBase,
    client: HaiClient,
    device_class: String,
}

impl HaiZone {
    pub fn new(
        client: HaiClient,
        id: impl Into<String>,
        name: impl Into<String>,
        device_class: impl Into<String>,
    ) -> Self {
        Self {
            base: EntityBase::new(id, name, EntityKind::BinarySensor),
            client,
            device_class: device_class.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.base.id
    }
}

#[async_trait]
impl Entity for HaiZone {
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
        let report = match self.client.get_zone(&self.base.id).await {
            Ok(report) => report,
            Err(e) => {
                warn!(zone = %self.base.info.name, error = %e, "HAI zone update failed");
                self.base.set_available(false);
                return Err(e);
            }
        };

        match state_for_status(&report.zone_status) {
            Some(state) => self.base.set_state(state),
            None => debug!(
                zone = %self.base.info.name,
                status = %report.zone_status,
                "Zone status without open/closed reading"
            ),
        }
        self.base.set_available(true);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<EntityEvent> {
        self.base.subscribe()
    }
}

impl BinarySensor for HaiZone {
    fn device_class(&self) -> &str {
        &self.device_class
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HaiConfig;
    use homelink_core::Error;
    use homelink_test_harness::MockHttpServer;

    #[test]
    fn status_mapping() {
        assert_eq!(state_for_status("Secure"), Some(EntityState::Off));
        assert_eq!(state_for_status("Not ready"), Some(EntityState::On));
        assert_eq!(state_for_status("Bypassed"), None);
    }

    #[tokio::test]
    async fn update_follows_zone_status() {
        let mut server = MockHttpServer::new().await.unwrap();
        server.respond(200, r#"{"zone_status":"Not ready"}"#);
        server.respond(200, r#"{"zone_status":"Trouble"}"#);
        server.respond(200, r#"{"zone_status":"Secure"}"#);
        server.respond(500, "");
        server.start();
        let client = HaiClient::new(HaiConfig::new(server.addr()).with_scheme("http")).unwrap();
        let mut zone = HaiZone::new(client, "3", "Front Door", "door");
        let mut events = zone.subscribe();

        assert_eq!(zone.device_class(), "door");
        assert_eq!(zone.info().kind, EntityKind::BinarySensor);

        zone.update().await.unwrap();
        assert_eq!(zone.is_on(), Some(true));

        zone.update().await.unwrap();
        assert_eq!(zone.is_on(), Some(true));

        zone.update().await.unwrap();
        assert_eq!(zone.is_on(), Some(false));

        assert!(matches!(zone.update().await, Err(Error::Transport(_))));
        assert!(!zone.available());
        assert_eq!(zone.is_on(), Some(false));

        assert_eq!(
            events.try_recv().unwrap(),
            EntityEvent::StateChanged {
                entity: "Front Door".into(),
                state: EntityState::On
            }
        );
        assert_eq!(server.requests()[0].path, "/api/zone/3");
    }
}
