//! HaiSwitch -- an on/off load on an HAI panel.
//!
//! Switches are addressed through the light endpoint; the panel treats
//! them as lights that only know on and off.

use async_trait::async_trait;
use reqwest::StatusCode;
use tokio::sync::broadcast;
use tracing::warn;

use homelink_core::entity::{Entity, Switch};
use homelink_core::error::{Error, Result};
use homelink_core::events::EntityEvent;
use homelink_core::types::{EntityInfo, EntityKind, EntityState};

use crate::base::EntityBase;
use crate::client::{HaiClient, LightCommand};

#[derive(Debug)]
pub struct HaiSwitch {
    base: EntityBase,
    client: HaiClient,
}

impl HaiSwitch {
    pub fn new(client: HaiClient, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            base: EntityBase::new(id, name, EntityKind::Switch),
            client,
        }
    }

    pub fn id(&self) -> &str {
        &self.base.id
    }

    async fn set_power(&mut self, on: bool) -> Result<()> {
        let command = LightCommand {
            is_on: on,
            brightness_level: None,
        };
        let status = self.client.put_light(&self.base.id, &command).await?;
        if status != StatusCode::ACCEPTED {
            warn!(switch = %self.base.info.name, %status, "HAI switch command rejected");
            return Err(Error::Transport(format!(
                "switch {} command rejected with {status}",
                self.base.id
            )));
        }
        self.base.set_state(EntityState::from_power(on));
        Ok(())
    }
}

#[async_trait]
impl Entity for HaiSwitch {
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
        match self.client.get_light(&self.base.id).await {
            Ok(report) => {
                self.base.set_state(EntityState::from_power(report.is_on));
                self.base.set_available(true);
                Ok(())
            }
            Err(e) => {
                warn!(switch = %self.base.info.name, error = %e, "HAI switch update failed");
                self.base.set_available(false);
                Err(e)
            }
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<EntityEvent> {
        self.base.subscribe()
    }
}

#[async_trait]
impl Switch for HaiSwitch {
    async fn turn_on(&mut self) -> Result<()> {
        self.set_power(true).await
    }

    async fn turn_off(&mut self) -> Result<()> {
        self.set_power(false).await
    }
}
