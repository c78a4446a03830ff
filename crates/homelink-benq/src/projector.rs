//! BenqProjector -- a BenQ projector as a switch entity.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use homelink_core::entity::{Entity, Switch, EVENT_CHANNEL_CAPACITY};
use homelink_core::error::{Error, Result};
use homelink_core::events::EntityEvent;
use homelink_core::transport::SharedBridge;
use homelink_core::types::{EntityInfo, EntityKind, EntityState};

use crate::protocol::{self, Query, UNKNOWN};

/// Platform name reported in [`EntityInfo`].
pub const PLATFORM: &str = "benq";

/// Extra readings refreshed on every update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectorAttributes {
    pub lamp_hours: String,
    pub input_source: String,
    pub lamp_mode: String,
}

impl Default for ProjectorAttributes {
    fn default() -> Self {
        Self {
            lamp_hours: UNKNOWN.to_string(),
            input_source: UNKNOWN.to_string(),
            lamp_mode: UNKNOWN.to_string(),
        }
    }
}

impl ProjectorAttributes {
    /// `(label, value)` pairs in display order.
    pub fn entries(&self) -> [(&'static str, &str); 3] {
        [
            (Query::LampHours.label(), self.lamp_hours.as_str()),
            (Query::InputSource.label(), self.input_source.as_str()),
            (Query::LampMode.label(), self.lamp_mode.as_str()),
        ]
    }
}

/// A BenQ projector behind a serial-to-IP bridge.
///
/// Constructed via [`BenqBuilder`](crate::builder::BenqBuilder). The
/// projector is unavailable until its first successful power query.
pub struct BenqProjector {
    info: EntityInfo,
    bridge: SharedBridge,
    state: EntityState,
    available: bool,
    attributes: ProjectorAttributes,
    attribute_delay: Duration,
    event_tx: broadcast::Sender<EntityEvent>,
}

impl BenqProjector {
    pub fn new(name: impl Into<String>, bridge: SharedBridge, attribute_delay: Duration) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        BenqProjector {
            info: EntityInfo::new(name, EntityKind::Switch, PLATFORM),
            bridge,
            state: EntityState::Unknown,
            available: false,
            attributes: ProjectorAttributes::default(),
            attribute_delay,
            event_tx,
        }
    }

    pub fn attributes(&self) -> &ProjectorAttributes {
        &self.attributes
    }

    /// Ask the projector for its model name.
    pub async fn model_name(&self) -> Result<String> {
        let reply = self.write_read(protocol::cmd_query(Query::ModelName)).await?;
        Ok(protocol::answer_or_unknown(&reply))
    }

    async fn write_read(&self, command: Vec<u8>) -> Result<String> {
        let hex_command = hex::encode(&command);
        let mut bridge = self.bridge.lock().await;
        bridge.send_and_receive(&hex_command).await.map_err(|e| {
            error!(projector = %self.info.name, error = %e, "Problem communicating with projector");
            e
        })
    }

    /// Query one attribute; any failure reads as `unknown`.
    async fn read_attribute(&self, query: Query) -> String {
        match self.write_read(protocol::cmd_query(query)).await {
            Ok(reply) => protocol::answer_or_unknown(&reply),
            Err(_) => UNKNOWN.to_string(),
        }
    }

    async fn refresh_attributes(&mut self) {
        let queries = [Query::LampHours, Query::InputSource, Query::LampMode];
        for (i, query) in queries.into_iter().enumerate() {
            if i > 0 && !self.attribute_delay.is_zero() {
                tokio::time::sleep(self.attribute_delay).await;
            }
            let value = self.read_attribute(query).await;
            debug!(projector = %self.info.name, attribute = query.label(), value = %value, "Projector attribute");
            match query {
                Query::LampHours => self.attributes.lamp_hours = value,
                Query::InputSource => self.attributes.input_source = value,
                Query::LampMode => self.attributes.lamp_mode = value,
                Query::Power | Query::ModelName => {}
            }
        }
    }

    fn set_state(&mut self, state: EntityState) {
        if state != self.state {
            self.state = state;
            let _ = self.event_tx.send(EntityEvent::StateChanged {
                entity: self.info.name.clone(),
                state,
            });
        }
    }

    fn set_available(&mut self, available: bool) {
        if available != self.available {
            self.available = available;
            let _ = self.event_tx.send(EntityEvent::AvailabilityChanged {
                entity: self.info.name.clone(),
                available,
            });
        }
    }
}

impl std::fmt::Debug for BenqProjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BenqProjector")
            .field("name", &self.info.name)
            .field("state", &self.state)
            .field("available", &self.available)
            .field("attributes", &self.attributes)
            .finish()
    }
}

#[async_trait]
impl Entity for BenqProjector {
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
        let reply = match self.write_read(protocol::cmd_query(Query::Power)).await {
            Ok(reply) => reply,
            Err(e) => {
                self.set_available(false);
                return Err(e);
            }
        };

        let answer = protocol::answer_or_unknown(&reply);
        info!(projector = %self.info.name, power = %answer, "Projector power state");
        let result = match answer.as_str() {
            "ON" => {
                self.set_state(EntityState::On);
                Ok(())
            }
            "OFF" => {
                self.set_state(EntityState::Off);
                Ok(())
            }
            _ => {
                warn!(projector = %self.info.name, reply = ?reply, "Unexpected power answer");
                Err(Error::Unavailable(format!(
                    "projector power answer {answer:?}"
                )))
            }
        };
        self.set_available(result.is_ok());

        // Attributes are read even when the power answer was not understood.
        self.refresh_attributes().await;
        result
    }

    fn subscribe(&self) -> broadcast::Receiver<EntityEvent> {
        self.event_tx.subscribe()
    }
}

#[async_trait]
impl Switch for BenqProjector {
    async fn turn_on(&mut self) -> Result<()> {
        self.write_read(protocol::cmd_power_on()).await?;
        self.set_state(EntityState::On);
        Ok(())
    }

    async fn turn_off(&mut self) -> Result<()> {
        self.write_read(protocol::cmd_power_off()).await?;
        self.set_state(EntityState::Off);
        Ok(())
    }
}
