//! State shared by every HAI entity.

use tokio::sync::broadcast;

use homelink_core::entity::EVENT_CHANNEL_CAPACITY;
use homelink_core::events::EntityEvent;
use homelink_core::types::{EntityInfo, EntityKind, EntityState};

/// Platform name reported in [`EntityInfo`].
pub const PLATFORM: &str = "hai";

#[derive(Debug)]
pub(crate) struct EntityBase {
    pub(crate) id: String,
    pub(crate) info: EntityInfo,
    pub(crate) state: EntityState,
    pub(crate) available: bool,
    event_tx: broadcast::Sender<EntityEvent>,
}

impl EntityBase {
    pub(crate) fn new(id: impl Into<String>, name: impl Into<String>, kind: EntityKind) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            id: id.into(),
            info: EntityInfo::new(name, kind, PLATFORM),
            state: EntityState::Unknown,
            available: true,
            event_tx,
        }
    }

    pub(crate) fn set_state(&mut self, state: EntityState) {
        if state != self.state {
            self.state = state;
            self.emit(EntityEvent::StateChanged {
                entity: self.info.name.clone(),
                state,
            });
        }
    }

    pub(crate) fn set_available(&mut self, available: bool) {
        if available != self.available {
            self.available = available;
            self.emit(EntityEvent::AvailabilityChanged {
                entity: self.info.name.clone(),
                available,
            });
        }
    }

    pub(crate) fn emit(&self, event: EntityEvent) {
        let _ = self.event_tx.send(event);
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<EntityEvent> {
        self.event_tx.subscribe()
    }
}
