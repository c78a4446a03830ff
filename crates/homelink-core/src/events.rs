//! Entity event types.
//!
//! Events are emitted by entities through a [`tokio::sync::broadcast`] channel
//! when a polled or commanded value changes. Hosts that want push-style
//! updates subscribe instead of diffing properties after every poll.

use crate::types::EntityState;

/// An event emitted by an entity when its observable state changes.
///
/// Delivery is best-effort through a bounded broadcast channel; slow
/// consumers may miss events.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityEvent {
    /// The on/off state changed.
    StateChanged {
        /// Entity display name.
        entity: String,
        /// New state.
        state: EntityState,
    },

    /// The normalized volume level changed.
    VolumeChanged {
        entity: String,
        /// Loudness in 0.0 (silent) ..= 1.0 (loudest).
        level: f64,
    },

    /// The mute flag changed.
    MuteChanged { entity: String, muted: bool },

    /// The selected source changed. `None` when the device reports a source
    /// that is not in the configured table.
    SourceChanged {
        entity: String,
        source: Option<String>,
    },

    /// Light brightness changed (0 ..= 255).
    BrightnessChanged { entity: String, brightness: u8 },

    /// The entity became available or unavailable.
    AvailabilityChanged { entity: String, available: bool },
}

impl EntityEvent {
    /// Name of the entity the event belongs to.
    pub fn entity(&self) -> &str {
        match self {
            EntityEvent::StateChanged { entity, .. }
            | EntityEvent::VolumeChanged { entity, .. }
            | EntityEvent::MuteChanged { entity, .. }
            | EntityEvent::SourceChanged { entity, .. }
            | EntityEvent::BrightnessChanged { entity, .. }
            | EntityEvent::AvailabilityChanged { entity, .. } => entity,
        }
    }
}
