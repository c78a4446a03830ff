//! Host-facing entity traits.
//!
//! These traits are the surface a home-automation host programs against.
//! The host calls [`Entity::update`] on a fixed schedule, reads properties
//! after each update, and calls command methods in response to user or
//! automation requests.
//!
//! Property getters never fail. Before the first successful update they
//! return [`EntityState::Unknown`] or `None`.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::Result;
use crate::events::EntityEvent;
use crate::types::{EntityInfo, EntityState};

/// Capacity of the per-entity event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Common behaviour of every entity.
#[async_trait]
pub trait Entity: Send + Sync {
    /// Static information (name, kind, platform).
    fn info(&self) -> &EntityInfo;

    /// Last known on/off state.
    fn state(&self) -> EntityState;

    /// Whether the last update reached the device and understood its reply.
    ///
    /// An unavailable entity keeps its last known state; hosts should grey
    /// it out rather than show it as off.
    fn available(&self) -> bool;

    /// Poll the device and refresh cached state.
    ///
    /// On failure the entity is marked unavailable, cached state is left
    /// untouched, and the error is returned for logging.
    async fn update(&mut self) -> Result<()>;

    /// Subscribe to state change notifications.
    fn subscribe(&self) -> broadcast::Receiver<EntityEvent>;
}

/// A controllable on/off device.
#[async_trait]
pub trait Switch: Entity {
    async fn turn_on(&mut self) -> Result<()>;

    async fn turn_off(&mut self) -> Result<()>;

    /// `Some(true)` when on, `None` before the first update.
    fn is_on(&self) -> Option<bool> {
        self.state().is_on()
    }
}

/// A dimmable light.
#[async_trait]
pub trait Light: Switch {
    /// Turn on at the given brightness (0 ..= 255).
    async fn turn_on_with_brightness(&mut self, brightness: u8) -> Result<()>;

    /// Last known brightness (0 ..= 255).
    fn brightness(&self) -> u8;
}

/// A read-only sensor with an open/closed style reading.
pub trait BinarySensor: Entity {
    /// Host device class (e.g. `"door"`, `"window"`, `"moisture"`).
    fn device_class(&self) -> &str;

    /// `Some(true)` when triggered, `None` before the first update.
    fn is_on(&self) -> Option<bool> {
        self.state().is_on()
    }
}

/// An audio output with volume, mute and source selection.
#[async_trait]
pub trait MediaPlayer: Entity {
    async fn turn_on(&mut self) -> Result<()>;

    async fn turn_off(&mut self) -> Result<()>;

    /// Select an input by its configured name.
    ///
    /// Names not in the configured source list are ignored.
    async fn select_source(&mut self, source: &str) -> Result<()>;

    /// Set loudness in 0.0 (silent) ..= 1.0 (loudest).
    async fn set_volume_level(&mut self, level: f64) -> Result<()>;

    /// Request mute or unmute.
    async fn mute_volume(&mut self, mute: bool) -> Result<()>;

    async fn volume_up(&mut self) -> Result<()>;

    async fn volume_down(&mut self) -> Result<()>;

    /// Loudness in 0.0 ..= 1.0, `None` before the first update.
    fn volume_level(&self) -> Option<f64>;

    fn is_volume_muted(&self) -> Option<bool>;

    /// Name of the selected source, `None` if unknown or not configured.
    fn source(&self) -> Option<&str>;

    /// Title shown for what is playing. Defaults to the source name.
    fn media_title(&self) -> Option<&str> {
        self.source()
    }

    /// Configured source names in ascending source id order.
    fn source_list(&self) -> &[String];
}
