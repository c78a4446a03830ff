//! homelink-core: Core traits, types, and error definitions for homelink.
//!
//! This crate defines the device-agnostic abstractions that every homelink
//! adapter implements. A host depends on these types without pulling in any
//! specific device driver.
//!
//! # Key types
//!
//! - [`Entity`], [`MediaPlayer`], [`Switch`], [`Light`], [`BinarySensor`]
//!   -- the host-facing entity surfaces
//! - [`Transport`] -- byte-level communication channel
//! - [`Bridge`] -- hex-framed command/response channel to a serial-to-IP adapter
//! - [`EntityEvent`] -- asynchronous state change notifications
//! - [`Error`] / [`Result`] -- error handling

pub mod entity;
pub mod error;
pub mod events;
pub mod transport;
pub mod types;

// Re-export key types at crate root for ergonomic `use homelink_core::*`.
pub use entity::{BinarySensor, Entity, Light, MediaPlayer, Switch, EVENT_CHANNEL_CAPACITY};
pub use error::{Error, Result};
pub use events::EntityEvent;
pub use transport::{share_bridge, Bridge, SharedBridge, Transport};
pub use types::*;
