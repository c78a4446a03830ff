//! BenQ projector backend for homelink.
//!
//! BenQ projectors accept `\r*key=value#\r` commands on their RS-232 port.
//! Reached through a serial-to-IP bridge, a projector is exposed as a
//! [`Switch`](homelink_core::Switch) whose update also refreshes lamp hours,
//! input source and lamp mode.
//!
//! - [`protocol`] -- command framing and answer parsing
//! - [`projector`] -- the [`BenqProjector`] entity
//! - [`builder`] -- [`BenqBuilder`] with the bridge defaults

pub mod builder;
pub mod projector;
pub mod protocol;

pub use builder::BenqBuilder;
pub use projector::{BenqProjector, ProjectorAttributes};
