//! Nuvo Essentia multi-zone amplifier backend for homelink.
//!
//! The E6G is driven through a serial-to-IP bridge with short ASCII
//! commands. This crate provides:
//!
//! - **Protocol codec** ([`protocol`]) -- `*Z{zone}{body}\r` framing, hex
//!   encoding for the bridge, and the response tokenizer.
//! - **Command builders** ([`commands`]) -- status query, power, source,
//!   volume and mute commands.
//! - **Status parser** ([`status`]) -- turns a raw reply into a typed
//!   [`StatusParse`].
//! - **Volume conversion** ([`volume`]) and **source naming** ([`sources`]).
//! - **Zone entity** ([`zone`]) -- [`MediaPlayer`](homelink_core::MediaPlayer)
//!   implementation with snapshot/restore.
//! - **Builder** ([`builder`]) -- fluent construction of all zones on one
//!   shared bridge.
//!
//! # Example
//!
//! ```
//! use homelink_nuvo::commands::cmd_status_query;
//! use homelink_nuvo::ids::ZoneId;
//! use homelink_nuvo::protocol::to_hex;
//! use homelink_nuvo::status::parse_zone_status;
//!
//! let zone = ZoneId::new(3).unwrap();
//! assert_eq!(to_hex(&cmd_status_query(zone)), "2a5a335354415455533f0d");
//!
//! let parsed = parse_zone_status(zone, Some("#Z3,ON,SRC2,VOL42\r\n"));
//! let status = parsed.status().unwrap();
//! assert_eq!(status.volume, Some(42));
//! assert_eq!(status.source, Some(2));
//! ```

pub mod builder;
pub mod commands;
pub mod ids;
pub mod protocol;
pub mod sources;
pub mod status;
pub mod volume;
pub mod zone;

// Re-export the primary types for ergonomic `use homelink_nuvo::*`.
pub use builder::NuvoBuilder;
pub use ids::{SourceId, ZoneId};
pub use sources::SourceTable;
pub use status::{parse_zone_status, StatusParse, ZoneStatus};
pub use zone::NuvoZone;
