//! Nuvo Essentia zone command builders.
//!
//! All functions are pure. They return the raw ASCII command bytes; pass
//! them through [`to_hex`](crate::protocol::to_hex) before handing them to
//! a bridge.
//!
//! | Operation      | Command              |
//! |----------------|----------------------|
//! | status query   | `*Z{z}STATUS?\r`     |
//! | power on / off | `*Z{z}ON\r`, `*Z{z}OFF\r` |
//! | select source  | `*Z{z}SRC{s}\r`      |
//! | set volume     | `*Z{z}VOL{0..80}\r`  |
//! | volume step    | `*Z{z}VOL+\r`, `*Z{z}VOL-\r` |
//! | mute toggle    | `*Z{z}MUTE\r`        |

use crate::ids::{SourceId, ZoneId};
use crate::protocol::encode_command;
use crate::volume::MAX_DEVICE_LEVEL;

/// Direction of a single volume step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Build a zone status query (`*Z{z}STATUS?\r`).
pub fn cmd_status_query(zone: ZoneId) -> Vec<u8> {
    encode_command(zone, "STATUS?")
}

/// Build a zone power-on command (`*Z{z}ON\r`).
pub fn cmd_power_on(zone: ZoneId) -> Vec<u8> {
    encode_command(zone, "ON")
}

/// Build a zone power-off command (`*Z{z}OFF\r`).
pub fn cmd_power_off(zone: ZoneId) -> Vec<u8> {
    encode_command(zone, "OFF")
}

/// Build a source selection command (`*Z{z}SRC{s}\r`).
pub fn cmd_select_source(zone: ZoneId, source: SourceId) -> Vec<u8> {
    encode_command(zone, &format!("SRC{source}"))
}

/// Build an absolute volume command (`*Z{z}VOL{level}\r`).
///
/// `level` is device attenuation, 0 loudest; values above 80 are sent as 80.
/// Use [`volume::to_device`](crate::volume::to_device) to convert from a
/// normalized level.
pub fn cmd_set_volume(zone: ZoneId, level: u8) -> Vec<u8> {
    encode_command(zone, &format!("VOL{}", level.min(MAX_DEVICE_LEVEL)))
}

/// Build a one-step volume change (`*Z{z}VOL+\r` or `*Z{z}VOL-\r`).
pub fn cmd_volume_step(zone: ZoneId, direction: Direction) -> Vec<u8> {
    match direction {
        Direction::Up => encode_command(zone, "VOL+"),
        Direction::Down => encode_command(zone, "VOL-"),
    }
}

/// Build the mute command (`*Z{z}MUTE\r`).
///
/// The amplifier only knows a toggle; there is no separate mute/unmute.
pub fn cmd_mute(zone: ZoneId) -> Vec<u8> {
    encode_command(zone, "MUTE")
}
