//! Core types used throughout homelink.
//!
//! These types give every adapter the same host-facing vocabulary,
//! whatever wire protocol sits underneath (hex-framed serial, JSON REST).

use std::fmt;
use std::str::FromStr;

/// The on/off state an entity reports to the host.
///
/// `Unknown` is the state before the first successful update. It is never
/// produced by a failed poll: a failed poll marks the entity unavailable
/// and leaves the last known state in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EntityState {
    On,
    Off,
    #[default]
    Unknown,
}

impl EntityState {
    /// Map a boolean power flag to `On`/`Off`.
    pub fn from_power(on: bool) -> Self {
        if on {
            EntityState::On
        } else {
            EntityState::Off
        }
    }

    /// `Some(true)` for `On`, `Some(false)` for `Off`, `None` for `Unknown`.
    pub fn is_on(&self) -> Option<bool> {
        match self {
            EntityState::On => Some(true),
            EntityState::Off => Some(false),
            EntityState::Unknown => None,
        }
    }
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityState::On => "on",
            EntityState::Off => "off",
            EntityState::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// Error returned when a string cannot be parsed into an [`EntityState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStateError(String);

impl fmt::Display for ParseStateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown entity state: {}", self.0)
    }
}

impl std::error::Error for ParseStateError {}

impl FromStr for EntityState {
    type Err = ParseStateError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "on" => Ok(EntityState::On),
            "off" => Ok(EntityState::Off),
            "unknown" => Ok(EntityState::Unknown),
            _ => Err(ParseStateError(s.to_string())),
        }
    }
}

/// The kind of host entity an adapter exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Amplifier zone (volume, source, mute).
    MediaPlayer,
    /// Plain on/off device.
    Switch,
    /// Dimmable light.
    Light,
    /// Read-only open/closed style sensor.
    BinarySensor,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::MediaPlayer => "media_player",
            EntityKind::Switch => "switch",
            EntityKind::Light => "light",
            EntityKind::BinarySensor => "binary_sensor",
        };
        write!(f, "{s}")
    }
}

/// Static description of an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityInfo {
    /// Display name from configuration.
    pub name: String,
    /// Which host surface the entity implements.
    pub kind: EntityKind,
    /// Adapter that owns the entity (e.g. `"nuvo"`, `"benq"`, `"hai"`).
    pub platform: &'static str,
}

impl EntityInfo {
    pub fn new(name: impl Into<String>, kind: EntityKind, platform: &'static str) -> Self {
        EntityInfo {
            name: name.into(),
            kind,
            platform,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_state_defaults_to_unknown() {
        assert_eq!(EntityState::default(), EntityState::Unknown);
        assert_eq!(EntityState::default().is_on(), None);
    }

    #[test]
    fn entity_state_from_power() {
        assert_eq!(EntityState::from_power(true), EntityState::On);
        assert_eq!(EntityState::from_power(false), EntityState::Off);
    }

    #[test]
    fn entity_state_display_and_parse() {
        for state in [EntityState::On, EntityState::Off, EntityState::Unknown] {
            let parsed: EntityState = state.to_string().parse().unwrap();
            assert_eq!(parsed, state);
        }
        assert_eq!("ON".parse::<EntityState>().unwrap(), EntityState::On);
        assert!("standby".parse::<EntityState>().is_err());
    }

    #[test]
    fn entity_kind_display() {
        assert_eq!(EntityKind::MediaPlayer.to_string(), "media_player");
        assert_eq!(EntityKind::BinarySensor.to_string(), "binary_sensor");
    }

    #[test]
    fn entity_info_new() {
        let info = EntityInfo::new("Kitchen", EntityKind::MediaPlayer, "nuvo");
        assert_eq!(info.name, "Kitchen");
        assert_eq!(info.kind, EntityKind::MediaPlayer);
        assert_eq!(info.platform, "nuvo");
    }
}
