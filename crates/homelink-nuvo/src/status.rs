//! Zone status parsing.
//!
//! A status reply carries the zone's power state and, when on, its source
//! and volume. A zone muted at the amplifier reports no volume at all.
//!
//! ```text
//! #Z3,ON,SRC2,VOL42,DND0,LOCK0     on, source 2, volume 42
//! #Z3,ON,SRC2,MUTE,DND0,LOCK0      on, source 2, muted
//! #Z3,OFF                          off
//! ```
//!
//! Matching is done on [`tokenize`]d text and accepts the power marker, the
//! `VOL` field and the `SRC` field anywhere in the reply.

use serde::{Deserialize, Serialize};

use homelink_core::error::{Error, Result};

use crate::ids::ZoneId;
use crate::protocol::{tokenize, Token};
use crate::volume::MAX_DEVICE_LEVEL;

/// One poll's view of a zone.
///
/// `volume`, `source` and `mute` are only present when `power` is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneStatus {
    pub power: bool,
    /// Device attenuation, 0 loudest ..= 80 quietest.
    pub volume: Option<u8>,
    /// Raw source number as reported.
    pub source: Option<u32>,
    pub mute: Option<bool>,
}

impl ZoneStatus {
    pub fn off() -> Self {
        Self {
            power: false,
            volume: None,
            source: None,
            mute: None,
        }
    }
}

/// Outcome of parsing one status reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusParse {
    /// A recognised status for the zone.
    Status(ZoneStatus),
    /// The zone reported on but the reply had no `SRC` field.
    MissingSource,
    /// Non-empty reply without a power marker for this zone.
    Unrecognized,
    /// No reply at all.
    Empty,
}

impl StatusParse {
    /// The status, if one was recognised.
    pub fn status(&self) -> Option<&ZoneStatus> {
        match self {
            StatusParse::Status(status) => Some(status),
            _ => None,
        }
    }

    /// Collapse to "status or nothing".
    pub fn into_option(self) -> Option<ZoneStatus> {
        match self {
            StatusParse::Status(status) => Some(status),
            _ => None,
        }
    }

    /// Collapse for callers that must treat a malformed "on" reply as an
    /// error rather than as "no status".
    pub fn into_status(self) -> Result<Option<ZoneStatus>> {
        match self {
            StatusParse::Status(status) => Ok(Some(status)),
            StatusParse::MissingSource => Err(Error::Protocol(
                "zone reported on without a source".into(),
            )),
            StatusParse::Unrecognized | StatusParse::Empty => Ok(None),
        }
    }
}

/// Parse a status reply for `zone`.
///
/// `None` and the empty string both mean the bridge returned nothing, which
/// is never the same as "off".
pub fn parse_zone_status(zone: ZoneId, response: Option<&str>) -> StatusParse {
    let text = match response {
        Some(text) if !text.is_empty() => text,
        _ => return StatusParse::Empty,
    };

    let tokens = tokenize(text);
    let zone_digits = zone.to_string();

    if has_power_marker(&tokens, &zone_digits, "ON") {
        let Some(source) = field_value(&tokens, "SRC") else {
            return StatusParse::MissingSource;
        };
        let status = match field_value(&tokens, "VOL") {
            Some(volume) => ZoneStatus {
                power: true,
                volume: Some(volume.min(u32::from(MAX_DEVICE_LEVEL)) as u8),
                source: Some(source),
                mute: Some(false),
            },
            None => ZoneStatus {
                power: true,
                volume: Some(0),
                source: Some(source),
                mute: Some(true),
            },
        };
        StatusParse::Status(status)
    } else if has_power_marker(&tokens, &zone_digits, "OFF") {
        StatusParse::Status(ZoneStatus::off())
    } else {
        StatusParse::Unrecognized
    }
}

/// Parse a status reply, keeping only a recognised status.
pub fn parse_status(zone: ZoneId, response: Option<&str>) -> Option<ZoneStatus> {
    parse_zone_status(zone, response).into_option()
}

/// Looks for `Z{zone},{state}`: a word ending in `Z`, the zone number, a
/// comma, and a word starting with `state`.
fn has_power_marker(tokens: &[Token<'_>], zone_digits: &str, state: &str) -> bool {
    tokens.windows(4).any(|w| {
        matches!(
            w,
            [Token::Word(z), Token::Number(n), Token::Punct(','), Token::Word(s)]
                if z.ends_with('Z') && *n == zone_digits && s.starts_with(state)
        )
    })
}

/// Value of the first `{name}{digits}` field. Numbers too large for `u32`
/// saturate.
fn field_value(tokens: &[Token<'_>], name: &str) -> Option<u32> {
    tokens.windows(2).find_map(|w| match w {
        [Token::Word(word), Token::Number(digits)] if word.ends_with(name) => {
            Some(digits.parse::<u32>().unwrap_or(u32::MAX))
        }
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(id: u8) -> ZoneId {
        ZoneId::new(id).unwrap()
    }

    fn on(volume: u8, source: u32, mute: bool) -> StatusParse {
        StatusParse::Status(ZoneStatus {
            power: true,
            volume: Some(volume),
            source: Some(source),
            mute: Some(mute),
        })
    }

    #[test]
    fn absent_or_empty_is_empty() {
        assert_eq!(parse_zone_status(zone(1), None), StatusParse::Empty);
        assert_eq!(parse_zone_status(zone(1), Some("")), StatusParse::Empty);
        assert_eq!(parse_status(zone(1), None), None);
    }

    #[test]
    fn on_with_volume_and_source() {
        assert_eq!(
            parse_zone_status(zone(3), Some("...Z3,ON...VOL42...SRC2...")),
            on(42, 2, false)
        );
        assert_eq!(
            parse_zone_status(zone(3), Some("#Z3,ON,SRC2,VOL42,DND0,LOCK0\r\n")),
            on(42, 2, false)
        );
    }

    #[test]
    fn on_without_volume_is_muted() {
        assert_eq!(
            parse_zone_status(zone(3), Some("...Z3,ON...SRC2...")),
            on(0, 2, true)
        );
        assert_eq!(
            parse_zone_status(zone(3), Some("#Z3,ON,SRC2,MUTE,DND0,LOCK0\r\n")),
            on(0, 2, true)
        );
    }

    #[test]
    fn on_without_source_is_distinct_failure() {
        let parsed = parse_zone_status(zone(3), Some("#Z3,ON,VOL42\r\n"));
        assert_eq!(parsed, StatusParse::MissingSource);
        assert!(matches!(parsed.into_status(), Err(Error::Protocol(_))));
    }

    #[test]
    fn off_has_no_detail() {
        let parsed = parse_zone_status(zone(3), Some("...Z3,OFF..."));
        assert_eq!(parsed, StatusParse::Status(ZoneStatus::off()));
        let status = parsed.into_option().unwrap();
        assert!(!status.power);
        assert_eq!(status.volume, None);
        assert_eq!(status.source, None);
        assert_eq!(status.mute, None);
    }

    #[test]
    fn garbage_is_unrecognized() {
        assert_eq!(
            parse_zone_status(zone(1), Some("garbage")),
            StatusParse::Unrecognized
        );
        assert_eq!(parse_status(zone(1), Some("garbage")), None);
        assert_eq!(
            parse_zone_status(zone(1), Some("garbage")).into_status().unwrap(),
            None
        );
    }

    #[test]
    fn other_zone_reply_is_unrecognized() {
        assert_eq!(
            parse_zone_status(zone(1), Some("#Z2,ON,SRC1,VOL10\r\n")),
            StatusParse::Unrecognized
        );
        // Z13 must not be read as zone 3.
        assert_eq!(
            parse_zone_status(zone(3), Some("#Z13,ON,SRC1,VOL10")),
            StatusParse::Unrecognized
        );
    }

    #[test]
    fn on_marker_wins_over_off() {
        assert_eq!(
            parse_zone_status(zone(2), Some("#Z2,OFF\r\n#Z2,ON,SRC5,VOL7\r\n")),
            on(7, 5, false)
        );
    }

    #[test]
    fn first_field_occurrence_is_used() {
        assert_eq!(
            parse_zone_status(zone(1), Some("#Z1,ON,SRC3,VOL20 SRC4 VOL30")),
            on(20, 3, false)
        );
    }

    #[test]
    fn step_forms_are_not_volume_values() {
        // "VOL+" carries no digits, so the zone looks muted.
        assert_eq!(
            parse_zone_status(zone(1), Some("#Z1,ON,SRC1,VOL+")),
            on(0, 1, true)
        );
    }

    #[test]
    fn volume_above_range_is_clamped() {
        assert_eq!(
            parse_zone_status(zone(1), Some("#Z1,ON,SRC1,VOL95")),
            on(80, 1, false)
        );
        assert_eq!(
            parse_zone_status(zone(1), Some("#Z1,ON,SRC1,VOL99999999999")),
            on(80, 1, false)
        );
    }

    #[test]
    fn unconfigured_source_number_is_kept_raw() {
        assert_eq!(
            parse_zone_status(zone(6), Some("#Z6,ON,SRC9,VOL1")),
            on(1, 9, false)
        );
    }
}
