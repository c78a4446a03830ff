//! Validated zone and source identifiers.
//!
//! The Essentia E6G has six zones and six source inputs, both numbered
//! from 1. Construction fails for anything outside `1..=6`, so the command
//! builders never have to.

use std::fmt;

use serde::{Deserialize, Serialize};

use homelink_core::error::{Error, Result};

/// Lowest zone or source number.
pub const MIN_ID: u8 = 1;

/// Highest zone or source number.
pub const MAX_ID: u8 = 6;

fn check(kind: &str, id: u8) -> Result<u8> {
    if (MIN_ID..=MAX_ID).contains(&id) {
        Ok(id)
    } else {
        Err(Error::InvalidParameter(format!(
            "{kind} id {id} out of range {MIN_ID}..={MAX_ID}"
        )))
    }
}

/// Amplifier zone number, `1..=6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ZoneId(u8);

impl ZoneId {
    pub fn new(id: u8) -> Result<Self> {
        check("zone", id).map(Self)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// All six zones in ascending order.
    pub fn all() -> impl Iterator<Item = ZoneId> {
        (MIN_ID..=MAX_ID).map(ZoneId)
    }
}

/// Amplifier source input number, `1..=6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SourceId(u8);

impl SourceId {
    pub fn new(id: u8) -> Result<Self> {
        check("source", id).map(Self)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

macro_rules! id_conversions {
    ($ty:ident) => {
        impl TryFrom<u8> for $ty {
            type Error = Error;

            fn try_from(id: u8) -> Result<Self> {
                Self::new(id)
            }
        }

        impl From<$ty> for u8 {
            fn from(id: $ty) -> u8 {
                id.0
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_conversions!(ZoneId);
id_conversions!(SourceId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_one_through_six() {
        for id in 1..=6 {
            assert_eq!(ZoneId::new(id).unwrap().get(), id);
            assert_eq!(SourceId::new(id).unwrap().get(), id);
        }
    }

    #[test]
    fn rejects_out_of_range() {
        for id in [0, 7, 255] {
            assert!(matches!(ZoneId::new(id), Err(Error::InvalidParameter(_))));
            assert!(matches!(SourceId::try_from(id), Err(Error::InvalidParameter(_))));
        }
    }

    #[test]
    fn all_zones_in_order() {
        let ids: Vec<u8> = ZoneId::all().map(ZoneId::get).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn display_is_bare_number() {
        assert_eq!(ZoneId::new(4).unwrap().to_string(), "4");
    }
}
