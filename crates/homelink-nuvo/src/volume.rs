//! Volume conversion between the amplifier and the host.
//!
//! The amplifier counts attenuation: 0 is loudest and 80 is quietest. Hosts
//! expect loudness in 0.0 (silent) ..= 1.0 (loudest).

use homelink_core::error::{Error, Result};

/// Quietest device volume step.
pub const MAX_DEVICE_LEVEL: u8 = 80;

/// Device attenuation to normalized loudness.
///
/// Levels above [`MAX_DEVICE_LEVEL`] are treated as the maximum.
pub fn to_normalized(level: u8) -> f64 {
    let level = level.min(MAX_DEVICE_LEVEL);
    1.0 - f64::from(level) / f64::from(MAX_DEVICE_LEVEL)
}

/// Normalized loudness to device attenuation, rounded to the nearest step
/// and clamped to `0..=80`.
///
/// Non-finite input is rejected.
pub fn to_device(level: f64) -> Result<u8> {
    if !level.is_finite() {
        return Err(Error::InvalidParameter(format!(
            "volume level must be finite, got {level}"
        )));
    }
    let steps = ((1.0 - level) * f64::from(MAX_DEVICE_LEVEL)).round();
    Ok(steps.clamp(0.0, f64::from(MAX_DEVICE_LEVEL)) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints() {
        assert_eq!(to_normalized(0), 1.0);
        assert_eq!(to_normalized(80), 0.0);
        assert_eq!(to_device(1.0).unwrap(), 0);
        assert_eq!(to_device(0.0).unwrap(), 80);
    }

    #[test]
    fn midpoint() {
        assert_eq!(to_normalized(40), 0.5);
        assert_eq!(to_device(0.5).unwrap(), 40);
    }

    #[test]
    fn rounds_to_nearest_step() {
        // (1 - 0.47) * 80 = 42.4
        assert_eq!(to_device(0.47).unwrap(), 42);
        // (1 - 0.49) * 80 = 40.8
        assert_eq!(to_device(0.49).unwrap(), 41);
    }

    #[test]
    fn out_of_range_is_clamped() {
        assert_eq!(to_device(1.5).unwrap(), 0);
        assert_eq!(to_device(-0.25).unwrap(), 80);
        assert_eq!(to_normalized(200), 0.0);
    }

    #[test]
    fn non_finite_rejected() {
        for level in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(to_device(level), Err(Error::InvalidParameter(_))));
        }
    }

    #[test]
    fn round_trip_within_one_step() {
        for v in 0..=MAX_DEVICE_LEVEL {
            let back = to_device(to_normalized(v)).unwrap();
            assert!(
                (i16::from(back) - i16::from(v)).abs() <= 1,
                "{v} came back as {back}"
            );
        }
    }
}
