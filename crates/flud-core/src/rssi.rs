//! RSSI-to-signal-quality conversion used when recording a peer's volatile
//! state from an inbound HELLO (spec §4.8).

/// Convert a raw RSSI reading (dBm, typically -100 to -30) to a 0-100
/// signal-quality percentage.
///
/// Linear between -90 dBm (0%) and -40 dBm (100%), clamped outside that
/// range. Grounded in the original firmware's `flood_rssi_to_percentage`,
/// which the distilled spec omits but whose exact thresholds this crate
/// preserves.
#[must_use]
pub fn rssi_to_percent(rssi: i8) -> u8 {
    if rssi >= -40 {
        return 100;
    }
    if rssi <= -90 {
        return 0;
    }
    let shifted = i16::from(rssi) + 90;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        (shifted * 100 / 50) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_at_extremes() {
        assert_eq!(rssi_to_percent(-30), 100);
        assert_eq!(rssi_to_percent(-40), 100);
        assert_eq!(rssi_to_percent(-90), 0);
        assert_eq!(rssi_to_percent(-100), 0);
    }

    #[test]
    fn interpolates_linearly() {
        assert_eq!(rssi_to_percent(-65), 50);
    }
}
