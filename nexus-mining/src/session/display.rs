// Copyright 2026 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

/// Countdown in the `HH:MM:SS` form. Hours are not wrapped at 24.
pub fn format_time_left(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!(
        "{:02}:{:02}:{:02}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

pub fn format_hash_rate(hash_rate: f64) -> String {
    format!("{hash_rate:.2} KH/s")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_formatting() {
        assert_eq!(format_time_left(Duration::ZERO), "00:00:00");
        assert_eq!(format_time_left(Duration::from_millis(999)), "00:00:00");
        assert_eq!(format_time_left(Duration::from_secs(3725)), "01:02:05");
        assert_eq!(
            format_time_left(Duration::from_secs(24 * 60 * 60)),
            "24:00:00"
        );
    }

    #[test]
    fn hash_rate_has_two_decimals() {
        assert_eq!(format_hash_rate(2750.456), "2750.46 KH/s");
        assert_eq!(format_hash_rate(0.0), "0.00 KH/s");
    }
}
