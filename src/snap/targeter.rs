//! Target depth from a located contact.
//!
//! The offset is "metres above the contact": it is always subtracted, for
//! SWAT and SGAS definitions alike, so a positive offset gives a shallower
//! (numerically smaller) TVD.

/// Raw target TVD for one point. Not clamped; negative depths pass through.
pub fn target_tvd(contact_depth: f64, offset: f64) -> f64 {
    contact_depth - offset
}

/// Whether moving from `original` to `target` stays within `max_adjustment`.
///
/// `None` disables the guard.
pub fn within_adjustment(original: f64, target: f64, max_adjustment: Option<f64>) -> bool {
    max_adjustment.map_or(true, |max| (target - original).abs() <= max)
}

/// Nudge a depth at least 0.1 m away from even integers.
///
/// Simulators that place cell floors on even metres misbehave for wellpoints
/// sitting right on a floor.
pub fn round_away_from_even(depth: f64) -> f64 {
    const EPSILON: f64 = 0.1;
    let r = depth.rem_euclid(2.0);
    if r < EPSILON {
        depth.round() + EPSILON
    } else if r > 2.0 - EPSILON {
        depth.round() - EPSILON
    } else {
        depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_is_subtracted() {
        assert!((target_tvd(2015.0, 0.5) - 2014.5).abs() < 1e-12);
        assert!((target_tvd(2015.0, -1.5) - 2016.5).abs() < 1e-12);
        // No clamping at this layer
        assert!((target_tvd(0.2, 0.5) + 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_adjustment_guard() {
        assert!(within_adjustment(1500.0, 1599.0, Some(100.0)));
        assert!(!within_adjustment(1500.0, 1600.5, Some(100.0)));
        assert!(within_adjustment(1500.0, 9000.0, None));
    }

    #[test]
    fn test_round_away_from_even() {
        assert!((round_away_from_even(2000.05) - 2000.1).abs() < 1e-9);
        assert!((round_away_from_even(1999.95) - 1999.9).abs() < 1e-9);
        assert!((round_away_from_even(2001.0) - 2001.0).abs() < 1e-9);
        assert!((round_away_from_even(1761.3) - 1761.3).abs() < 1e-9);
    }
}
