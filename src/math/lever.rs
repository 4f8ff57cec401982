//! Lever rule for two-phase regions of a binary diagram.

/// Mass fractions of the two bounding phases of a tie line.
///
/// Returns `(fraction_left, fraction_right)` where
/// `fraction_right = (overall - left) / (right - left)`.
///
/// A degenerate tie line (`left == right`) yields `(0.0, 0.0)`.
pub fn lever_rule(overall: f64, left: f64, right: f64) -> (f64, f64) {
    if right == left {
        return (0.0, 0.0);
    }

    let fraction_right = (overall - left) / (right - left);
    let fraction_left = 1.0 - fraction_right;

    (fraction_left, fraction_right)
}

/// Inverse of the lever rule: the overall composition that puts
/// `fraction_right` of the mass in the right-hand phase.
pub fn overall_from_fraction(fraction_right: f64, left: f64, right: f64) -> f64 {
    left + fraction_right * (right - left)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn eutectoid_steel_fractions() {
        let (ferrite, cementite) = lever_rule(0.76, 0.02, 6.69);
        assert!((cementite - 0.74 / 6.67).abs() < 1e-12);
        assert!((ferrite - 5.93 / 6.67).abs() < 1e-12);
    }

    #[test]
    fn degenerate_tie_line_returns_zeros() {
        assert_eq!(lever_rule(0.5, 0.76, 0.76), (0.0, 0.0));
        assert_eq!(lever_rule(0.0, 0.0, 0.0), (0.0, 0.0));
    }

    #[test]
    fn endpoints_put_everything_in_one_phase() {
        assert_eq!(lever_rule(0.02, 0.02, 6.69), (1.0, 0.0));
        let (l, r) = lever_rule(6.69, 0.02, 6.69);
        assert!(l.abs() < 1e-12);
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn overall_from_fraction_inverts_lever_rule() {
        let (_, right) = lever_rule(1.2, 0.76, 6.69);
        let back = overall_from_fraction(right, 0.76, 6.69);
        assert!((back - 1.2).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn fractions_sum_to_one_and_stay_in_unit_interval(
            left in -10.0f64..10.0,
            width in 1e-3f64..10.0,
            t in 0.0f64..=1.0,
        ) {
            let right = left + width;
            let overall = left + t * width;
            let (fl, fr) = lever_rule(overall, left, right);

            prop_assert!((fl + fr - 1.0).abs() < 1e-9);
            prop_assert!((-1e-9..=1.0 + 1e-9).contains(&fl));
            prop_assert!((-1e-9..=1.0 + 1e-9).contains(&fr));
        }
    }
}
