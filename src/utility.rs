/// Mean of `count` values summing to `total`, in hundredths, rounded half to even.
///
/// Computed with exact integer arithmetic so ties such as `0.125` are
/// detected exactly instead of depending on the binary float value.
/// Returns `None` only for `count == 0`.
pub fn mean_hundredths(total: i64, count: usize) -> Option<i128> {
    if count == 0 {
        return None;
    }
    let numerator = i128::from(total) * 100;
    let denominator = i128::try_from(count).ok()?;

    let quotient = numerator.div_euclid(denominator);
    let twice_remainder = numerator.rem_euclid(denominator) * 2;

    let rounded = if twice_remainder > denominator
        || (twice_remainder == denominator && quotient % 2 != 0)
    {
        quotient + 1
    } else {
        quotient
    };
    Some(rounded)
}

/// Converts hundredths back to a two-decimal value.
pub fn from_hundredths(hundredths: i128) -> f64 {
    hundredths as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_exact() {
        assert_eq!(mean_hundredths(200, 2), Some(10_000));
        assert_eq!(mean_hundredths(10, 3), Some(333));
        assert_eq!(mean_hundredths(20, 3), Some(667));
    }

    #[test]
    fn test_mean_ties_round_to_even() {
        // 0.125 -> 0.12, 0.135 -> 0.14
        assert_eq!(mean_hundredths(1, 8), Some(12));
        assert_eq!(mean_hundredths(27, 200), Some(14));
        // 1.005 -> 1.00, 1.015 -> 1.02
        assert_eq!(mean_hundredths(201, 200), Some(100));
        assert_eq!(mean_hundredths(203, 200), Some(102));
    }

    #[test]
    fn test_mean_negative_totals() {
        // -0.125 -> -0.12
        assert_eq!(mean_hundredths(-1, 8), Some(-12));
        assert_eq!(mean_hundredths(-7, 2), Some(-350));
    }

    #[test]
    fn test_mean_above_i64_hundredths() {
        let hundredths = mean_hundredths(100_000_000_000_000_000, 1).unwrap();
        assert_eq!(hundredths, 10_000_000_000_000_000_000);
        assert_eq!(from_hundredths(hundredths), 1e17);
        assert_eq!(
            mean_hundredths(i64::MAX, 1),
            Some(i128::from(i64::MAX) * 100)
        );
    }

    #[test]
    fn test_mean_of_nothing() {
        assert_eq!(mean_hundredths(0, 0), None);
    }

    #[test]
    fn test_from_hundredths() {
        assert_eq!(from_hundredths(12_500), 125.0);
        assert_eq!(format!("{:.2}", from_hundredths(667)), "6.67");
    }
}
