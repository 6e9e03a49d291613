//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Clamp a value between a minimum and maximum.
///
/// Note: if `min > max` the result is whichever bound is evaluated last, the
/// max check runs first so the min bound wins.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float,
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clamp_in_range() {
        assert_eq!(clamp(&0.5f64, &0.0, &1.0), 0.5);
        assert_eq!(clamp(&0.0f64, &0.0, &1.0), 0.0);
        assert_eq!(clamp(&1.0f64, &0.0, &1.0), 1.0);
    }

    #[test]
    fn test_clamp_nearest_bound() {
        assert_eq!(clamp(&-2.0f64, &0.0, &1.0), 0.0);
        assert_eq!(clamp(&1.5f64, &0.0, &1.0), 1.0);
    }

    #[test]
    fn test_clamp_inverted_bounds_min_wins() {
        // Known edge case: min > max resolves to the min bound since that
        // check is evaluated last.
        assert_eq!(clamp(&0.5f64, &2.0, &1.0), 2.0);
    }
}
