//! Grid snapping.

/// Snaps `value` to the nearest multiple of `grid_size`.
///
/// Non-finite values snap to 0. Ties round toward positive infinity, so
/// `-100` snaps to `-96` on an 8 grid.
pub fn grid_snap(value: f64, grid_size: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value / grid_size + 0.5).floor() * grid_size
}

/// Snaps `value` up to the next multiple of `grid_size`.
///
/// Used for pushed placements, which must never land below their minimum.
pub fn grid_snap_up(value: f64, grid_size: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let snapped = (value / grid_size).ceil() * grid_size;
    if snapped < value {
        snapped + grid_size
    } else {
        snapped
    }
}

/// Returns `true` for grid sizes calibration can use.
pub fn is_usable_grid(grid_size: f64) -> bool {
    grid_size.is_finite() && grid_size > 0.0
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    fn value_strategy() -> impl Strategy<Value = f64> {
        prop_oneof![-1.0e6f64..1.0e6, (-100_000i32..100_000).prop_map(f64::from)]
    }

    fn grid_strategy() -> impl Strategy<Value = f64> {
        prop_oneof![
            (1u32..64).prop_map(f64::from),
            0.25f64..50.0,
        ]
    }

    // ===================
    // Property Test Functions
    // ===================

    /// Snapping an already snapped value changes nothing.
    fn check_snap_idempotent(value: f64, grid: f64) -> Result<(), TestCaseError> {
        let once = grid_snap(value, grid);
        prop_assert_eq!(grid_snap(once, grid), once);
        Ok(())
    }

    /// Snapping up never lands below the input and is stable.
    fn check_snap_up_bounds(value: f64, grid: f64) -> Result<(), TestCaseError> {
        let once = grid_snap_up(value, grid);
        prop_assert!(once >= value, "{once} < {value}");
        prop_assert_eq!(grid_snap(once, grid), once);
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn snap_idempotent(value in value_strategy(), grid in grid_strategy()) {
            check_snap_idempotent(value, grid)?;
        }

        #[test]
        fn snap_up_bounds(value in value_strategy(), grid in (1u32..64).prop_map(f64::from)) {
            check_snap_up_bounds(value, grid)?;
        }
    }
}
