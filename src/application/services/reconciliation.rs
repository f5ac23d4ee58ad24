//! Difference-usage reconciliation policy
//!
//! A bulk meter's "difference usage" is the gap between its own measured
//! usage and the sum reported by the individual meters fed from it. It is
//! billed to the bulk account to recover shared and unmetered consumption
//! (leaks, theft, common taps).
//!
//! Raw differences of zero or near zero would bill the shared-loss account
//! nothing even though unmetered consumption never actually drops to zero,
//! so small and negative differences are replaced by a fixed corrective
//! floor. This is the single authoritative policy; call sites must not
//! re-derive the rule.

use rust_decimal::Decimal;

/// Corrective floor applied when the raw difference is negative or falls
/// below it (0, 1 and 2 m³ included).
pub const MIN_DIFFERENCE_USAGE_M3: Decimal = Decimal::from_parts(3, 0, 0, false, 0);

/// Derive the billable difference usage between a bulk meter and the sum of
/// its individual meters.
pub fn reconcile_difference(bulk_usage_m3: Decimal, sum_individual_m3: Decimal) -> Decimal {
    let raw = bulk_usage_m3 - sum_individual_m3;
    if raw < MIN_DIFFERENCE_USAGE_M3 {
        MIN_DIFFERENCE_USAGE_M3
    } else {
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn bulk_below_individual_sum_gets_floor() {
        // bulk 20 against individual sum 25: raw -5, corrected to 3
        assert_eq!(reconcile_difference(dec!(20), dec!(25)), dec!(3));
    }

    #[test]
    fn ordinary_positive_difference_passes_through() {
        assert_eq!(reconcile_difference(dec!(20), dec!(10)), dec!(10));
        assert_eq!(reconcile_difference(dec!(100), dec!(3)), dec!(97));
    }

    #[test]
    fn small_differences_are_floored() {
        assert_eq!(reconcile_difference(dec!(10), dec!(10)), dec!(3)); // raw 0
        assert_eq!(reconcile_difference(dec!(11), dec!(10)), dec!(3)); // raw 1
        assert_eq!(reconcile_difference(dec!(12), dec!(10)), dec!(3)); // raw 2
    }

    #[test]
    fn floor_boundary_is_exact() {
        // raw 3 is the first value that passes through unmodified
        assert_eq!(reconcile_difference(dec!(13), dec!(10)), dec!(3));
        assert_eq!(reconcile_difference(dec!(14), dec!(10)), dec!(4));
    }

    #[test]
    fn fractional_small_difference_is_floored() {
        assert_eq!(reconcile_difference(dec!(10.5), dec!(10)), dec!(3));
        assert_eq!(reconcile_difference(dec!(12.9), dec!(10)), dec!(3));
    }
}
