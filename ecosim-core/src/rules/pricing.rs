use crate::math::{clamp, safe_div};

/// Bounds on the production response to price.
pub const SUPPLY_FACTOR_MIN: f64 = 0.5;
pub const SUPPLY_FACTOR_MAX: f64 = 1.5;

/// Proportional price controller.
///
/// `delta = current * k * (demand / max(1, supply) - 1)`, with the result
/// clamped into `[min_price, max_price]`.
pub fn adjusted_price(
    current: f64,
    k: f64,
    demand: f64,
    supply: f64,
    min_price: f64,
    max_price: f64,
) -> f64 {
    let ratio = safe_div(demand, supply.max(1.0), 1.0);
    let delta = current * k * (ratio - 1.0);
    clamp(current + delta, min_price, max_price)
}

/// Output multiplier for raw production: `price / base_price` in [0.5, 1.5].
///
/// A non-positive base price yields 1.0.
pub fn supply_factor(price: f64, base_price: f64) -> f64 {
    if base_price <= 0.0 {
        return 1.0;
    }
    clamp(
        safe_div(price, base_price, 1.0),
        SUPPLY_FACTOR_MIN,
        SUPPLY_FACTOR_MAX,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_excess_demand_raises_price() {
        // ratio 2.0 -> delta = 10 * 0.1 * 1.0
        let p = adjusted_price(10.0, 0.1, 20.0, 10.0, 5.0, 30.0);
        assert!((p - 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_excess_supply_lowers_price() {
        // ratio 0.5 -> delta = 10 * 0.1 * -0.5
        let p = adjusted_price(10.0, 0.1, 5.0, 10.0, 5.0, 30.0);
        assert!((p - 9.5).abs() < 1e-12);
    }

    #[test]
    fn test_supply_floor_of_one() {
        // supply 0 is treated as 1: ratio = 3
        let p = adjusted_price(10.0, 0.1, 3.0, 0.0, 5.0, 30.0);
        assert!((p - 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_price_hits_band() {
        assert_eq!(adjusted_price(10.0, 5.0, 1000.0, 1.0, 5.0, 30.0), 30.0);
        assert_eq!(adjusted_price(10.0, 5.0, 0.0, 1000.0, 5.0, 30.0), 5.0);
    }

    #[test]
    fn test_supply_factor() {
        assert_eq!(supply_factor(3.0, 3.0), 1.0);
        assert_eq!(supply_factor(9.0, 3.0), 1.5);
        assert_eq!(supply_factor(0.3, 3.0), 0.5);
        assert!((supply_factor(3.6, 3.0) - 1.2).abs() < 1e-12);
        assert_eq!(supply_factor(5.0, 0.0), 1.0);
    }

    proptest! {
        #[test]
        fn prop_price_within_band(
            current in 0.5f64..30.0,
            k in 0.0f64..1.0,
            demand in 0.0f64..1e4,
            supply in 0.0f64..1e4,
        ) {
            let p = adjusted_price(current, k, demand, supply, 0.5, 30.0);
            prop_assert!((0.5..=30.0).contains(&p));
        }

        #[test]
        fn prop_supply_factor_bounded(price in 0.0f64..100.0, base in 0.01f64..100.0) {
            let f = supply_factor(price, base);
            prop_assert!((SUPPLY_FACTOR_MIN..=SUPPLY_FACTOR_MAX).contains(&f));
        }
    }
}
