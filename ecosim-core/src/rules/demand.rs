use crate::math::{clamp, safe_div};

/// Scales raw need by `base_price / price`, clamped to [0.5, 1.5].
///
/// Non-positive need yields 0; a non-positive price or base price passes the
/// need through unchanged.
pub fn adjusted_need(need: f64, price: f64, base_price: f64) -> f64 {
    if need <= 0.0 {
        return 0.0;
    }
    if price <= 0.0 || base_price <= 0.0 {
        return need;
    }
    let factor = clamp(safe_div(base_price, price, 1.0), 0.5, 1.5);
    need * factor
}
