use crate::math::safe_div;
use crate::state::{GoodId, Market};
use std::collections::BTreeMap;

/// Number of recipe runs the market's stock allows, capped by `capacity`.
///
/// Inputs with a non-positive amount are ignored; a good the market does not
/// carry counts as zero stock. A recipe without inputs runs at full capacity.
pub fn max_process_runs(market: &Market, inputs: &BTreeMap<GoodId, f64>, capacity: f64) -> f64 {
    if capacity <= 0.0 {
        return 0.0;
    }
    let mut runs = capacity;
    for (good_id, &amount) in inputs {
        if amount <= 0.0 {
            continue;
        }
        let available = market.goods.get(good_id).map_or(0.0, |g| g.stock.max(0.0));
        runs = runs.min(safe_div(available, amount, 0.0));
    }
    runs.max(0.0)
}
